//! Data models for the post composer
//!
//! `attachment` and `progress` hold the client-side compose state; `post` mirrors the
//! records returned by the backend once a post is created.

mod attachment;
mod post;
mod progress;

// Re-export all models for convenient imports
pub use attachment::*;
pub use post::*;
pub use progress::*;
