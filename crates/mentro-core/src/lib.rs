//! Mentro Core Library
//!
//! This crate provides the domain models, error types, configuration and validation
//! shared by the post composer, the API client and the CLI.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{ClientConfig, UploadLimits};
pub use error::{ComposeError, ErrorMetadata, LogLevel};
