//! Post composer pipeline.
//!
//! Leaves first:
//! - [`staging::MediaStagingStore`] holds selected attachments and their previews.
//! - [`hashtags::HashtagComposer`] turns keystrokes into a de-duplicated tag list.
//! - [`encoder::SubmissionEncoder`] snapshots content, tags and files into one multipart payload.
//! - [`decoder::ProgressEventDecoder`] splits the streamed response into progress and completion events.
//! - [`controller::SubmissionController`] runs one submission end to end over a [`transport::PostTransport`].

pub mod controller;
pub mod decoder;
pub mod encoder;
pub mod hashtags;
pub mod progress;
pub mod staging;
pub mod transport;

pub use controller::{CancelHandle, SubmissionController};
pub use decoder::{DecoderState, ProgressEvent, ProgressEventDecoder, StreamEnd};
pub use encoder::{FormPart, SubmissionEncoder, SubmissionPayload};
pub use hashtags::{HashtagComposer, Key};
pub use progress::ProgressTracker;
pub use staging::{LocalPreviews, MediaStagingStore, PreviewError, PreviewProvider};
pub use transport::{BodyReader, PostTransport, TransportError, TransportResponse};
