//! Transport abstraction
//!
//! The controller never talks HTTP directly. It hands an encoded payload to a
//! [`PostTransport`] and reads the response body chunk by chunk through a
//! [`BodyReader`]. `mentro-api-client` provides the reqwest implementation; tests
//! provide scripted ones.

use async_trait::async_trait;
use bytes::Bytes;
use mentro_core::ComposeError;
use thiserror::Error;

use crate::encoder::SubmissionPayload;

/// Transport operation errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to send request: {0}")]
    Send(String),

    #[error("Failed to read response body: {0}")]
    Read(String),
}

impl From<TransportError> for ComposeError {
    fn from(err: TransportError) -> Self {
        ComposeError::Transport(err.to_string())
    }
}

/// Incremental reader over a response body.
#[async_trait]
pub trait BodyReader: Send {
    /// Next chunk of the body, or `None` once the stream has ended.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError>;

    /// Release the underlying stream. The controller calls this exactly once per
    /// response, on every exit path.
    fn release(&mut self);
}

/// Status and body of the initiating response.
pub struct TransportResponse {
    pub status: u16,
    /// `None` when the response carries no readable body.
    pub body: Option<Box<dyn BodyReader>>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Sends an encoded post to the backend.
#[async_trait]
pub trait PostTransport: Send + Sync {
    async fn send(&self, payload: SubmissionPayload) -> Result<TransportResponse, TransportError>;
}

/// Owns a body reader and releases it when dropped.
pub(crate) struct ReaderGuard {
    reader: Box<dyn BodyReader>,
}

impl ReaderGuard {
    pub(crate) fn new(reader: Box<dyn BodyReader>) -> Self {
        Self { reader }
    }

    pub(crate) async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        self.reader.next_chunk().await
    }
}

impl Drop for ReaderGuard {
    fn drop(&mut self) {
        self.reader.release();
        tracing::trace!("Response body reader released");
    }
}
