//! Error types module
//!
//! All failures of one post submission attempt are unified under [`ComposeError`].
//! Each variant self-describes how it is presented to the user through the
//! [`ErrorMetadata`] trait: the short message shown next to the compose form,
//! a machine-readable code for logs, and the level it is logged at.
//!
//! Malformed lines in the progress stream are not errors: they are logged and skipped
//! by the decoder and never reach this type.

use std::io;

/// Generic message shown when the server rejects a post without saying why.
pub const GENERIC_REQUEST_ERROR: &str = "Failed to create post";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for failures the user can fix by retrying
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error presentation - defines how an error is shown and logged
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "REQUEST_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether resubmitting the same post may succeed
    fn is_recoverable(&self) -> bool;

    /// Short human-readable message for the user. Never contains raw payloads.
    fn user_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Nothing to post: content is blank and no attachment is staged")]
    Validation,

    #[error("Request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    #[error("No response body")]
    NoResponseBody,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream ended without completion")]
    UnexpectedStreamEnd,

    #[error("Upload cancelled")]
    Cancelled,

    #[error("File too large: {name} is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<io::Error> for ComposeError {
    fn from(err: io::Error) -> Self {
        ComposeError::InvalidInput(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for ComposeError {
    fn from(err: serde_json::Error) -> Self {
        ComposeError::InvalidInput(format!("JSON encoding error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn compose_error_static_metadata(err: &ComposeError) -> (&'static str, bool, LogLevel) {
    match err {
        ComposeError::Validation => ("VALIDATION_ERROR", false, LogLevel::Debug),
        ComposeError::Request { .. } => ("REQUEST_FAILED", true, LogLevel::Warn),
        ComposeError::NoResponseBody => ("STREAM_UNAVAILABLE", true, LogLevel::Error),
        ComposeError::Transport(_) => ("TRANSPORT_ERROR", true, LogLevel::Warn),
        ComposeError::UnexpectedStreamEnd => ("UNEXPECTED_STREAM_END", true, LogLevel::Error),
        ComposeError::Cancelled => ("CANCELLED", true, LogLevel::Debug),
        ComposeError::FileTooLarge { .. } => ("FILE_TOO_LARGE", false, LogLevel::Debug),
        ComposeError::InvalidInput(_) => ("INVALID_INPUT", false, LogLevel::Debug),
    }
}

impl ErrorMetadata for ComposeError {
    fn error_code(&self) -> &'static str {
        compose_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        compose_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        compose_error_static_metadata(self).2
    }

    fn user_message(&self) -> String {
        match self {
            ComposeError::Validation => "Write something or attach a file first".to_string(),
            ComposeError::Request { ref message, .. } => message.clone(),
            ComposeError::NoResponseBody => "No response body".to_string(),
            ComposeError::Transport(_) => "Connection lost while uploading".to_string(),
            ComposeError::UnexpectedStreamEnd => {
                "Upload ended before the post was created".to_string()
            }
            ComposeError::Cancelled => "Upload cancelled".to_string(),
            ComposeError::FileTooLarge { name, limit, .. } => {
                format!("{} exceeds the {} limit", name, format_size(*limit))
            }
            ComposeError::InvalidInput(ref msg) => msg.clone(),
        }
    }
}

/// Human-readable size: whole units where exact, one decimal otherwise.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    let (unit, name) = match bytes {
        b if b >= MB => (MB, "MB"),
        b if b >= KB => (KB, "KB"),
        b => return format!("{} bytes", b),
    };
    if bytes % unit == 0 {
        format!("{} {}", bytes / unit, name)
    } else {
        format!("{:.1} {}", bytes as f64 / unit as f64, name)
    }
}
