//! End-to-end post submission.
//!
//! One controller backs one compose form. It owns the draft text, the staged
//! attachments, the hashtags and the progress entries of the submission in flight,
//! and is the only component that mutates them during a submission.
//!
//! Failure handling:
//! - nothing to post: rejected before any network call, no message recorded
//! - non-2xx, missing body, transport failure, early stream end, cancellation:
//!   the attempt ends, the user-visible message is recorded, progress entries are
//!   cleared and the draft is kept so the user can resubmit
//! - completion: the post-created callback runs once and the whole draft is reset
//!
//! The response body reader is released exactly once whichever way the attempt ends.

use std::sync::{Arc, Mutex};

use mentro_core::error::GENERIC_REQUEST_ERROR;
use mentro_core::models::{AttachmentKind, Post, StagedAttachment, UploadProgressEntry};
use mentro_core::{ComposeError, ErrorMetadata, LogLevel};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::decoder::{ProgressEvent, ProgressEventDecoder, StreamEnd};
use crate::encoder::{SubmissionEncoder, SubmissionPayload};
use crate::hashtags::HashtagComposer;
use crate::progress::ProgressTracker;
use crate::staging::MediaStagingStore;
use crate::transport::{PostTransport, ReaderGuard};

pub type PostCreatedCallback = Box<dyn FnMut(&Post) + Send>;
pub type ProgressCallback = Box<dyn FnMut(&UploadProgressEntry) + Send>;

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Cancels the submission in flight, if any. Cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    current: Arc<Mutex<CancellationToken>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if let Ok(token) = self.current.lock() {
            token.cancel();
        }
    }

    /// Fresh token for a new attempt, so a stale cancel never hits the next submission.
    fn renew(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut current) = self.current.lock() {
            *current = token.clone();
        }
        token
    }
}

pub struct SubmissionController<T: PostTransport> {
    transport: T,
    content: String,
    staging: MediaStagingStore,
    hashtags: HashtagComposer,
    progress: ProgressTracker,
    last_error: Option<String>,
    cancel: CancelHandle,
    on_post_created: Option<PostCreatedCallback>,
    on_progress: Option<ProgressCallback>,
}

impl<T: PostTransport> SubmissionController<T> {
    pub fn new(transport: T) -> Self {
        Self::with_staging(transport, MediaStagingStore::default())
    }

    pub fn with_staging(transport: T, staging: MediaStagingStore) -> Self {
        Self {
            transport,
            content: String::new(),
            staging,
            hashtags: HashtagComposer::new(),
            progress: ProgressTracker::new(),
            last_error: None,
            cancel: CancelHandle::default(),
            on_post_created: None,
            on_progress: None,
        }
    }

    /// Called once with the created post, before the draft is reset.
    pub fn on_post_created(mut self, callback: impl FnMut(&Post) + Send + 'static) -> Self {
        self.on_post_created = Some(Box::new(callback));
        self
    }

    /// Called after every applied progress update.
    pub fn on_progress(
        mut self,
        callback: impl FnMut(&UploadProgressEntry) + Send + 'static,
    ) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn staging(&self) -> &MediaStagingStore {
        &self.staging
    }

    pub fn staging_mut(&mut self) -> &mut MediaStagingStore {
        &mut self.staging
    }

    pub fn hashtags(&self) -> &HashtagComposer {
        &self.hashtags
    }

    pub fn hashtags_mut(&mut self) -> &mut HashtagComposer {
        &mut self.hashtags
    }

    pub fn progress(&self) -> &[UploadProgressEntry] {
        self.progress.entries()
    }

    /// Message of the last failed attempt, cleared when a new attempt starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.content.trim().is_empty() || !self.staging.is_empty()
    }

    /// Remove a staged attachment by name together with its progress entry.
    pub fn remove_attachment(
        &mut self,
        kind: AttachmentKind,
        name: &str,
    ) -> Option<StagedAttachment> {
        let removed = self.staging.remove(kind, name)?;
        self.progress.remove(removed.name());
        Some(removed)
    }

    /// Validate the draft, create one progress entry per staged attachment and
    /// encode the payload from a snapshot of the current state.
    pub fn prepare(&mut self) -> Result<SubmissionPayload, ComposeError> {
        if !self.can_submit() {
            return Err(ComposeError::Validation);
        }

        let snapshot = self.staging.snapshot();
        self.progress.begin(&snapshot)?;

        let (images, rest): (Vec<_>, Vec<_>) = snapshot
            .into_iter()
            .partition(|a| a.kind == AttachmentKind::Image);
        let (files, video): (Vec<_>, Vec<_>) =
            rest.into_iter().partition(|a| a.kind == AttachmentKind::File);

        let payload = SubmissionEncoder::encode(
            &self.content,
            self.hashtags.tags(),
            &images,
            &files,
            video.first(),
        );
        if payload.is_err() {
            self.progress.clear();
        }
        payload
    }

    /// Submit the draft and follow the progress stream until the post is created.
    pub async fn submit(&mut self) -> Result<Post, ComposeError> {
        self.last_error = None;

        let payload = match self.prepare() {
            Ok(payload) => payload,
            Err(ComposeError::Validation) => {
                tracing::debug!("Submit ignored: nothing to post");
                return Err(ComposeError::Validation);
            }
            Err(err) => return Err(self.fail(err)),
        };

        tracing::info!(
            attachments = payload.parts.len(),
            bytes = payload.total_bytes(),
            "Submitting post"
        );

        let token = self.cancel.renew();
        match self.run(payload, &token).await {
            Ok(post) => {
                if let Some(callback) = self.on_post_created.as_mut() {
                    callback(&post);
                }
                self.reset();
                tracing::info!(post_id = %post.id, "Post created");
                Ok(post)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn run(
        &mut self,
        payload: SubmissionPayload,
        token: &CancellationToken,
    ) -> Result<Post, ComposeError> {
        let response = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ComposeError::Cancelled),
            response = self.transport.send(payload) => response?,
        };

        let success = response.is_success();
        let status = response.status;
        let mut reader = match response.body {
            Some(body) => ReaderGuard::new(body),
            None if success => return Err(ComposeError::NoResponseBody),
            None => {
                return Err(ComposeError::Request {
                    status,
                    message: GENERIC_REQUEST_ERROR.to_string(),
                })
            }
        };

        if !success {
            let message = read_error_message(&mut reader, token).await;
            return Err(ComposeError::Request { status, message });
        }

        let mut decoder = ProgressEventDecoder::new();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(ComposeError::Cancelled),
                chunk = reader.next_chunk() => chunk?,
            };

            let (events, end) = match chunk {
                Some(bytes) => (decoder.feed(&bytes), None),
                None => {
                    let (events, end) = decoder.finish();
                    (events, Some(end))
                }
            };

            for event in events {
                match event {
                    ProgressEvent::Progress {
                        file_name,
                        progress,
                    } => self.apply_progress(&file_name, progress),
                    ProgressEvent::Complete(post) => return Ok(*post),
                }
            }

            // A completion in the last events has already returned.
            if let Some(end) = end {
                debug_assert_eq!(end, StreamEnd::WithoutCompletion);
                return Err(ComposeError::UnexpectedStreamEnd);
            }
        }
    }

    fn apply_progress(&mut self, file_name: &str, progress: u8) {
        match self.progress.update(file_name, progress) {
            Some(entry) => {
                tracing::debug!(file_name = %entry.file_name, progress = entry.progress, "Upload progress");
                if let Some(callback) = self.on_progress.as_mut() {
                    callback(entry);
                }
            }
            None => {
                tracing::debug!(file_name = %file_name, progress, "Progress for unknown file ignored");
            }
        }
    }

    /// Record a failed attempt: keep the draft, drop the in-flight progress.
    fn fail(&mut self, err: ComposeError) -> ComposeError {
        self.progress.clear();
        let message = err.user_message();
        match err.log_level() {
            LogLevel::Debug => tracing::debug!(error = %err, code = err.error_code(), "Post submission failed"),
            LogLevel::Warn => tracing::warn!(error = %err, code = err.error_code(), "Post submission failed"),
            LogLevel::Error => tracing::error!(error = %err, code = err.error_code(), "Post submission failed"),
        }
        self.last_error = Some(message);
        err
    }

    fn reset(&mut self) {
        self.content.clear();
        self.hashtags.clear();
        self.staging.clear();
        self.progress.clear();
    }
}

/// Read an error response body and extract its `error` field.
async fn read_error_message(reader: &mut ReaderGuard, token: &CancellationToken) -> String {
    let mut body = Vec::new();
    loop {
        let chunk = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            chunk = reader.next_chunk() => chunk,
        };
        match chunk {
            Ok(Some(bytes)) => body.extend_from_slice(&bytes),
            Ok(None) => break,
            Err(err) => {
                tracing::debug!(error = %err, "Failed to read error response body");
                break;
            }
        }
    }

    serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_REQUEST_ERROR.to_string())
}
