//! Attachment staging.
//!
//! Attachments are identified by file name, never by position. A file whose name
//! collides with one already staged is renamed (`photo.png` -> `photo (1).png`), so
//! names stay unique and progress updates keyed by name always hit one attachment.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use mentro_core::models::{AttachmentKind, FileHandle, StagedAttachment};
use mentro_core::validation::{disambiguate_file_name, validate_file_size};
use mentro_core::{ComposeError, UploadLimits};
use thiserror::Error;
use uuid::Uuid;

/// Preview generation errors
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Cannot preview empty file: {0}")]
    EmptyFile(String),

    #[error("Preview unavailable: {0}")]
    Unavailable(String),
}

/// Creates and revokes local preview URLs for staged files.
pub trait PreviewProvider: Send + Sync {
    fn create(&self, file: &FileHandle) -> Result<String, PreviewError>;

    /// Revoke a URL previously returned by `create`. Unknown URLs are ignored.
    fn revoke(&self, url: &str);
}

/// In-process preview registry issuing `blob:mentro/<uuid>` URLs.
#[derive(Debug, Default)]
pub struct LocalPreviews {
    live: Mutex<HashSet<String>>,
}

impl LocalPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of previews created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live
            .lock()
            .map(|live| live.contains(url))
            .unwrap_or(false)
    }
}

impl PreviewProvider for LocalPreviews {
    fn create(&self, file: &FileHandle) -> Result<String, PreviewError> {
        if file.size() == 0 {
            return Err(PreviewError::EmptyFile(file.name().to_string()));
        }
        let url = format!("blob:mentro/{}", Uuid::new_v4());
        let mut live = self
            .live
            .lock()
            .map_err(|_| PreviewError::Unavailable("preview registry poisoned".to_string()))?;
        live.insert(url.clone());
        Ok(url)
    }

    fn revoke(&self, url: &str) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(url);
        }
    }
}

/// Attachments selected for the next post: images, generic files and at most one video.
pub struct MediaStagingStore {
    images: Vec<StagedAttachment>,
    files: Vec<StagedAttachment>,
    video: Option<StagedAttachment>,
    previews: Arc<dyn PreviewProvider>,
    limits: UploadLimits,
}

impl MediaStagingStore {
    pub fn new(previews: Arc<dyn PreviewProvider>) -> Self {
        Self {
            images: Vec::new(),
            files: Vec::new(),
            video: None,
            previews,
            limits: UploadLimits::unlimited(),
        }
    }

    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Stage each file as an image, after the ones already staged.
    ///
    /// Never fails as a whole: an image over the size limit is skipped with a warning.
    /// Returns the names the staged images ended up with.
    pub fn add_images<I>(&mut self, files: I) -> Vec<String>
    where
        I: IntoIterator<Item = FileHandle>,
    {
        let mut staged = Vec::new();
        for file in files {
            if let Err(err) =
                validate_file_size(file.name(), file.size(), self.limits.max_image_bytes)
            {
                tracing::warn!(error = %err, "Skipping image over size limit");
                continue;
            }
            let attachment = self.stage(AttachmentKind::Image, file);
            staged.push(attachment.name().to_string());
            self.images.push(attachment);
        }
        staged
    }

    /// Stage a generic file. Returns the name it was staged under.
    pub fn add_file(&mut self, file: FileHandle) -> Result<String, ComposeError> {
        validate_file_size(file.name(), file.size(), self.limits.max_file_bytes)?;
        let attachment = self.stage(AttachmentKind::File, file);
        let name = attachment.name().to_string();
        self.files.push(attachment);
        Ok(name)
    }

    /// Stage the video, replacing and revoking any previously staged one.
    pub fn set_video(&mut self, file: FileHandle) -> Result<String, ComposeError> {
        validate_file_size(file.name(), file.size(), self.limits.max_video_bytes)?;
        if let Some(previous) = self.video.take() {
            tracing::debug!(file_name = %previous.name(), "Replacing staged video");
            self.revoke(&previous);
        }
        let attachment = self.stage(AttachmentKind::Video, file);
        let name = attachment.name().to_string();
        self.video = Some(attachment);
        Ok(name)
    }

    /// Remove the attachment of `kind` named `name`, revoking its preview.
    pub fn remove(&mut self, kind: AttachmentKind, name: &str) -> Option<StagedAttachment> {
        let removed = match kind {
            AttachmentKind::Image => take_by_name(&mut self.images, name),
            AttachmentKind::File => take_by_name(&mut self.files, name),
            AttachmentKind::Video => {
                if self.video.as_ref().map(|v| v.name()) == Some(name) {
                    self.video.take()
                } else {
                    None
                }
            }
        };
        if let Some(attachment) = &removed {
            self.revoke(attachment);
        }
        removed
    }

    /// Remove by position within `kind`, resolved to the file name first.
    pub fn remove_at(&mut self, kind: AttachmentKind, index: usize) -> Option<StagedAttachment> {
        let name = match kind {
            AttachmentKind::Image => self.images.get(index)?.name().to_string(),
            AttachmentKind::File => self.files.get(index)?.name().to_string(),
            AttachmentKind::Video if index == 0 => self.video.as_ref()?.name().to_string(),
            AttachmentKind::Video => return None,
        };
        self.remove(kind, &name)
    }

    /// Empty every collection and revoke all previews.
    pub fn clear(&mut self) {
        let video = self.video.take();
        for attachment in self.images.drain(..).chain(self.files.drain(..)).chain(video) {
            if let Some(url) = &attachment.preview_url {
                self.previews.revoke(url);
            }
        }
    }

    /// Copy of everything staged, in submission order: images, files, video.
    pub fn snapshot(&self) -> Vec<StagedAttachment> {
        self.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedAttachment> {
        self.images
            .iter()
            .chain(self.files.iter())
            .chain(self.video.iter())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.iter().any(|a| a.name() == name)
    }

    pub fn images(&self) -> &[StagedAttachment] {
        &self.images
    }

    pub fn files(&self) -> &[StagedAttachment] {
        &self.files
    }

    pub fn video(&self) -> Option<&StagedAttachment> {
        self.video.as_ref()
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.files.len() + usize::from(self.video.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stage(&self, kind: AttachmentKind, file: FileHandle) -> StagedAttachment {
        let unique = disambiguate_file_name(file.name(), |n| self.contains(n));
        let file = if unique != file.name() {
            tracing::debug!(original = %file.name(), renamed = %unique, "Renamed duplicate file name");
            file.renamed(unique)
        } else {
            file
        };

        let preview_url = match self.previews.create(&file) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(file_name = %file.name(), error = %err, "Preview generation failed");
                None
            }
        };

        StagedAttachment {
            kind,
            file,
            preview_url,
        }
    }

    fn revoke(&self, attachment: &StagedAttachment) {
        if let Some(url) = &attachment.preview_url {
            self.previews.revoke(url);
        }
    }
}

impl Default for MediaStagingStore {
    fn default() -> Self {
        Self::new(Arc::new(LocalPreviews::new()))
    }
}

impl std::fmt::Debug for MediaStagingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStagingStore")
            .field("images", &self.images)
            .field("files", &self.files)
            .field("video", &self.video)
            .field("limits", &self.limits)
            .finish()
    }
}

fn take_by_name(items: &mut Vec<StagedAttachment>, name: &str) -> Option<StagedAttachment> {
    let index = items.iter().position(|a| a.name() == name)?;
    Some(items.remove(index))
}
