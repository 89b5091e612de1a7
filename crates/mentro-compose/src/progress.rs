use mentro_core::models::{StagedAttachment, UploadProgressEntry};
use mentro_core::ComposeError;

/// Per-file upload progress for the submission in flight.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    entries: Vec<UploadProgressEntry>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all entries with one zeroed entry per attachment.
    ///
    /// Duplicate file names are rejected: their progress would be indistinguishable.
    pub fn begin(&mut self, attachments: &[StagedAttachment]) -> Result<(), ComposeError> {
        let mut entries: Vec<UploadProgressEntry> = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            if entries.iter().any(|e| e.file_name == attachment.name()) {
                return Err(ComposeError::InvalidInput(format!(
                    "Duplicate file name in submission: {}",
                    attachment.name()
                )));
            }
            entries.push(UploadProgressEntry::new(attachment.name(), attachment.kind));
        }
        self.entries = entries;
        Ok(())
    }

    /// Overwrite the progress of `file_name`. Returns the updated entry, or `None`
    /// when no entry has that name.
    pub fn update(&mut self, file_name: &str, progress: u8) -> Option<&UploadProgressEntry> {
        let entry = self.entries.iter_mut().find(|e| e.file_name == file_name)?;
        entry.progress = progress.min(100);
        Some(&*entry)
    }

    pub fn remove(&mut self, file_name: &str) -> Option<UploadProgressEntry> {
        let index = self.entries.iter().position(|e| e.file_name == file_name)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, file_name: &str) -> Option<&UploadProgressEntry> {
        self.entries.iter().find(|e| e.file_name == file_name)
    }

    pub fn entries(&self) -> &[UploadProgressEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
