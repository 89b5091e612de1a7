use serde::{Deserialize, Serialize};

use super::attachment::AttachmentKind;

/// Upload progress of one attachment within a submission, keyed by file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgressEntry {
    pub file_name: String,
    /// Percent complete, 0 to 100. Not guaranteed to increase monotonically.
    pub progress: u8,
    pub kind: AttachmentKind,
}

impl UploadProgressEntry {
    pub fn new(file_name: impl Into<String>, kind: AttachmentKind) -> Self {
        Self {
            file_name: file_name.into(),
            progress: 0,
            kind,
        }
    }
}
