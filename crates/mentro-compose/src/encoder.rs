//! Multipart payload encoding.
//!
//! The payload is transport neutral: `mentro-api-client` turns it into a
//! `reqwest::multipart::Form`, tests inspect it directly.

use mentro_core::models::{FileHandle, StagedAttachment};
use mentro_core::ComposeError;

pub const CONTENT_FIELD: &str = "content";
pub const HASHTAGS_FIELD: &str = "hashtags";

/// One file part of the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    /// Multipart field name: `images`, `files` or `video`
    pub field: &'static str,
    pub file: FileHandle,
}

/// Snapshot of one post submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub content: String,
    /// JSON-encoded array of tag strings
    pub hashtags: String,
    /// File parts in staging order
    pub parts: Vec<FormPart>,
}

impl SubmissionPayload {
    /// Text fields in the order they are written to the body.
    pub fn text_fields(&self) -> [(&'static str, &str); 2] {
        [
            (CONTENT_FIELD, self.content.as_str()),
            (HASHTAGS_FIELD, self.hashtags.as_str()),
        ]
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.file.name())
    }

    pub fn total_bytes(&self) -> u64 {
        self.content.len() as u64
            + self.hashtags.len() as u64
            + self.parts.iter().map(|p| p.file.size()).sum::<u64>()
    }
}

pub struct SubmissionEncoder;

impl SubmissionEncoder {
    /// Build the payload. Performs no validation; the controller checks that
    /// there is something to post before calling this.
    pub fn encode(
        content: &str,
        tags: &[String],
        images: &[StagedAttachment],
        files: &[StagedAttachment],
        video: Option<&StagedAttachment>,
    ) -> Result<SubmissionPayload, ComposeError> {
        let hashtags = serde_json::to_string(tags)?;

        let parts = images
            .iter()
            .chain(files.iter())
            .chain(video)
            .map(|attachment| FormPart {
                field: attachment.kind.form_field(),
                file: attachment.file.clone(),
            })
            .collect();

        Ok(SubmissionPayload {
            content: content.to_string(),
            hashtags,
            parts,
        })
    }
}
