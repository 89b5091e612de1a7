use std::path::{Component, Path};

use anyhow::{Context, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::validation::content_type_for_filename;

/// Kind of a staged attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
    Video,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::File => "file",
            AttachmentKind::Video => "video",
        }
    }

    /// Multipart field name the backend expects for this kind.
    pub fn form_field(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "images",
            AttachmentKind::File => "files",
            AttachmentKind::Video => "video",
        }
    }
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw bytes of a user-selected file plus its name and MIME type.
///
/// Cloning is cheap: the payload is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    name: String,
    content_type: String,
    data: Bytes,
}

impl FileHandle {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a local file, inferring the MIME type from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.components().any(|c| c == Component::ParentDir) {
            return Err(anyhow::anyhow!("Invalid input: {}", path.display()));
        }

        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        let content_type = content_type_for_filename(&name);

        Ok(Self::new(name, content_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Same bytes under a different name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: self.content_type.clone(),
            data: self.data.clone(),
        }
    }
}

/// A file selected by the user but not yet sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAttachment {
    pub kind: AttachmentKind,
    pub file: FileHandle,
    /// Locally generated preview, absent when preview generation failed.
    pub preview_url: Option<String>,
}

impl StagedAttachment {
    pub fn name(&self) -> &str {
        self.file.name()
    }
}
