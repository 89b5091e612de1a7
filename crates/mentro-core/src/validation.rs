//! Validation utilities for staged attachments

use std::path::Path;

use crate::error::ComposeError;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Guess the MIME type of a file from its extension.
pub fn content_type_for_filename(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        // Videos
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "m4v" => "video/x-m4v",
        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "zip" => "application/zip",
        _ => {
            tracing::debug!(
                extension = %extension,
                filename = %filename,
                "Unknown extension, using generic content type"
            );
            FALLBACK_CONTENT_TYPE
        }
    }
}

/// Make `filename` unique against the names for which `taken` returns true.
///
/// A counter is inserted before the extension: `photo.png` becomes `photo (1).png`,
/// then `photo (2).png`. Names without an extension get the counter appended.
pub fn disambiguate_file_name(filename: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(filename) {
        return filename.to_string();
    }

    let (stem, extension) = match filename.rfind('.') {
        Some(idx) if idx > 0 => (&filename[..idx], &filename[idx..]),
        _ => (filename, ""),
    };

    let mut counter = 1usize;
    loop {
        let candidate = format!("{} ({}){}", stem, counter, extension);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Reject a file whose size exceeds `limit`. `None` means no limit.
pub fn validate_file_size(name: &str, size: u64, limit: Option<u64>) -> Result<(), ComposeError> {
    match limit {
        Some(limit) if size > limit => Err(ComposeError::FileTooLarge {
            name: name.to_string(),
            size,
            limit,
        }),
        _ => Ok(()),
    }
}
