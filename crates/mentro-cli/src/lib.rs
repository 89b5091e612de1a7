use mentro_compose::{HashtagComposer, Key};
use mentro_core::models::UploadProgressEntry;

const PROGRESS_BAR_WIDTH: usize = 20;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One line per progress update: `name [#####...............]  25%`
pub fn format_progress(entry: &UploadProgressEntry) -> String {
    let filled = usize::from(entry.progress.min(100)) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "{:<32} [{}{}] {:>3}%",
        truncate_string(&entry.file_name, 32),
        "#".repeat(filled),
        ".".repeat(PROGRESS_BAR_WIDTH - filled),
        entry.progress
    )
}

/// Commit each tag as if typed and confirmed with Enter. Returns the rejected inputs.
pub fn feed_tags<'a>(composer: &mut HashtagComposer, tags: &'a [String]) -> Vec<&'a str> {
    let mut rejected = Vec::new();
    for tag in tags {
        let mut buffer = tag.clone();
        if !composer.on_key(&mut buffer, Key::Enter) {
            rejected.push(tag.as_str());
        }
    }
    rejected
}


/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
