//! Mentro CLI: create posts with attachments from the command line.
//!
//! Set MENTRO_API_URL (or API_URL) and MENTRO_API_TOKEN or MENTRO_API_KEY.
//! Upload progress is printed to stderr, the created post as JSON to stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mentro_api_client::ApiClient;
use mentro_cli::{feed_tags, format_progress, init_tracing, truncate_string};
use mentro_compose::{LocalPreviews, MediaStagingStore, SubmissionController};
use mentro_core::models::FileHandle;
use mentro_core::{ClientConfig, ErrorMetadata};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "mentro", about = "Mentro API CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a post, uploading attachments with live progress
    Post {
        /// Post text
        #[arg(long, default_value = "")]
        content: String,
        /// Hashtag, with or without the leading '#'. Repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Image to attach. Repeatable
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// File to attach. Repeatable
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// Video to attach
        #[arg(long)]
        video: Option<PathBuf>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn load(path: &Path) -> anyhow::Result<FileHandle> {
    FileHandle::from_path(path).with_context(|| format!("Failed to stage {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let client = ApiClient::from_config(&config).context(
        "Failed to create API client. Set MENTRO_API_TOKEN or MENTRO_API_KEY and MENTRO_API_URL (or API_URL)",
    )?;

    match cli.command {
        Commands::Post {
            content,
            tags,
            images,
            files,
            video,
        } => {
            let staging = MediaStagingStore::new(Arc::new(LocalPreviews::new()))
                .with_limits(config.upload_limits);
            let mut controller = SubmissionController::with_staging(client, staging)
                .on_progress(|entry| eprintln!("{}", format_progress(entry)));

            controller.set_content(content);
            for rejected in feed_tags(controller.hashtags_mut(), &tags) {
                tracing::warn!(tag = %rejected, "Hashtag skipped");
            }

            let handles = images.iter().map(|p| load(p)).collect::<anyhow::Result<Vec<_>>>()?;
            let requested = handles.len();
            let staged = controller.staging_mut().add_images(handles);
            if staged.len() < requested {
                tracing::warn!(
                    skipped = requested - staged.len(),
                    "Some images were not attached"
                );
            }
            for path in &files {
                let name = controller
                    .staging_mut()
                    .add_file(load(path)?)
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
                tracing::debug!(name = %name, "File staged");
            }
            if let Some(path) = &video {
                controller
                    .staging_mut()
                    .set_video(load(path)?)
                    .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            }

            let cancel = controller.cancel_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Cancelling upload");
                    cancel.cancel();
                }
            });

            tracing::info!(
                content = %truncate_string(controller.content(), 40),
                attachments = controller.staging().len(),
                "Creating post"
            );

            match controller.submit().await {
                Ok(post) => print_json(&post)?,
                Err(err) => {
                    let message = controller
                        .last_error()
                        .map(str::to_string)
                        .unwrap_or_else(|| err.user_message());
                    anyhow::bail!(message);
                }
            }
        }
    }

    Ok(())
}
