//! Configuration module
//!
//! Client-side settings for talking to the Mentro backend: where it lives, how to
//! authenticate, request timeout and the per-kind attachment size limits.

use std::env;

// Common constants
const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_API_VERSION: &str = "v1";
const REQUEST_TIMEOUT_SECS: u64 = 300;
const MAX_IMAGE_SIZE_MB: u64 = 10;
const MAX_VIDEO_SIZE_MB: u64 = 500;
const MAX_FILE_SIZE_MB: u64 = 50;

/// Per-kind size limits applied when staging attachments. `None` means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_image_bytes: Option<u64>,
    pub max_video_bytes: Option<u64>,
    pub max_file_bytes: Option<u64>,
}

impl UploadLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }
}

/// API client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_version: String,
    pub api_token: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub upload_limits: UploadLimits,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = ClientConfig {
            api_url: env::var("MENTRO_API_URL")
                .or_else(|_| env::var("API_URL"))
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_version: env::var("MENTRO_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
            api_token: env::var("MENTRO_API_TOKEN")
                .or_else(|_| env::var("API_TOKEN"))
                .ok()
                .filter(|s| !s.is_empty()),
            api_key: env::var("MENTRO_API_KEY").ok().filter(|s| !s.is_empty()),
            request_timeout_secs: env::var("MENTRO_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MENTRO_REQUEST_TIMEOUT_SECS must be a valid number"))?,
            upload_limits: UploadLimits {
                max_image_bytes: mb_limit_from_env("MENTRO_MAX_IMAGE_SIZE_MB", MAX_IMAGE_SIZE_MB)?,
                max_video_bytes: mb_limit_from_env("MENTRO_MAX_VIDEO_SIZE_MB", MAX_VIDEO_SIZE_MB)?,
                max_file_bytes: mb_limit_from_env("MENTRO_MAX_FILE_SIZE_MB", MAX_FILE_SIZE_MB)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "MENTRO_API_URL must start with http:// or https://"
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "MENTRO_REQUEST_TIMEOUT_SECS must be greater than zero"
            ));
        }

        Ok(())
    }

    /// API version prefix (e.g. "/api/v1").
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_token: None,
            api_key: None,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            upload_limits: UploadLimits {
                max_image_bytes: Some(MAX_IMAGE_SIZE_MB * 1024 * 1024),
                max_video_bytes: Some(MAX_VIDEO_SIZE_MB * 1024 * 1024),
                max_file_bytes: Some(MAX_FILE_SIZE_MB * 1024 * 1024),
            },
        }
    }
}

/// Reads a megabyte limit. "0" disables the limit; unparseable values fall back to the default.
fn mb_limit_from_env(key: &str, default_mb: u64) -> Result<Option<u64>, anyhow::Error> {
    parse_mb_limit(key, env::var(key).ok().as_deref(), default_mb)
}

fn parse_mb_limit(
    key: &str,
    raw: Option<&str>,
    default_mb: u64,
) -> Result<Option<u64>, anyhow::Error> {
    let mb = raw
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default_mb);
    if mb == 0 {
        return Ok(None);
    }
    mb.checked_mul(1024 * 1024)
        .map(Some)
        .ok_or_else(|| anyhow::anyhow!("{} is too large", key))
}
