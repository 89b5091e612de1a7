//! HTTP client for the Mentro API.
//!
//! Provides a minimal client with configurable auth (Bearer token or X-API-Key)
//! and the streamed post creation endpoint. It implements
//! [`mentro_compose::PostTransport`], so a `SubmissionController` can drive it directly.

pub mod api;

use anyhow::{Context, Result};
use mentro_core::ClientConfig;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_API_PREFIX: &str = "/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

/// HTTP client for the Mentro API with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_prefix: String,
    auth: Auth,
    read_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth) -> Result<Self> {
        Self::build(
            base_url,
            DEFAULT_API_PREFIX.to_string(),
            auth,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create client from configuration. Prefers the bearer token over the API key.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let auth = match (&config.api_token, &config.api_key) {
            (Some(token), _) => Auth::Bearer(token.clone()),
            (None, Some(key)) => Auth::XApiKey(key.clone()),
            (None, None) => {
                return Err(anyhow::anyhow!(
                    "Missing credentials. Set MENTRO_API_TOKEN or MENTRO_API_KEY"
                ))
            }
        };

        Self::build(
            config.api_url.clone(),
            config.api_prefix(),
            auth,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create client from environment (see [`ClientConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        Self::from_config(&config)
    }

    /// `read_timeout` bounds each read, not the whole exchange: a long upload keeps
    /// going as long as the progress stream keeps producing chunks.
    fn build(
        base_url: String,
        api_prefix: String,
        auth: Auth,
        read_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .read_timeout(read_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix,
            auth,
            read_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::XApiKey(key) => request.header("X-API-Key", key.as_str()),
        }
    }

    /// POST multipart form and return the raw response without checking its status,
    /// so the caller can stream the body or read the error payload.
    pub async fn post_multipart_raw(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<reqwest::Response> {
        let url = self.build_url(path);
        let request = self.client.post(&url).multipart(form);
        let request = self.apply_auth(request);

        request.send().await.context("Failed to send request")
    }
}
