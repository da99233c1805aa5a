//! Raw HTTP client for the hosted pipe API.
//!
//! No pattern awareness — just makes API calls via reqwest.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;

use super::types::{CreatePipeRequest, PipeHandle, RunOutcome, RunPipeRequest, WireRunResponse};
use super::PipeBackend;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.langbase.com";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "LANGBASE_API_KEY";

/// Environment variable overriding the API endpoint.
pub const BASE_URL_VAR: &str = "LANGBASE_BASE_URL";

/// Response header carrying the conversation thread id.
const THREAD_HEADER: &str = "lb-thread-id";

/// Errors from pipe operations.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("missing API key: {0}")]
    MissingApiKey(String),
}

/// Raw HTTP client for the pipe API.
#[derive(Debug, Clone)]
pub struct PipeClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl PipeClient {
    /// Create a client against the default endpoint.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.into())
    }

    /// Create a client with a custom base URL (self-hosted gateway, test server).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from the environment, loading `.env` first.
    pub fn from_env() -> Result<Self, PipeError> {
        dotenv::dotenv().ok();
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| PipeError::MissingApiKey(format!("{API_KEY_VAR} environment variable not set")))?;
        let base_url = std::env::var(BASE_URL_VAR).unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Ok(Self::with_base_url(api_key, base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The shared reqwest client (reused for signed-URL uploads).
    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// POST a JSON body to `path`, mapping error statuses.
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, PipeError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        check_status(response).await
    }
}

/// Map 429 and other error statuses into `PipeError`.
pub(crate) async fn check_status(response: Response) -> Result<Response, PipeError> {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(PipeError::RateLimited { retry_after });
    }

    if status >= 400 {
        let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
        return Err(PipeError::Api {
            status,
            message: body,
        });
    }

    Ok(response)
}

#[async_trait]
impl PipeBackend for PipeClient {
    async fn create_pipe(&self, request: &CreatePipeRequest) -> Result<PipeHandle, PipeError> {
        let response = self.post_json("/v1/pipes", request).await?;
        response
            .json::<PipeHandle>()
            .await
            .map_err(|e| PipeError::InvalidResponse(format!("failed to parse pipe: {e}")))
    }

    async fn run_pipe(&self, request: &RunPipeRequest) -> Result<RunOutcome, PipeError> {
        let response = self.post_json("/v1/pipes/run", request).await?;

        let header_thread = response
            .headers()
            .get(THREAD_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let wire: WireRunResponse = response
            .json()
            .await
            .map_err(|e| PipeError::InvalidResponse(format!("failed to parse run response: {e}")))?;

        Ok(wire.into_outcome(header_thread))
    }
}
