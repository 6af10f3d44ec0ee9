//! Conveyor HTTP Client
//!
//! A small, typed HTTP client for the Conveyor server API, shared by the CLI
//! and any other tool that drives the engine remotely.
//!
//! # Example
//!
//! ```no_run
//! use conveyor_client::ConveyorClient;
//! use conveyor_core::dto::job::CreateJob;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ConveyorClient::new("http://localhost:8080");
//!
//!     let job = client.create_job(CreateJob {
//!         command: "echo".to_string(),
//!         args: vec!["hello".to_string()],
//!         ..CreateJob::default()
//!     }).await?;
//!
//!     println!("Created job: {}", job.id);
//!     Ok(())
//! }
//! ```

mod capabilities;
pub mod error;
mod jobs;
mod pipelines;
mod stats;

pub use error::{ClientError, Result};
pub use reqwest::StatusCode;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// HTTP client for the Conveyor server API
///
/// Methods are grouped by resource:
/// - Jobs (create, list, get, update)
/// - Pipelines (create, list, get, update, run, context)
/// - Capabilities (list, execute)
/// - Stats
#[derive(Debug, Clone)]
pub struct ConveyorClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Sent as `X-API-Key` on every `/api` request when set
    api_key: Option<String>,
}

impl ConveyorClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use conveyor_client::ConveyorClient;
    ///
    /// let client = ConveyorClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            api_key: None,
        }
    }

    /// Authenticate every request with the given API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /health
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_empty_response(response).await
    }

    /// Build a request for `/api/<segments..>`
    ///
    /// Segments are percent-encoded, so IDs and capability names can be passed as-is.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidRequest(format!("Invalid server URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!("'{}' cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        tracing::debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        Ok(match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        })
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api(status, error_message(&error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Check the status code of a response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api(status, error_message(&error_text)));
        }

        Ok(())
    }
}

/// The `error` field of a JSON error body, or the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
