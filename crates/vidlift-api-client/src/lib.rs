//! HTTP client for the direct-to-storage video upload protocol.
//!
//! An upload runs in three phases, each behind its own trait so the
//! [`Uploader`] can be driven by real HTTP implementations or by stubs:
//!
//! 1. [`CredentialRequester`] asks the backend for an upload token and a
//!    pre-signed write URL.
//! 2. [`StorageTransport`] streams the file straight to storage.
//! 3. [`CompletionNotifier`] tells the backend the bytes landed.
//!
//! [`ApiClient`] implements the two backend phases, [`HttpStorageTransport`] the
//! storage phase.

pub mod api;
pub mod notifier;
pub mod orchestrator;
pub mod requester;
pub mod source;
pub mod transport;

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use vidlift_core::{ClientConfig, UploadError, UploadResult};

/// Path of the upload credential endpoint
pub const REQUEST_PATH: &str = "/api/storage/upload/request/";
/// Path of the upload confirmation endpoint
pub const CONFIRM_PATH: &str = "/api/storage/upload/confirm/";
/// Path of the thumbnail upload endpoint
pub const THUMBNAIL_PATH: &str = "/api/upload-thumbnail";

/// Authentication used for backend calls.
///
/// Passed in explicitly; the client never reads ambient state to find a token.
#[derive(Clone)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// Configured stand-in sent as a bearer token when no real token exists
    Placeholder(String),
}

impl Auth {
    /// Pick the configured token, or the placeholder when the fallback is enabled.
    pub fn resolve(token: Option<String>, placeholder: Option<String>) -> UploadResult<Self> {
        match (token, placeholder) {
            (Some(token), _) => Ok(Auth::Bearer(token)),
            (None, Some(placeholder)) => {
                tracing::warn!(
                    "No auth token configured, sending the placeholder bearer token instead"
                );
                Ok(Auth::Placeholder(placeholder))
            }
            (None, None) => Err(UploadError::Config(
                "no auth token configured and the placeholder token is disabled".to_string(),
            )),
        }
    }

    fn bearer_token(&self) -> &str {
        match self {
            Auth::Bearer(token) | Auth::Placeholder(token) => token,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Auth::Placeholder(_))
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Bearer(_) => write!(f, "Bearer(<redacted>)"),
            Auth::Placeholder(_) => write!(f, "Placeholder(<redacted>)"),
        }
    }
}

/// HTTP client for the backend endpoints
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    thumbnail_url: String,
    auth: Auth,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth) -> UploadResult<Self> {
        let config = ClientConfig {
            api_url: base_url.clone(),
            thumbnail_url: base_url,
            ..ClientConfig::default()
        };
        Self::with_auth(&config, auth)
    }

    /// Create client from configuration, resolving the auth token (or placeholder).
    pub fn from_config(config: &ClientConfig) -> UploadResult<Self> {
        let auth = Auth::resolve(config.auth_token.clone(), config.placeholder_token.clone())?;
        Self::with_auth(config, auth)
    }

    pub fn with_auth(config: &ClientConfig, auth: Auth) -> UploadResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| {
                UploadError::Config(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            thumbnail_url: config.thumbnail_url.trim_end_matches('/').to_string(),
            auth,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(
            "Authorization",
            format!("Bearer {}", self.auth.bearer_token()),
        )
    }

    /// POST JSON to a backend path with auth and the backend timeout applied.
    fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(self.build_url(path))
            .timeout(self.request_timeout)
            .json(body);
        self.apply_auth(request)
    }

    /// Send a request and deserialize a JSON response, failing on non-success status.
    async fn send_for_json<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> anyhow::Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send request: {}", describe_reqwest_error(e)))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(error_reason(response).await));
        }

        response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse response as JSON: {}", describe_reqwest_error(e)))
    }
}

/// Error body returned by the backend on failure
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Extract the backend's `{ "error": ... }` message, falling back to the status line.
pub(crate) async fn error_reason(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| format!("API request failed with status {}", status))
}

/// Render a reqwest error without the request URL (pre-signed URLs carry credentials).
pub(crate) fn describe_reqwest_error(err: reqwest::Error) -> String {
    if err.is_timeout() {
        return "request timed out".to_string();
    }
    if err.is_connect() {
        return "connection failed".to_string();
    }
    err.without_url().to_string()
}

// Re-export the phase traits and their HTTP implementations for convenience.
pub use notifier::CompletionNotifier;
pub use orchestrator::{StageProgressFn, UploadOptions, Uploader};
pub use requester::CredentialRequester;
pub use source::UploadFile;
pub use tokio_util::sync::CancellationToken;
pub use transport::{HttpStorageTransport, StorageTransport, TransferProgressFn};
