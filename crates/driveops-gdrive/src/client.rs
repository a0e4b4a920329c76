//! Google Drive API client
//!
//! Provides an authenticated HTTP client for the Drive v3 REST API. Handles
//! bearer authentication, endpoint construction, the Google error envelope
//! and throttling retry.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use driveops_gdrive::client::{DriveClient, EnvToken};
//! use std::sync::Arc;
//!
//! let client = DriveClient::with_token_source(
//!     Arc::new(EnvToken::new("DRIVEOPS_ACCESS_TOKEN")),
//!     "https://www.googleapis.com",
//! )
//! .with_max_retries(3);
//! ```
//!
//! ## Design Notes
//!
//! - Only throttling is retried: a 429, or a 503 carrying `Retry-After`.
//!   Every other status is handed back to the caller unchanged.
//! - A request whose body is a stream cannot be cloned and is therefore sent
//!   exactly once.

use std::{sync::Arc, time::Duration};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::DriveError;

/// Base URL of the Google APIs front end
pub const GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com";

/// Default retry-after duration when the header is missing (30 seconds)
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Upper bound accepted for an HTTP-date `Retry-After`
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Maximum number of retries for throttled responses
pub const DEFAULT_MAX_RETRIES: u32 = 5;

// ============================================================================
// Token sources
// ============================================================================

/// Supplies the bearer token attached to every request
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Result<String, DriveError>;
}

/// A fixed access token
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn access_token(&self) -> Result<String, DriveError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every request
///
/// A token refreshed by an external helper is therefore picked up without
/// restarting the run.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Name of the variable holding the token
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl TokenSource for EnvToken {
    fn access_token(&self) -> Result<String, DriveError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Ok(_) => Err(DriveError::Token(format!("{} is empty", self.var))),
            Err(_) => Err(DriveError::Token(format!("{} is not set", self.var))),
        }
    }
}

// ============================================================================
// Error envelope
// ============================================================================

/// `{"error": {...}}` body returned by Google APIs on failure
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Builds a [`DriveError::Api`] from a status and raw response body
pub(crate) fn api_error(status: StatusCode, body: &[u8]) -> DriveError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => DriveError::Api {
            status: status.as_u16(),
            message: envelope.error.message,
            reason: envelope
                .error
                .errors
                .into_iter()
                .find_map(|detail| detail.reason),
        },
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            } else {
                text
            };
            DriveError::Api {
                status: status.as_u16(),
                message,
                reason: None,
            }
        }
    }
}

/// Passes a successful response through, or turns an error status into a
/// [`DriveError::Api`]
pub(crate) async fn check_status(response: Response) -> Result<Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await?;
    Err(api_error(status, &body))
}

// ============================================================================
// DriveClient
// ============================================================================

/// HTTP client for Drive API calls
///
/// Cheap to clone: the underlying `reqwest::Client` and token source are
/// shared.
#[derive(Clone)]
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Where the bearer token comes from
    token: Arc<dyn TokenSource>,
    /// Retries granted to a throttled request
    max_retries: u32,
}

impl DriveClient {
    /// Creates a client for the public API with a fixed access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, GOOGLE_API_BASE_URL)
    }

    /// Creates a client with a custom base URL (useful for testing)
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_token_source(Arc::new(StaticToken::new(access_token)), base_url)
    }

    /// Creates a client drawing its token from `token`
    pub fn with_token_source(token: Arc<dyn TokenSource>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets how many times a throttled request is retried
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL (e.g., "/drive/v3/files")
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, DriveError> {
        let token = self.token.access_token()?;
        let url = format!("{}{}", self.base_url, path);
        Ok(self.client.request(method, &url).bearer_auth(token))
    }

    /// Sends `builder`, retrying while the API throttles.
    ///
    /// On a 429, or a 503 with `Retry-After`, the header is parsed and the
    /// request is re-sent after that delay, up to `max_retries` times.
    /// Requests with a streamed body are sent once.
    ///
    /// # Returns
    /// The first non-throttled response; its status is not checked.
    pub async fn execute_with_retry(&self, builder: RequestBuilder) -> Result<Response, DriveError> {
        let mut attempt: u32 = 0;

        loop {
            let Some(request) = builder.try_clone() else {
                debug!("Streamed request body, sending without retry");
                return Ok(builder.send().await?);
            };

            let response = request.send().await?;
            let status = response.status();

            let Some(retry_after) = throttle_delay(&response) else {
                if attempt > 0 {
                    info!(attempt, status = status.as_u16(), "Request succeeded after retry");
                }
                return Ok(response);
            };

            if attempt >= self.max_retries {
                warn!(
                    attempts = attempt + 1,
                    status = status.as_u16(),
                    "Throttling retry limit exhausted"
                );
                return Err(DriveError::RetryExhausted {
                    attempts: attempt + 1,
                    status: status.as_u16(),
                });
            }

            info!(
                attempt,
                status = status.as_u16(),
                ?retry_after,
                "Throttled, backing off"
            );

            tokio::time::sleep(retry_after).await;
            attempt += 1;
        }
    }
}

/// Delay to wait before retrying `response`, or `None` if it is not a
/// throttling response
fn throttle_delay(response: &Response) -> Option<Duration> {
    let header = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok());

    match (response.status(), header) {
        (StatusCode::TOO_MANY_REQUESTS, Some(value)) => {
            Some(parse_retry_after(value, DEFAULT_RETRY_AFTER))
        }
        (StatusCode::TOO_MANY_REQUESTS, None) => Some(DEFAULT_RETRY_AFTER),
        (StatusCode::SERVICE_UNAVAILABLE, Some(value)) => {
            Some(parse_retry_after(value, DEFAULT_RETRY_AFTER))
        }
        _ => None,
    }
}

/// Parses a `Retry-After` header value
///
/// Accepts either delta-seconds or an HTTP-date, at most an hour ahead in
/// both forms. Anything else yields `default`.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    let value = value.trim();
    let wait = match value.parse::<u64>() {
        Ok(seconds) => Some(Duration::from_secs(seconds)),
        Err(_) => chrono::DateTime::parse_from_rfc2822(value)
            .ok()
            .and_then(|date| {
                (date.with_timezone(&chrono::Utc) - chrono::Utc::now())
                    .to_std()
                    .ok()
            })
            .map(|wait| Duration::from_secs(wait.as_secs())),
    };
    if let Some(wait) = wait.filter(|wait| *wait <= MAX_RETRY_AFTER) {
        return wait;
    }

    warn!(value, "Unusable Retry-After header, using default");
    default
}
