//! driveops-gdrive - Google Drive v3 adapter
//!
//! Implements the [`IRemoteStorage`](driveops_core::ports::IRemoteStorage)
//! port on top of the Drive v3 REST API.
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client with throttling retry
//! - [`files`] - `files.list`, `files.create`, `files.update` and `files.delete`
//! - [`storage`] - The port implementation used by the engine

pub mod client;
pub mod files;
pub mod storage;

pub use client::{DriveClient, EnvToken, StaticToken, TokenSource};
pub use storage::GoogleDriveStorage;

use driveops_core::ports::RemoteError;
use thiserror::Error;

/// Errors that can occur when communicating with the Drive API
#[derive(Debug, Error)]
pub enum DriveError {
    /// The API answered with an error status
    #[error("Drive API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Top-level `error.message` of the response
        message: String,
        /// First `error.errors[].reason`, when present
        reason: Option<String>,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Throttling persisted past the retry limit
    #[error("Too many requests: retry limit exhausted after {attempts} attempts (last status {status})")]
    RetryExhausted {
        /// Number of requests sent
        attempts: u32,
        /// Status of the last response
        status: u16,
    },

    /// No access token could be obtained
    #[error("Access token unavailable: {0}")]
    Token(String),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<DriveError> for RemoteError {
    fn from(err: DriveError) -> Self {
        match err {
            DriveError::Api {
                status, message, ..
            } => RemoteError::Api { status, message },
            DriveError::RetryExhausted { status, .. } => {
                RemoteError::api(status, "Rate limit exceeded")
            }
            DriveError::InvalidResponse(message) => RemoteError::InvalidResponse(message),
            other @ (DriveError::Network(_) | DriveError::Token(_)) => {
                RemoteError::Transport(Box::new(other))
            }
        }
    }
}
