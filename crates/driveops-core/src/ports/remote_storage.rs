//! Remote storage port (driven/secondary port)
//!
//! This module defines the interface to the remote hierarchical-storage API:
//! a paged `list`, `create`, `update` and `delete`. The primary
//! implementation is the Google Drive v3 adapter in `driveops-gdrive`; tests
//! use an in-memory fake.
//!
//! ## Design Notes
//!
//! - Unlike the other ports this one returns a typed [`RemoteError`]: the
//!   executor has to tell a benign "not found" and a permission denial apart
//!   from every other failure.
//! - No retry happens behind this trait as far as the core is concerned.
//!   Adapters may retry transport-level throttling on their own.
//! - Media bodies are streams so large files never have to be buffered by the
//!   core.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, Stream, TryStreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::newtypes::RemoteId;
use crate::domain::resource::ResourceMetadata;

/// Mime type marking a remote item as a folder
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Fields requested when creating or updating an item
pub const ITEM_FIELDS: &str = "*";

// ============================================================================
// Listing DTOs
// ============================================================================

/// Parameters of one `list` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Filter expression, see [`crate::usecases::query`]
    pub query: String,
    /// Continuation cursor; `None` requests the first page
    pub page_token: Option<String>,
    /// Maximum items per page
    pub page_size: u32,
    /// Partial-response field selector
    pub fields: String,
    /// Storage spaces to search (e.g. `"drive"`)
    pub spaces: String,
}

/// One page of a `list` response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    /// Items of this page, in listing order
    pub items: Vec<RemoteItem>,
    /// Cursor of the next page; absent on the last page
    pub next_page_token: Option<String>,
}

/// A remote file or folder as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem {
    /// Item identifier
    pub id: RemoteId,
    /// Item name
    #[serde(default)]
    pub name: String,
    /// Content type; folders use [`FOLDER_MIME_TYPE`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Parent folder identifiers
    #[serde(default)]
    pub parents: Vec<RemoteId>,
    /// Every other field the API returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemoteItem {
    /// Returns true if the item is a folder
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
    }
}

// ============================================================================
// Media
// ============================================================================

/// Streamed content of an upload
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Media part of a create or update call
pub struct Media {
    /// Content type of the bytes
    pub mime_type: Option<String>,
    /// The bytes themselves
    pub body: ByteStream,
}

impl Media {
    pub fn new(mime_type: Option<String>, body: ByteStream) -> Self {
        Self { mime_type, body }
    }

    /// Media backed by an in-memory buffer
    pub fn from_bytes(mime_type: Option<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let body = stream::once(async move { Ok::<_, std::io::Error>(bytes) });
        Self::new(mime_type, Box::pin(body))
    }

    /// Drain the stream into a buffer
    pub async fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        self.body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok::<_, std::io::Error>(acc)
            })
            .await
    }
}

impl fmt::Debug for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Media")
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// RemoteError
// ============================================================================

/// Errors surfaced by a remote storage adapter
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The API answered with an error status
    #[error("Remote API error {status}: {message}")]
    Api {
        /// HTTP-like status code
        status: u16,
        /// Message reported by the API
        message: String,
    },

    /// The request never produced a usable response
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The API answered with a body that could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Shorthand for [`RemoteError::Api`]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        RemoteError::Api {
            status,
            message: message.into(),
        }
    }

    /// Status code, if the API answered at all
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The API's message, or the error's display form otherwise
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            RemoteError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// A 404 whose message says the item was not found
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            RemoteError::Api { status, message } => {
                *status == 404 && message.to_lowercase().contains("not found")
            }
            _ => false,
        }
    }

    /// A permission denial, recognized by its message
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            RemoteError::Api { message, .. } => {
                let message = message.to_lowercase();
                message.contains("insufficient permissions")
                    || message.contains("does not have sufficient permissions")
            }
            _ => false,
        }
    }
}

// ============================================================================
// IRemoteStorage trait
// ============================================================================

/// Port for the remote hierarchical-storage API
#[async_trait]
pub trait IRemoteStorage: Send + Sync {
    /// Fetch one page of items matching `request.query`
    async fn list(&self, request: &ListRequest) -> Result<ListPage, RemoteError>;

    /// Create an item; folders are created with `media = None`
    async fn create(
        &self,
        resource: ResourceMetadata,
        media: Option<Media>,
        fields: &str,
    ) -> Result<RemoteItem, RemoteError>;

    /// Update an item in place, replacing its content when `media` is given
    async fn update(
        &self,
        id: &RemoteId,
        resource: ResourceMetadata,
        media: Option<Media>,
        fields: &str,
    ) -> Result<RemoteItem, RemoteError>;

    /// Delete an item and, for folders, everything below it
    async fn delete(&self, id: &RemoteId) -> Result<(), RemoteError>;
}
