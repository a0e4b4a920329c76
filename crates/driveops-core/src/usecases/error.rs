//! Use-case error type

use thiserror::Error;

use crate::domain::{ContentKey, RemoteId};
use crate::ports::RemoteError;

/// Errors raised while listing, resolving, upserting or executing
#[derive(Debug, Error)]
pub enum OperationError {
    /// The remote refused to delete a folder for lack of permissions
    #[error("{message} (id=\"{folder_id}\")")]
    PermissionDenied {
        /// Folder the delete was issued for
        folder_id: RemoteId,
        /// Message reported by the remote
        message: String,
    },

    /// Several folders matched one path step and the policy forbids guessing
    #[error("Ambiguous folder '{name}' under {parent}: {count} matches")]
    AmbiguousFolder {
        /// Segment being resolved
        name: String,
        /// Identifier of the parent searched under
        parent: String,
        /// Number of matching folders
        count: usize,
    },

    /// The policy only trusts explicit identifiers but the anchor is a name
    #[error("Folder {spec} must be anchored by an explicit id")]
    ExplicitIdRequired {
        /// Display form of the offending spec
        spec: String,
    },

    /// A listing kept returning cursors past the configured page bound
    #[error("Listing exceeded {max_pages} pages for query: {query}")]
    PageLimitExceeded {
        /// Configured bound
        max_pages: u32,
        /// Query being listed
        query: String,
    },

    /// Write-mode resolution ended without an identifier
    #[error("Folder {spec} could not be resolved")]
    Unresolved {
        /// Display form of the folder spec
        spec: String,
    },

    /// Deleting the storage root is never issued
    #[error("Refusing to delete the storage root")]
    RootDeletion,

    /// The origin content could not be opened or read
    #[error("Failed to read content for key '{key}': {message}")]
    Content {
        /// Key being read
        key: ContentKey,
        /// Underlying failure
        message: String,
    },

    /// A content store could not be opened
    #[error("Failed to open content store '{store}': {message}")]
    Store {
        /// Store name
        store: String,
        /// Underlying failure
        message: String,
    },

    /// Any other remote failure, propagated unchanged
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl OperationError {
    /// The wrapped remote error, if this is one
    #[must_use]
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            OperationError::Remote(e) => Some(e),
            _ => None,
        }
    }
}
