//! Domain error types
//!
//! This module defines validation errors raised while constructing domain
//! values. They surface as configuration errors: they are detected before any
//! remote call is made and are never retryable.

use thiserror::Error;

/// Errors that can occur while building domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote item identifier
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// Invalid origin-content key
    #[error("Invalid content key: {0}")]
    InvalidContentKey(String),

    /// The folder specification has no usable anchor
    #[error("Invalid folder spec: {0}")]
    InvalidFolderSpec(String),

    /// A relative path segment is empty or malformed
    #[error("Invalid path segment in '{path}': {reason}")]
    InvalidSegment {
        /// The relative path as supplied
        path: String,
        /// Why the segment was rejected
        reason: String,
    },

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}
