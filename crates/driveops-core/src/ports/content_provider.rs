//! Origin-content port (driven/secondary port)
//!
//! Copy operations read the bytes they upload from a keyed blob store. This
//! module defines the two traits the executor consumes:
//!
//! - [`IContentSource`] opens a named store
//! - [`IContentProvider`] reads keys out of one store
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at this boundary are adapter-specific
//!   and the executor only reports them.
//! - `display_name` is synchronous: stores index their keys when opened.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::newtypes::ContentKey;
use crate::domain::operation::StoreRef;
use crate::ports::remote_storage::ByteStream;

/// A keyed blob store
#[async_trait]
pub trait IContentProvider: Send + Sync {
    /// Stream the bytes stored under `key`
    async fn byte_stream(&self, key: &ContentKey) -> anyhow::Result<ByteStream>;

    /// Name to give the remote copy when the caller did not choose one
    fn display_name(&self, key: &ContentKey) -> String;
}

/// Opens keyed blob stores by reference
#[async_trait]
pub trait IContentSource: Send + Sync {
    /// Open (or reuse) the store named by `store`
    async fn open(&self, store: &StoreRef) -> anyhow::Result<Arc<dyn IContentProvider>>;
}
