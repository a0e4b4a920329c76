//! driveops-store - Local keyed blob stores
//!
//! Implements the origin-content ports of `driveops-core` on top of the local
//! filesystem. A store is a directory `<root>/<store id>`; its keys are the
//! names (or name stems) of the regular files directly inside it.
//!
//! ## Modules
//!
//! - [`blob_store`] - [`KeyedBlobStore`], one opened store
//! - [`local_root`] - [`LocalStoreRoot`], opens stores under a base directory

pub mod blob_store;
pub mod local_root;

pub use blob_store::KeyedBlobStore;
pub use local_root::LocalStoreRoot;

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while opening or reading a keyed blob store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store identifier cannot name a directory under the root
    #[error("Invalid store id '{0}'")]
    InvalidStoreId(String),

    /// No directory exists for the store
    #[error("Store '{id}' not found at {}", path.display())]
    StoreNotFound {
        /// Store identifier
        id: String,
        /// Directory that was expected
        path: PathBuf,
    },

    /// No file matches the key
    #[error("Key '{key}' not found in store '{store}'")]
    KeyNotFound {
        /// Store identifier
        store: String,
        /// Requested key
        key: String,
    },

    /// Several files share the key as their stem
    #[error("Key '{key}' is ambiguous in store '{store}': {}", candidates.join(", "))]
    AmbiguousKey {
        /// Store identifier
        store: String,
        /// Requested key
        key: String,
        /// Matching file names
        candidates: Vec<String>,
    },

    /// Filesystem access failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
