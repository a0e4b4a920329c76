//! Base directory of keyed blob stores
//!
//! [`LocalStoreRoot`] implements [`IContentSource`]: a store reference with id
//! `X` opens the directory `<root>/X`. Opened stores are kept for the life of
//! the root, so every copy operation of a run sees the listing taken when its
//! store was first opened.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use driveops_core::domain::StoreRef;
use driveops_core::ports::{IContentProvider, IContentSource};
use tracing::{debug, info};

use crate::blob_store::KeyedBlobStore;
use crate::StoreError;

/// Opens stores below one base directory
#[derive(Debug)]
pub struct LocalStoreRoot {
    root: PathBuf,
    opened: DashMap<String, Arc<KeyedBlobStore>>,
}

impl LocalStoreRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            opened: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding store `id`
    pub fn store_dir(&self, id: &str) -> Result<PathBuf, StoreError> {
        let trimmed = id.trim();
        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\'])
        {
            return Err(StoreError::InvalidStoreId(id.to_string()));
        }
        Ok(self.root.join(trimmed))
    }

    /// Open store `id`, reusing an earlier listing
    pub async fn open_store(&self, id: &str) -> Result<Arc<KeyedBlobStore>, StoreError> {
        let cached = self.opened.get(id).map(|entry| entry.value().clone());
        if let Some(store) = cached {
            debug!(store = id, "Reusing opened store");
            return Ok(store);
        }

        let store = Arc::new(KeyedBlobStore::open(id, self.store_dir(id)?).await?);
        info!(store = id, entries = store.entries().len(), "Opened content store");
        self.opened.insert(id.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl IContentSource for LocalStoreRoot {
    async fn open(&self, store: &StoreRef) -> anyhow::Result<Arc<dyn IContentProvider>> {
        let store: Arc<dyn IContentProvider> = self.open_store(&store.id).await?;
        Ok(store)
    }
}
