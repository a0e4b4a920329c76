//! One opened keyed blob store
//!
//! The directory listing is taken once, when the store is opened. Key lookup
//! prefers a file named exactly like the key, then the single file whose stem
//! equals the key (`summary` finds `summary.json`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use driveops_core::domain::ContentKey;
use driveops_core::ports::{ByteStream, IContentProvider};
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

use crate::StoreError;

/// A directory of blobs addressed by key
#[derive(Debug, Clone)]
pub struct KeyedBlobStore {
    id: String,
    dir: PathBuf,
    /// Regular file names, sorted
    entries: Vec<String>,
}

impl KeyedBlobStore {
    /// Read the directory listing of `dir`
    pub async fn open(
        id: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let id = id.into();
        let dir = dir.into();
        let io_err = |source| StoreError::Io {
            path: dir.clone(),
            source,
        };

        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::StoreNotFound {
                    id,
                    path: dir.clone(),
                });
            }
            Err(e) => return Err(io_err(e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(io_err)? {
            if !entry.file_type().await.map_err(io_err)?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                entries.push(name.to_string());
            }
        }
        entries.sort();

        debug!(store = %id, dir = %dir.display(), entries = entries.len(), "Store opened");
        Ok(Self { id, dir, entries })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names in the store
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// File name stored under `key`
    pub fn lookup(&self, key: &ContentKey) -> Result<&str, StoreError> {
        let key = key.as_str();
        if let Some(exact) = self.entries.iter().find(|name| name.as_str() == key) {
            return Ok(exact.as_str());
        }

        let by_stem: Vec<&str> = self
            .entries
            .iter()
            .map(String::as_str)
            .filter(|name| Path::new(name).file_stem().and_then(|s| s.to_str()) == Some(key))
            .collect();

        match by_stem.as_slice() {
            [single] => Ok(*single),
            [] => Err(StoreError::KeyNotFound {
                store: self.id.clone(),
                key: key.to_string(),
            }),
            many => Err(StoreError::AmbiguousKey {
                store: self.id.clone(),
                key: key.to_string(),
                candidates: many.iter().map(|name| name.to_string()).collect(),
            }),
        }
    }
}

#[async_trait]
impl IContentProvider for KeyedBlobStore {
    #[instrument(skip(self), fields(store = %self.id, key = %key))]
    async fn byte_stream(&self, key: &ContentKey) -> anyhow::Result<ByteStream> {
        let path = self.dir.join(self.lookup(key)?);
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "Streaming blob");
        Ok(Box::pin(ReaderStream::new(file)))
    }

    fn display_name(&self, key: &ContentKey) -> String {
        self.lookup(key)
            .map(str::to_string)
            .unwrap_or_else(|_| key.to_string())
    }
}
