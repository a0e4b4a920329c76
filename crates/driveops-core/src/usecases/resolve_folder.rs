//! Folder path resolution use case
//!
//! Turns a [`FolderSpec`] into a concrete remote folder identifier by walking
//! `[anchor, segment 1, segment 2, ...]` and looking each step up strictly
//! under the identifier resolved by the step before it.
//!
//! ## Design Notes
//!
//! - In [`ResolveMode::ReadOnly`] the walk stops at the first missing step and
//!   yields [`Resolution::NotFound`]; later segments are never queried.
//! - In [`ResolveMode::CreateIfMissing`] a missing step is created under its
//!   parent. A named anchor is created without a parent field, so it lands in
//!   the storage root.
//! - Duplicate names are settled by [`AmbiguityPolicy`]; the default takes the
//!   earliest match in listing order.
//! - With a [`ResolutionCache`] attached every resolved prefix is recorded.
//!   Misses are never cached, and deletes invalidate the deleted subtree.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Anchor, FolderSpec, RemoteId, ResolvedFolder, ResourceMetadata};
use crate::ports::{
    IRemoteStorage, ISyncObserver, RemoteItem, SyncEvent, FOLDER_MIME_TYPE, ITEM_FIELDS,
};
use crate::usecases::error::OperationError;
use crate::usecases::list_paged::{ListingSettings, PaginatedLister};
use crate::usecases::query::{in_parents, name_equals, ListingQuery};

// ============================================================================
// Policies and results
// ============================================================================

/// How duplicate folder names are settled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Earliest match in listing order
    #[default]
    FirstMatch,
    /// More than one match is an error
    ErrorOnAmbiguous,
    /// Named anchors are refused; segments behave as `ErrorOnAmbiguous`
    ByExplicitId,
}

/// Whether missing folders are created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    ReadOnly,
    CreateIfMissing,
}

/// Outcome of a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every step resolved
    Found(ResolvedFolder),
    /// Read-mode resolution stopped at `segment`
    NotFound { segment: String },
}

impl Resolution {
    /// The terminal identifier, if resolved
    #[must_use]
    pub fn id(&self) -> Option<&RemoteId> {
        match self {
            Resolution::Found(folder) => Some(&folder.id),
            Resolution::NotFound { .. } => None,
        }
    }

    #[must_use]
    pub fn into_found(self) -> Option<ResolvedFolder> {
        match self {
            Resolution::Found(folder) => Some(folder),
            Resolution::NotFound { .. } => None,
        }
    }
}

// ============================================================================
// ResolutionCache
// ============================================================================

/// Per-run memo of resolved path prefixes, keyed by normalized path
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<String, RemoteId>,
}

impl ResolutionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<RemoteId> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: impl Into<String>, id: RemoteId) {
        self.entries.insert(key.into(), id);
    }

    /// Forget a deleted folder and everything recorded below it
    ///
    /// Entries are dropped when their key equals or extends `key`, or when
    /// they extend any key that pointed at `id`.
    pub fn invalidate_folder(&self, key: &str, id: &RemoteId) {
        let mut roots: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value() == id)
            .map(|entry| entry.key().clone())
            .collect();
        roots.push(key.to_string());

        self.entries.retain(|k, _| {
            !roots
                .iter()
                .any(|root| k == root || k.starts_with(&format!("{root}/")))
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// FolderResolver
// ============================================================================

/// Use case for resolving (and optionally creating) folder paths
#[derive(Clone)]
pub struct FolderResolver {
    lister: PaginatedLister,
    storage: Arc<dyn IRemoteStorage>,
    observer: Arc<dyn ISyncObserver>,
    policy: AmbiguityPolicy,
    cache: Option<Arc<ResolutionCache>>,
}

impl FolderResolver {
    pub fn new(
        storage: Arc<dyn IRemoteStorage>,
        observer: Arc<dyn ISyncObserver>,
        settings: ListingSettings,
    ) -> Self {
        Self {
            lister: PaginatedLister::new(Arc::clone(&storage), Arc::clone(&observer), settings),
            storage,
            observer,
            policy: AmbiguityPolicy::default(),
            cache: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn policy(&self) -> AmbiguityPolicy {
        self.policy
    }

    #[must_use]
    pub fn cache(&self) -> Option<&Arc<ResolutionCache>> {
        self.cache.as_ref()
    }

    /// Resolve `spec` to its terminal folder identifier
    ///
    /// # Errors
    /// Remote failures propagate unchanged. The policy may raise
    /// [`OperationError::AmbiguousFolder`] or
    /// [`OperationError::ExplicitIdRequired`]. A read-mode miss is not an
    /// error.
    pub async fn resolve(
        &self,
        spec: &FolderSpec,
        mode: ResolveMode,
    ) -> Result<Resolution, OperationError> {
        debug!(folder = %spec, ?mode, "Resolving folder");
        let keys = spec.prefix_keys();

        let mut current = match spec.anchor() {
            Anchor::Root => RemoteId::root(),
            Anchor::Id { id, .. } => id.clone(),
            Anchor::Named(name) => {
                if self.policy == AmbiguityPolicy::ByExplicitId {
                    return Err(OperationError::ExplicitIdRequired {
                        spec: spec.to_string(),
                    });
                }
                match self.step(&keys[0], name, None, mode).await? {
                    Some(id) => id,
                    None => return Ok(self.not_found(spec, name)),
                }
            }
        };

        for (segment, key) in spec.segments().iter().zip(keys.iter().skip(1)) {
            match self.step(key, segment, Some(&current), mode).await? {
                Some(id) => current = id,
                None => return Ok(self.not_found(spec, segment)),
            }
        }

        self.observer.notify(&SyncEvent::FolderResolved {
            spec: spec.to_string(),
            folder_id: current.clone(),
        });
        Ok(Resolution::Found(ResolvedFolder {
            id: current,
            spec: spec.clone(),
        }))
    }

    /// Read-mode resolution
    pub async fn find(
        &self,
        spec: &FolderSpec,
    ) -> Result<Option<ResolvedFolder>, OperationError> {
        Ok(self
            .resolve(spec, ResolveMode::ReadOnly)
            .await?
            .into_found())
    }

    /// Write-mode resolution
    pub async fn ensure(&self, spec: &FolderSpec) -> Result<ResolvedFolder, OperationError> {
        self.resolve(spec, ResolveMode::CreateIfMissing)
            .await?
            .into_found()
            .ok_or_else(|| OperationError::Unresolved {
                spec: spec.to_string(),
            })
    }

    /// Resolve one step: cache, then lookup, then (maybe) create
    async fn step(
        &self,
        key: &str,
        name: &str,
        parent: Option<&RemoteId>,
        mode: ResolveMode,
    ) -> Result<Option<RemoteId>, OperationError> {
        if let Some(id) = self.cache.as_ref().and_then(|cache| cache.get(key)) {
            debug!(key, folder_id = %id, "Resolution cache hit");
            return Ok(Some(id));
        }

        let id = match self.lookup(name, parent).await? {
            Some(folder) => folder.id,
            None if mode == ResolveMode::CreateIfMissing => {
                self.create_folder(name, parent).await?
            }
            None => return Ok(None),
        };

        if let Some(cache) = &self.cache {
            cache.insert(key, id.clone());
        }
        Ok(Some(id))
    }

    /// Find the folder named `name` under `parent` (`None` = top level)
    async fn lookup(
        &self,
        name: &str,
        parent: Option<&RemoteId>,
    ) -> Result<Option<RemoteItem>, OperationError> {
        let query = match parent {
            None => ListingQuery::folders()
                .root_only(true)
                .with_extra(name_equals(name)),
            Some(parent) => ListingQuery::folders()
                .with_extra(format!("{} and {}", name_equals(name), in_parents(parent))),
        };

        let candidates: Vec<RemoteItem> = self
            .lister
            .list_folders(query)
            .await?
            .into_iter()
            .filter(|folder| folder.name == name)
            // Listings report the root's real id, never the alias.
            .filter(|folder| match parent {
                Some(parent) if !parent.is_root() => folder.parents.contains(parent),
                _ => true,
            })
            .collect();

        let parent_label =
            parent.map_or_else(|| RemoteId::ROOT_ALIAS.to_string(), ToString::to_string);
        self.select(name, &parent_label, candidates)
    }

    fn select(
        &self,
        name: &str,
        parent: &str,
        candidates: Vec<RemoteItem>,
    ) -> Result<Option<RemoteItem>, OperationError> {
        if candidates.len() > 1 {
            match self.policy {
                AmbiguityPolicy::FirstMatch => {
                    debug!(
                        name,
                        parent,
                        count = candidates.len(),
                        "Several folders match, using the first"
                    );
                }
                AmbiguityPolicy::ErrorOnAmbiguous | AmbiguityPolicy::ByExplicitId => {
                    return Err(OperationError::AmbiguousFolder {
                        name: name.to_string(),
                        parent: parent.to_string(),
                        count: candidates.len(),
                    });
                }
            }
        }
        Ok(candidates.into_iter().next())
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&RemoteId>,
    ) -> Result<RemoteId, OperationError> {
        let mut resource = ResourceMetadata::new();
        resource.set_name(name);
        resource.set_mime_type(FOLDER_MIME_TYPE);
        if let Some(parent) = parent {
            resource.set_parents(std::slice::from_ref(parent));
        }

        let folder = self.storage.create(resource, None, ITEM_FIELDS).await?;
        self.observer.notify(&SyncEvent::FolderCreated {
            name: name.to_string(),
            folder_id: folder.id.clone(),
            parent: parent.cloned(),
        });
        Ok(folder.id)
    }

    fn not_found(&self, spec: &FolderSpec, segment: &str) -> Resolution {
        self.observer.notify(&SyncEvent::FolderNotFound {
            spec: spec.to_string(),
            segment: segment.to_string(),
        });
        Resolution::NotFound {
            segment: segment.to_string(),
        }
    }
}
