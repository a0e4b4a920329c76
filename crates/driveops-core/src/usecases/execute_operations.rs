//! Operation execution use case
//!
//! Runs a list of [`Operation`]s strictly in input order and stops at the
//! first failure. Earlier operations are not rolled back.
//!
//! ## Design Notes
//!
//! - The file upserts of one copy operation are joined with
//!   [`try_join_all`] on the current task. They are all in flight together,
//!   the first failure rejects the whole operation, and the remaining
//!   upserts are dropped.
//! - A delete whose target does not resolve, or that the remote reports as
//!   already gone, is a success.
//! - No retries happen here; the transport adapter owns retry policy.

use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{
    FileDescriptor, FileSource, FolderSpec, Operation, OperationKind, RemoteId, SourceFile,
    UpsertAction,
};
use crate::ports::{
    IContentProvider, IContentSource, IRemoteStorage, ISyncObserver, Media, SyncEvent,
};
use crate::usecases::error::OperationError;
use crate::usecases::list_paged::{ListingSettings, PaginatedLister};
use crate::usecases::resolve_folder::{
    AmbiguityPolicy, FolderResolver, Resolution, ResolutionCache, ResolveMode,
};
use crate::usecases::upsert_file::{FileUpsert, UpsertOutcome};

// ============================================================================
// Reports
// ============================================================================

/// What one operation ended up doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OperationOutcome {
    /// Files were upserted into `folder_id`
    Copied {
        folder_id: RemoteId,
        created: usize,
        updated: usize,
    },
    /// The folder subtree was deleted
    Deleted { folder_id: RemoteId },
    /// The remote reported the folder as already gone
    AlreadyAbsent { folder_id: RemoteId },
    /// The target did not resolve, nothing was deleted
    NotResolved { segment: String },
}

/// Report of one completed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    /// Position in the input list
    pub index: usize,
    pub kind: OperationKind,
    /// Display form of the targeted folder
    pub target: String,
    #[serde(flatten)]
    pub outcome: OperationOutcome,
}

/// Reports of every operation of a run, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub operations: Vec<OperationReport>,
}

impl RunReport {
    /// Files created across all copy operations
    #[must_use]
    pub fn files_created(&self) -> usize {
        self.copy_counts().0
    }

    /// Files updated in place across all copy operations
    #[must_use]
    pub fn files_updated(&self) -> usize {
        self.copy_counts().1
    }

    fn copy_counts(&self) -> (usize, usize) {
        self.operations
            .iter()
            .fold((0, 0), |(c, u), report| match report.outcome {
                OperationOutcome::Copied {
                    created, updated, ..
                } => (c + created, u + updated),
                _ => (c, u),
            })
    }
}

// ============================================================================
// OperationExecutor
// ============================================================================

/// Use case for running a sequence of operations
#[derive(Clone)]
pub struct OperationExecutor {
    resolver: FolderResolver,
    upsert: FileUpsert,
    storage: Arc<dyn IRemoteStorage>,
    content: Arc<dyn IContentSource>,
    observer: Arc<dyn ISyncObserver>,
}

impl OperationExecutor {
    pub fn new(
        storage: Arc<dyn IRemoteStorage>,
        content: Arc<dyn IContentSource>,
        observer: Arc<dyn ISyncObserver>,
        settings: ListingSettings,
    ) -> Self {
        let lister =
            PaginatedLister::new(Arc::clone(&storage), Arc::clone(&observer), settings.clone());
        Self {
            resolver: FolderResolver::new(Arc::clone(&storage), Arc::clone(&observer), settings),
            upsert: FileUpsert::new(lister, Arc::clone(&storage)),
            storage,
            content,
            observer,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.resolver = self.resolver.with_policy(policy);
        self
    }

    /// Memoize folder resolution for the lifetime of this executor
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.resolver = self.resolver.with_cache(cache);
        self
    }

    #[must_use]
    pub fn resolver(&self) -> &FolderResolver {
        &self.resolver
    }

    /// Run every operation in order
    ///
    /// # Errors
    /// Returns the first failure; operations after it are not attempted.
    pub async fn execute_all(
        &self,
        operations: &[Operation],
    ) -> Result<RunReport, OperationError> {
        let mut report = RunReport::default();
        for (index, operation) in operations.iter().enumerate() {
            report.operations.push(self.execute(index, operation).await?);
        }
        info!(
            operations = report.operations.len(),
            created = report.files_created(),
            updated = report.files_updated(),
            "All operations finished"
        );
        Ok(report)
    }

    /// Run a single operation
    pub async fn execute(
        &self,
        index: usize,
        operation: &Operation,
    ) -> Result<OperationReport, OperationError> {
        let kind = operation.kind();
        let target = operation.folder().to_string();
        self.observer.notify(&SyncEvent::OperationStarted {
            index,
            kind,
            target: target.clone(),
        });

        let outcome = match operation {
            Operation::CopyFiles {
                source,
                destination,
            } => self.copy_files(source, destination).await?,
            Operation::DeleteFolder { target } => self.delete_folder(target).await?,
        };

        self.observer
            .notify(&SyncEvent::OperationFinished { index, kind });
        Ok(OperationReport {
            index,
            kind,
            target,
            outcome,
        })
    }

    async fn copy_files(
        &self,
        source: &FileSource,
        destination: &FolderSpec,
    ) -> Result<OperationOutcome, OperationError> {
        let folder = self.resolver.ensure(destination).await?;
        let provider = self
            .content
            .open(&source.store)
            .await
            .map_err(|e| OperationError::Store {
                store: source.store.id.clone(),
                message: format!("{e:#}"),
            })?;

        let uploads = source
            .files
            .iter()
            .map(|file| self.copy_one(provider.as_ref(), file, &folder.id));
        let outcomes = try_join_all(uploads).await?;

        let created = outcomes
            .iter()
            .filter(|o| o.action == UpsertAction::Created)
            .count();
        Ok(OperationOutcome::Copied {
            folder_id: folder.id,
            created,
            updated: outcomes.len() - created,
        })
    }

    async fn copy_one(
        &self,
        provider: &dyn IContentProvider,
        file: &SourceFile,
        parent: &RemoteId,
    ) -> Result<UpsertOutcome, OperationError> {
        let name = file
            .explicit_name()
            .map_or_else(|| provider.display_name(&file.key), str::to_string);
        let body = provider
            .byte_stream(&file.key)
            .await
            .map_err(|e| OperationError::Content {
                key: file.key.clone(),
                message: format!("{e:#}"),
            })?;

        let descriptor = FileDescriptor::new(file, name, parent.clone());
        let media = Media::new(descriptor.media().mime_type.clone(), body);
        let outcome = self.upsert.upsert(descriptor, media).await?;

        self.observer.notify(&SyncEvent::FileCopied {
            name: outcome.item.name.clone(),
            file_id: outcome.item.id.clone(),
            action: outcome.action,
        });
        Ok(outcome)
    }

    async fn delete_folder(
        &self,
        target: &FolderSpec,
    ) -> Result<OperationOutcome, OperationError> {
        if target.is_storage_root() {
            return Err(OperationError::RootDeletion);
        }

        let folder = match self.resolver.resolve(target, ResolveMode::ReadOnly).await? {
            Resolution::Found(folder) => folder,
            Resolution::NotFound { segment } => {
                info!(folder = %target, %segment, "Folder not found, nothing to delete");
                return Ok(OperationOutcome::NotResolved { segment });
            }
        };

        let outcome = match self.storage.delete(&folder.id).await {
            Ok(()) => {
                self.observer.notify(&SyncEvent::FolderDeleted {
                    folder_id: folder.id.clone(),
                });
                OperationOutcome::Deleted {
                    folder_id: folder.id.clone(),
                }
            }
            Err(e) if e.is_not_found() => {
                self.observer.notify(&SyncEvent::FolderAlreadyAbsent {
                    folder_id: folder.id.clone(),
                });
                OperationOutcome::AlreadyAbsent {
                    folder_id: folder.id.clone(),
                }
            }
            Err(e) if e.is_permission_denied() => {
                warn!(folder_id = %folder.id, error = %e, "Permission denied deleting folder");
                return Err(OperationError::PermissionDenied {
                    folder_id: folder.id,
                    message: e.message(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(cache) = self.resolver.cache() {
            cache.invalidate_folder(&target.key(), &folder.id);
        }
        Ok(outcome)
    }
}
