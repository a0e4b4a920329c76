//! File upsert use case
//!
//! Creates a file under its parent, or replaces the content of the file that
//! already carries the same name there. Identity is `(name, parent)` only;
//! content is never compared, so a re-run overwrites instead of duplicating.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::{FileDescriptor, UpsertAction};
use crate::ports::{IRemoteStorage, Media, RemoteItem, ITEM_FIELDS};
use crate::usecases::error::OperationError;
use crate::usecases::list_paged::PaginatedLister;
use crate::usecases::query::{any_parent, name_equals};

/// Result of one upsert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertOutcome {
    /// Item as returned by the remote
    pub item: RemoteItem,
    pub action: UpsertAction,
}

/// Use case for create-or-update of a single file
#[derive(Clone)]
pub struct FileUpsert {
    lister: PaginatedLister,
    storage: Arc<dyn IRemoteStorage>,
}

impl FileUpsert {
    pub fn new(lister: PaginatedLister, storage: Arc<dyn IRemoteStorage>) -> Self {
        Self { lister, storage }
    }

    /// Upload `media` as `descriptor`
    ///
    /// When several files already match, the first one in listing order is
    /// updated and the others are left alone.
    ///
    /// # Errors
    /// Listing and remote write failures propagate unchanged.
    pub async fn upsert(
        &self,
        descriptor: FileDescriptor,
        media: Media,
    ) -> Result<UpsertOutcome, OperationError> {
        let extra = existence_clause(&descriptor);
        let existing = self.lister.list_files(Some(&extra)).await?;

        let name = descriptor.name().to_string();
        let (mut resource, _) = descriptor.into_parts();

        match existing.into_iter().next() {
            Some(current) => {
                debug!(%name, file_id = %current.id, "Updating existing file");
                resource.remove_parents();
                resource.set_name(name);
                let item = self
                    .storage
                    .update(&current.id, resource, Some(media), ITEM_FIELDS)
                    .await?;
                Ok(UpsertOutcome {
                    item,
                    action: UpsertAction::Updated,
                })
            }
            None => {
                debug!(%name, "Creating new file");
                let item = self
                    .storage
                    .create(resource, Some(media), ITEM_FIELDS)
                    .await?;
                Ok(UpsertOutcome {
                    item,
                    action: UpsertAction::Created,
                })
            }
        }
    }
}

/// `name = '<name>' and ('<p1>' in parents or ...)`
fn existence_clause(descriptor: &FileDescriptor) -> String {
    let name = name_equals(descriptor.name());
    match any_parent(&descriptor.resource().parents()) {
        Some(parents) => format!("{name} and {parents}"),
        None => name,
    }
}
