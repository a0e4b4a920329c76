//! Paginated listing use case
//!
//! Drives the remote `list` call cursor by cursor and accumulates the items
//! of every page, in emission order. This is the foundation both the folder
//! resolver and the file upsert are built on.
//!
//! ## Design Notes
//!
//! - An explicit loop holds the accumulator and the cursor; a page without a
//!   non-empty next cursor is terminal, even when it carries zero items.
//! - The number of `list` calls is bounded by
//!   [`ListingSettings::max_pages`]. Hitting the bound while the remote still
//!   returns cursors is an error rather than a silent truncation.

use std::sync::Arc;

use tracing::debug;

use crate::ports::{
    IRemoteStorage, ISyncObserver, ListPage, ListRequest, RemoteItem, SyncEvent,
};
use crate::usecases::error::OperationError;
use crate::usecases::query::{ListingQuery, TrashedFilter};

/// Field selector for file listings
pub const FILE_FIELDS: &str = "nextPageToken, files(*)";

/// Field selector for folder listings
pub const FOLDER_FIELDS: &str = "nextPageToken, files(id, name, parents)";

/// Paging parameters shared by every listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSettings {
    /// Items requested per page
    pub page_size: u32,
    /// Upper bound on `list` calls for one listing
    pub max_pages: u32,
    /// Storage spaces searched
    pub spaces: String,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_pages: 10_000,
            spaces: "drive".to_string(),
        }
    }
}

/// Use case for cursor-driven listing
#[derive(Clone)]
pub struct PaginatedLister {
    storage: Arc<dyn IRemoteStorage>,
    observer: Arc<dyn ISyncObserver>,
    settings: ListingSettings,
}

impl PaginatedLister {
    pub fn new(
        storage: Arc<dyn IRemoteStorage>,
        observer: Arc<dyn ISyncObserver>,
        settings: ListingSettings,
    ) -> Self {
        Self {
            storage,
            observer,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ListingSettings {
        &self.settings
    }

    /// List every page of `query`, mapping each page through `extract`
    ///
    /// # Errors
    /// Propagates remote errors unchanged; returns
    /// [`OperationError::PageLimitExceeded`] when the page bound is reached
    /// while a next cursor is still pending.
    pub async fn list_paged<T, F>(
        &self,
        query: &ListingQuery,
        fields: &str,
        mut extract: F,
    ) -> Result<Vec<T>, OperationError>
    where
        T: Send,
        F: FnMut(ListPage) -> Vec<T> + Send,
    {
        let mut request = ListRequest {
            query: query.build(),
            page_token: None,
            page_size: self.settings.page_size,
            fields: fields.to_string(),
            spaces: self.settings.spaces.clone(),
        };
        let mut accumulated = Vec::new();
        let mut page_count: u32 = 0;

        loop {
            let mut page = self.storage.list(&request).await?;
            page_count += 1;

            let next = page.next_page_token.take().filter(|t| !t.is_empty());
            self.observer.notify(&SyncEvent::PageFetched {
                page: page_count,
                items: page.items.len(),
                has_more: next.is_some(),
            });
            accumulated.extend(extract(page));

            match next {
                None => break,
                Some(_) if page_count >= self.settings.max_pages => {
                    return Err(OperationError::PageLimitExceeded {
                        max_pages: self.settings.max_pages,
                        query: request.query,
                    });
                }
                Some(token) => request.page_token = Some(token),
            }
        }

        debug!(
            query = %request.query,
            pages = page_count,
            items = accumulated.len(),
            "Listing complete"
        );
        Ok(accumulated)
    }

    /// List every item of `query` unchanged
    pub async fn list_items(
        &self,
        query: &ListingQuery,
        fields: &str,
    ) -> Result<Vec<RemoteItem>, OperationError> {
        self.list_paged(query, fields, |page| page.items).await
    }

    /// List non-folder items, optionally narrowed by an extra clause
    pub async fn list_files(
        &self,
        extra: Option<&str>,
    ) -> Result<Vec<RemoteItem>, OperationError> {
        let query = ListingQuery::files_excluding_folders(extra);
        self.list_items(&query, FILE_FIELDS).await
    }

    /// List folders matching `query`; the folder mime type is always enforced
    pub async fn list_folders(
        &self,
        query: ListingQuery,
    ) -> Result<Vec<RemoteItem>, OperationError> {
        let query = ListingQuery {
            mime_type: ListingQuery::folders().mime_type,
            ..query
        };
        self.list_items(&query, FOLDER_FIELDS).await
    }

    /// List untrashed folders directly under the storage root
    pub async fn list_root_folders(
        &self,
        extra: Option<&str>,
    ) -> Result<Vec<RemoteItem>, OperationError> {
        let mut query = ListingQuery::folders()
            .root_only(true)
            .trashed(TrashedFilter::Excluded);
        query.extra = extra.map(str::to_string);
        let folders = self.list_folders(query).await?;
        debug!(count = folders.len(), "Listed root folders");
        Ok(folders)
    }
}
