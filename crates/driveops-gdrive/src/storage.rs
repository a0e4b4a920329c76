//! GoogleDriveStorage - IRemoteStorage implementation for the Drive v3 API
//!
//! Wraps a [`DriveClient`] and delegates to the [`files`](crate::files)
//! module to fulfil the [`IRemoteStorage`] port contract.
//!
//! ## Design Notes
//!
//! - The client is shared and immutable; token refresh lives behind its
//!   [`TokenSource`](crate::client::TokenSource), so no lock is needed here.
//! - Every failure is converted into a [`RemoteError`] at this boundary.

use async_trait::async_trait;
use driveops_core::domain::{RemoteId, ResourceMetadata};
use driveops_core::ports::{IRemoteStorage, ListPage, ListRequest, Media, RemoteError, RemoteItem};
use tracing::instrument;

use crate::client::DriveClient;
use crate::files;

/// Remote storage backed by Google Drive
#[derive(Clone)]
pub struct GoogleDriveStorage {
    client: DriveClient,
}

impl GoogleDriveStorage {
    pub fn new(client: DriveClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client
    pub fn client(&self) -> &DriveClient {
        &self.client
    }
}

#[async_trait]
impl IRemoteStorage for GoogleDriveStorage {
    #[instrument(skip(self, request), fields(page_token = ?request.page_token))]
    async fn list(&self, request: &ListRequest) -> Result<ListPage, RemoteError> {
        Ok(files::list(&self.client, request).await?)
    }

    #[instrument(skip(self, resource, media, fields), fields(name = ?resource.name()))]
    async fn create(
        &self,
        resource: ResourceMetadata,
        media: Option<Media>,
        fields: &str,
    ) -> Result<RemoteItem, RemoteError> {
        Ok(files::create(&self.client, &resource, media, fields).await?)
    }

    #[instrument(skip(self, resource, media, fields), fields(id = %id))]
    async fn update(
        &self,
        id: &RemoteId,
        resource: ResourceMetadata,
        media: Option<Media>,
        fields: &str,
    ) -> Result<RemoteItem, RemoteError> {
        Ok(files::update(&self.client, id, &resource, media, fields).await?)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &RemoteId) -> Result<(), RemoteError> {
        Ok(files::delete(&self.client, id).await?)
    }
}
