//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the engine depends on,
//! but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStorage`] - Paged listing, create, update and delete on the remote API
//! - [`IContentSource`] / [`IContentProvider`] - Origin content read from keyed blob stores
//! - [`ISyncObserver`] - Structured event sink

pub mod content_provider;
pub mod observer;
pub mod remote_storage;

pub use content_provider::{IContentProvider, IContentSource};
pub use observer::{FanoutObserver, ISyncObserver, NoopObserver, SyncEvent, TracingObserver};
pub use remote_storage::{
    ByteStream, IRemoteStorage, ListPage, ListRequest, Media, RemoteError, RemoteItem,
    FOLDER_MIME_TYPE, ITEM_FIELDS,
};
