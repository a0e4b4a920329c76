//! Domain types for driveops
//!
//! This module contains the value types the engine works with:
//! - Newtypes for validated identifiers (`RemoteId`, `ContentKey`, `RunId`)
//! - Folder specifications and their resolved form
//! - File descriptors and the `Operation` union
//! - Resource metadata sent with create/update calls
//! - Domain-specific error types

pub mod errors;
pub mod folder;
pub mod newtypes;
pub mod operation;
pub mod resource;

// Re-export commonly used types
pub use errors::DomainError;
pub use folder::{Anchor, FolderSpec, FolderSpecInput, ResolvedFolder};
pub use newtypes::{ContentKey, RemoteId, RunId};
pub use operation::{
    FileDescriptor, FileSource, Operation, OperationKind, SourceFile, StoreRef,
    UpsertAction,
};
pub use resource::{MediaOptions, ResourceMetadata};
