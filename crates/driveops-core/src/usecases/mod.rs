//! Use cases (interactors) for driveops
//!
//! This module contains the application use cases that orchestrate the
//! domain types and the port interfaces. Each layer is built on the one
//! before it.
//!
//! ## Use Cases
//!
//! - [`PaginatedLister`] - Cursor-driven listing with a page bound
//! - [`FolderResolver`] - Folder path resolution, optionally creating missing folders
//! - [`FileUpsert`] - Create-or-update of one file keyed by `(name, parent)`
//! - [`OperationExecutor`] - Sequential execution of copy and delete operations

pub mod error;
pub mod execute_operations;
pub mod list_paged;
pub mod query;
pub mod resolve_folder;
pub mod upsert_file;

pub use error::OperationError;
pub use execute_operations::{OperationExecutor, OperationOutcome, OperationReport, RunReport};
pub use list_paged::{ListingSettings, PaginatedLister, FILE_FIELDS, FOLDER_FIELDS};
pub use query::{build_query, ListingQuery, TrashedFilter};
pub use resolve_folder::{
    AmbiguityPolicy, FolderResolver, Resolution, ResolutionCache, ResolveMode,
};
pub use upsert_file::{FileUpsert, UpsertOutcome};
