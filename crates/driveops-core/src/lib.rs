//! driveops Core - Folder resolution and remote listing engine
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `FolderSpec`, `ResolvedFolder`, `FileDescriptor`, `Operation`
//! - **Use cases** - `PaginatedLister`, `FolderResolver`, `FileUpsert`, `OperationExecutor`
//! - **Port definitions** - Traits for adapters: `IRemoteStorage`, `IContentSource`, `ISyncObserver`
//! - **Configuration** - The YAML operations file and its validation
//!
//! # Architecture
//!
//! The domain module holds pure value types with no I/O. Ports define the
//! trait interfaces that adapter crates implement (`driveops-gdrive` for the
//! remote API, `driveops-store` for origin content). Use cases orchestrate the
//! domain through those ports.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
