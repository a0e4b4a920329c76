//! Sync observer port (driven/secondary port)
//!
//! The engine reports what it does as structured [`SyncEvent`]s pushed to an
//! [`ISyncObserver`] sink, instead of writing log lines from deep inside the
//! use cases. The CLI installs a [`TracingObserver`] and, optionally, a JSON
//! lines writer.
//!
//! ## Design Notes
//!
//! - Events are fire-and-forget; `notify` is synchronous and infallible.
//!   Sinks that can fail must swallow and log their own errors.
//! - Events borrow nothing from the engine, so sinks may keep them.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{OperationKind, RemoteId, UpsertAction};

// ============================================================================
// SyncEvent
// ============================================================================

/// Something the engine did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// An operation is about to run
    OperationStarted {
        index: usize,
        kind: OperationKind,
        target: String,
    },
    /// One page of a listing came back
    PageFetched {
        page: u32,
        items: usize,
        has_more: bool,
    },
    /// A folder spec resolved to an identifier
    FolderResolved { spec: String, folder_id: RemoteId },
    /// Read-mode resolution stopped at a missing segment
    FolderNotFound { spec: String, segment: String },
    /// A missing folder was created
    FolderCreated {
        name: String,
        folder_id: RemoteId,
        parent: Option<RemoteId>,
    },
    /// A file was uploaded
    FileCopied {
        name: String,
        file_id: RemoteId,
        action: UpsertAction,
    },
    /// A folder subtree was deleted
    FolderDeleted { folder_id: RemoteId },
    /// The remote reported the folder as already gone
    FolderAlreadyAbsent { folder_id: RemoteId },
    /// An operation completed successfully
    OperationFinished { index: usize, kind: OperationKind },
}

// ============================================================================
// ISyncObserver trait
// ============================================================================

/// Sink for [`SyncEvent`]s
pub trait ISyncObserver: Send + Sync {
    fn notify(&self, event: &SyncEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ISyncObserver for NoopObserver {
    fn notify(&self, _event: &SyncEvent) {}
}

/// Maps events to `tracing` records
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ISyncObserver for TracingObserver {
    fn notify(&self, event: &SyncEvent) {
        match event {
            SyncEvent::OperationStarted {
                index,
                kind,
                target,
            } => info!(index, %kind, %target, "Starting operation"),
            SyncEvent::PageFetched {
                page,
                items,
                has_more,
            } => debug!(page, items, has_more, "Fetched listing page"),
            SyncEvent::FolderResolved { spec, folder_id } => {
                debug!(%spec, %folder_id, "Folder resolved")
            }
            SyncEvent::FolderNotFound { spec, segment } => {
                info!(%spec, %segment, "Folder not found")
            }
            SyncEvent::FolderCreated {
                name,
                folder_id,
                parent,
            } => info!(
                %name,
                %folder_id,
                parent = parent.as_ref().map(RemoteId::as_str).unwrap_or("-"),
                "Folder created"
            ),
            SyncEvent::FileCopied {
                name,
                file_id,
                action,
            } => info!(%name, %file_id, ?action, "File copied"),
            SyncEvent::FolderDeleted { folder_id } => info!(%folder_id, "Folder deleted"),
            SyncEvent::FolderAlreadyAbsent { folder_id } => {
                warn!(%folder_id, "Couldn't delete folder because it doesn't exist")
            }
            SyncEvent::OperationFinished { index, kind } => {
                info!(index, %kind, "Operation finished")
            }
        }
    }
}

/// Forwards every event to several sinks, in order
#[derive(Default, Clone)]
pub struct FanoutObserver {
    sinks: Vec<Arc<dyn ISyncObserver>>,
}

impl FanoutObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn ISyncObserver>) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ISyncObserver for FanoutObserver {
    fn notify(&self, event: &SyncEvent) {
        for sink in &self.sinks {
            sink.notify(event);
        }
    }
}
