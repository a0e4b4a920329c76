//! Operations and file descriptors
//!
//! An [`Operation`] is one record of the operations file, parsed once at
//! startup. Operations are immutable and are executed strictly in the order
//! they were supplied.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::folder::FolderSpec;
use super::newtypes::{ContentKey, RemoteId};
use super::resource::{MediaOptions, ResourceMetadata};

/// Reference to a keyed blob store holding origin content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreRef {
    /// Store name
    pub id: String,
}

/// One file entry of a copy operation, before its destination is known
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Key of the origin content
    pub key: ContentKey,
    /// Optional target name
    pub name: Option<String>,
    /// Metadata defaults for the remote resource
    pub resource: ResourceMetadata,
    /// Media defaults for the upload
    pub media: MediaOptions,
}

impl SourceFile {
    /// Name given explicitly by the caller
    ///
    /// `resource.name` takes precedence over the entry's own `name`. Returns
    /// `None` when the display name must come from the content provider.
    #[must_use]
    pub fn explicit_name(&self) -> Option<&str> {
        self.resource
            .name()
            .or_else(|| self.name.as_deref().filter(|n| !n.is_empty()))
    }
}

/// Origin of the files copied by one operation
#[derive(Debug, Clone, PartialEq)]
pub struct FileSource {
    /// Store the keys are read from
    pub store: StoreRef,
    /// Files to copy
    pub files: Vec<SourceFile>,
}

/// A file ready to be upserted under a resolved parent
///
/// Constructed per copy operation and consumed once by the upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescriptor {
    key: ContentKey,
    name: String,
    parent: RemoteId,
    resource: ResourceMetadata,
    media: MediaOptions,
}

impl FileDescriptor {
    /// Merge the caller's defaults with the intended name and parent
    ///
    /// `name` and `parents` are always overwritten.
    #[must_use]
    pub fn new(source: &SourceFile, name: impl Into<String>, parent: RemoteId) -> Self {
        let name = name.into();
        let mut resource = source.resource.clone();
        resource.set_name(name.clone());
        resource.set_parents(std::slice::from_ref(&parent));
        Self {
            key: source.key.clone(),
            name,
            parent,
            resource,
            media: source.media.clone(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parent(&self) -> &RemoteId {
        &self.parent
    }

    #[must_use]
    pub fn resource(&self) -> &ResourceMetadata {
        &self.resource
    }

    #[must_use]
    pub fn media(&self) -> &MediaOptions {
        &self.media
    }

    /// Split into the metadata and media parts of the remote call
    #[must_use]
    pub fn into_parts(self) -> (ResourceMetadata, MediaOptions) {
        (self.resource, self.media)
    }
}

/// What an upsert did to the remote item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Discriminant of [`Operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    #[serde(rename = "files-copy")]
    CopyFiles,
    #[serde(rename = "folders-delete")]
    DeleteFolder,
}

impl OperationKind {
    /// Wire name used in the operations file
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::CopyFiles => "files-copy",
            OperationKind::DeleteFolder => "folders-delete",
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "files-copy" => Some(OperationKind::CopyFiles),
            "folders-delete" => Some(OperationKind::DeleteFolder),
            _ => None,
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One high-level operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Copy files into a folder, creating the folder path if missing
    CopyFiles {
        source: FileSource,
        destination: FolderSpec,
    },
    /// Delete a folder subtree if it exists
    DeleteFolder { target: FolderSpec },
}

impl Operation {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CopyFiles { .. } => OperationKind::CopyFiles,
            Operation::DeleteFolder { .. } => OperationKind::DeleteFolder,
        }
    }

    /// The folder the operation targets
    #[must_use]
    pub fn folder(&self) -> &FolderSpec {
        match self {
            Operation::CopyFiles { destination, .. } => destination,
            Operation::DeleteFolder { target } => target,
        }
    }
}
