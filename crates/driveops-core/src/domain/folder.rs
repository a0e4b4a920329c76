//! Folder specifications
//!
//! A [`FolderSpec`] is the declarative description of a remote folder: an
//! [`Anchor`] (position 0 of the path) followed by the ordered child segments
//! of a slash-delimited relative path. It owns no remote state; resolving it
//! against the remote storage yields a [`ResolvedFolder`].
//!
//! ## Design Notes
//!
//! - Specs are validated once at construction and are immutable afterwards.
//! - [`FolderSpec::prefix_keys`] gives the normalized key of every resolution
//!   step, which is what the per-run resolution cache is keyed by.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::RemoteId;

/// Position 0 of a folder path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// The storage root
    Root,
    /// An explicit remote folder identifier, already resolved
    Id {
        /// The folder identifier
        id: RemoteId,
        /// Human-readable name carried along for display only
        label: Option<String>,
    },
    /// A named top-level folder to be matched (or created) under the root
    Named(String),
}

impl Anchor {
    /// Normalized key used for memoization
    ///
    /// `/` and `\\` inside names are escaped, so a key never reads as a
    /// deeper path.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Anchor::Root => "root".to_string(),
            Anchor::Id { id, .. } => format!("id:{}", escape_key_part(id.as_str())),
            Anchor::Named(name) => format!("name:{}", escape_key_part(name)),
        }
    }
}

fn escape_key_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for c in part.chars() {
        if c == '/' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Serialized form of a folder spec, as it appears in operation records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSpecInput {
    /// Explicit folder identifier; `"root"` addresses the storage root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder_id: Option<String>,
    /// Name of a top-level folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_folder_name: Option<String>,
    /// Slash-delimited path below the anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
}

/// Declarative description of a remote folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSpec {
    anchor: Anchor,
    segments: Vec<String>,
}

impl FolderSpec {
    /// Create a spec from an anchor and an optional relative path
    ///
    /// # Errors
    /// Returns error if a named anchor is blank, or if the relative path has a
    /// leading slash or an empty segment
    pub fn new(anchor: Anchor, relative_path: Option<&str>) -> Result<Self, DomainError> {
        if let Anchor::Named(name) = &anchor {
            if name.trim().is_empty() {
                return Err(DomainError::InvalidFolderSpec(
                    "Anchor folder name cannot be empty".to_string(),
                ));
            }
        }

        let segments = match relative_path {
            Some(path) if !path.trim().is_empty() => parse_segments(path)?,
            _ => Vec::new(),
        };

        Ok(Self { anchor, segments })
    }

    /// Spec anchored at the storage root
    pub fn under_root(relative_path: Option<&str>) -> Result<Self, DomainError> {
        Self::new(Anchor::Root, relative_path)
    }

    /// Spec anchored at a named top-level folder
    pub fn named(name: impl Into<String>, relative_path: Option<&str>) -> Result<Self, DomainError> {
        Self::new(Anchor::Named(name.into().trim().to_string()), relative_path)
    }

    /// Spec anchored at an explicit folder identifier
    pub fn with_id(id: RemoteId, relative_path: Option<&str>) -> Result<Self, DomainError> {
        let anchor = if id.is_root() {
            Anchor::Root
        } else {
            Anchor::Id { id, label: None }
        };
        Self::new(anchor, relative_path)
    }

    /// Build a spec from its serialized form
    ///
    /// An explicit `parentFolderId` wins over `parentFolderName`; the name is
    /// then kept as a display label.
    ///
    /// # Errors
    /// Returns error if neither anchor field is present, or if any part fails
    /// validation
    pub fn from_input(input: &FolderSpecInput) -> Result<Self, DomainError> {
        let name = input
            .parent_folder_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let id = input
            .parent_folder_id
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty());

        let anchor = match (id, name) {
            (Some(id), _) if id == RemoteId::ROOT_ALIAS => Anchor::Root,
            (Some(id), label) => Anchor::Id {
                id: RemoteId::new(id.to_string())?,
                label: label.map(str::to_string),
            },
            (None, Some(name)) => Anchor::Named(name.to_string()),
            (None, None) => {
                return Err(DomainError::InvalidFolderSpec(
                    "at least one of \"parentFolderId\" or \"parentFolderName\" is required"
                        .to_string(),
                ))
            }
        };

        Self::new(anchor, input.relative_path.as_deref())
    }

    /// The anchor at position 0
    #[must_use]
    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// Child segments below the anchor, in resolution order
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The relative path below the anchor, `None` for a single-level spec
    #[must_use]
    pub fn relative_path(&self) -> Option<String> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.segments.join("/"))
        }
    }

    /// Returns true if the folder spec addresses the storage root itself
    #[must_use]
    pub fn is_storage_root(&self) -> bool {
        matches!(self.anchor, Anchor::Root) && self.segments.is_empty()
    }

    /// Normalized key of every resolution step
    ///
    /// Element 0 is the anchor's key; element `i` is the key of the path up to
    /// and including segment `i - 1`.
    #[must_use]
    pub fn prefix_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.segments.len() + 1);
        let mut current = self.anchor.key();
        keys.push(current.clone());
        for segment in &self.segments {
            current.push('/');
            current.push_str(&escape_key_part(segment));
            keys.push(current.clone());
        }
        keys
    }

    /// Normalized key of the whole path
    #[must_use]
    pub fn key(&self) -> String {
        self.prefix_keys().pop().unwrap_or_default()
    }

    /// Serialized form of this spec
    #[must_use]
    pub fn to_input(&self) -> FolderSpecInput {
        let (parent_folder_id, parent_folder_name) = match &self.anchor {
            Anchor::Root => (Some(RemoteId::ROOT_ALIAS.to_string()), None),
            Anchor::Id { id, label } => (Some(id.to_string()), label.clone()),
            Anchor::Named(name) => (None, Some(name.clone())),
        };
        FolderSpecInput {
            parent_folder_id,
            parent_folder_name,
            relative_path: self.relative_path(),
        }
    }
}

fn parse_segments(path: &str) -> Result<Vec<String>, DomainError> {
    if path.starts_with('/') {
        return Err(DomainError::InvalidSegment {
            path: path.to_string(),
            reason: "relative path must not start with '/'".to_string(),
        });
    }

    path.split('/')
        .map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                Err(DomainError::InvalidSegment {
                    path: path.to_string(),
                    reason: "empty segment".to_string(),
                })
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}

impl Display for FolderSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Anchor::Root => write!(f, "{{root}}")?,
            Anchor::Id { id, label } => {
                write!(f, "{{{}::{}}}", label.as_deref().unwrap_or_default(), id)?
            }
            Anchor::Named(name) => write!(f, "{{{name}}}")?,
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// A folder spec together with the identifier it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFolder {
    /// Terminal folder identifier
    pub id: RemoteId,
    /// The folder spec that was resolved
    pub spec: FolderSpec,
}
