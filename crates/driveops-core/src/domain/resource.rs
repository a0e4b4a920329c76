//! Remote resource metadata
//!
//! [`ResourceMetadata`] is the JSON object sent as the metadata part of a
//! create or update call. Callers supply arbitrary fields (description,
//! properties, ...); the engine only ever touches `name`, `parents` and
//! `mimeType`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::newtypes::RemoteId;

/// JSON metadata of a remote file or folder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceMetadata(Map<String, Value>);

impl ResourceMetadata {
    /// Empty metadata
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `name` field, if it is a non-empty string
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Overwrite the `name` field
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.0.insert("name".to_string(), Value::String(name.into()));
    }

    /// The `mimeType` field, if present
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.0.get("mimeType").and_then(Value::as_str)
    }

    /// Overwrite the `mimeType` field
    pub fn set_mime_type(&mut self, mime_type: impl Into<String>) {
        self.0
            .insert("mimeType".to_string(), Value::String(mime_type.into()));
    }

    /// The `parents` field; entries that are not valid identifiers are skipped
    #[must_use]
    pub fn parents(&self) -> Vec<RemoteId> {
        self.0
            .get("parents")
            .and_then(Value::as_array)
            .map(|parents| {
                parents
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|p| RemoteId::new(p.to_string()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Overwrite the `parents` field
    pub fn set_parents(&mut self, parents: &[RemoteId]) {
        let parents = parents
            .iter()
            .map(|p| Value::String(p.to_string()))
            .collect();
        self.0.insert("parents".to_string(), Value::Array(parents));
    }

    /// Drop the `parents` field
    pub fn remove_parents(&mut self) {
        self.0.remove("parents");
    }

    /// Raw field access
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Raw field insertion
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Returns true if no fields are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON object
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ResourceMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Caller-supplied media options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaOptions {
    /// Content type of the uploaded bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}
