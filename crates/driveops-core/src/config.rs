//! Configuration module for driveops.
//!
//! Provides typed configuration structs that map to the YAML operations file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! The raw `operations` records are parsed into [`Operation`]s here, so every
//! configuration error surfaces before the first remote call.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{
    ContentKey, DomainError, FileSource, FolderSpec, FolderSpecInput, MediaOptions, Operation,
    OperationKind, ResourceMetadata, SourceFile, StoreRef,
};
use crate::usecases::{AmbiguityPolicy, ListingSettings};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for driveops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub drive: DriveConfig,
    pub listing: ListingConfig,
    pub resolution: ResolutionConfig,
    pub content: ContentConfig,
    pub logging: LoggingConfig,
    /// Wall-clock deadline of a whole run, in seconds.
    pub timeout_secs: u64,
    /// Named values referenced as `constants.NAME` from operation records.
    pub constants: Map<String, Value>,
    /// Raw operation records, parsed by [`Config::operations`].
    pub operations: Vec<Value>,
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Base URL of the API, overridable for tests.
    pub base_url: String,
    /// Environment variable holding the bearer token.
    pub access_token_env: String,
    /// Retries on rate-limited responses.
    pub max_retries: u32,
}

/// Paging settings of every listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: u32,
    pub max_pages: u32,
    pub spaces: String,
}

/// Folder resolution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub ambiguity: AmbiguityPolicy,
    /// Cache resolved folder paths for the whole run.
    pub memoize: bool,
}

/// Origin content settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Base directory of the keyed blob stores.
    pub root: PathBuf,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
    pub format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drive: DriveConfig::default(),
            listing: ListingConfig::default(),
            resolution: ResolutionConfig::default(),
            content: ContentConfig::default(),
            logging: LoggingConfig::default(),
            timeout_secs: 300,
            constants: Map::new(),
            operations: Vec::new(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com".to_string(),
            access_token_env: "DRIVEOPS_ACCESS_TOKEN".to_string(),
            max_retries: 5,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        let settings = ListingSettings::default();
        Self {
            page_size: settings.page_size,
            max_pages: settings.max_pages,
            spaces: settings.spaces,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./storage"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl From<&ListingConfig> for ListingSettings {
    fn from(config: &ListingConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_pages: config.max_pages,
            spaces: config.spaces.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML (or JSON) file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/driveops/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("driveops")
            .join("config.yaml")
    }

    /// Listing settings derived from the `listing` section.
    pub fn listing_settings(&self) -> ListingSettings {
        ListingSettings::from(&self.listing)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"listing.page_size"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest page size the remote accepts.
const MAX_PAGE_SIZE: u32 = 1000;

/// Upper bound on `drive.max_retries`.
const MAX_RETRIES_LIMIT: u32 = 20;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- listing ---
        if self.listing.page_size == 0 || self.listing.page_size > MAX_PAGE_SIZE {
            errors.push(ValidationError {
                field: "listing.page_size".into(),
                message: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }
        if self.listing.max_pages == 0 {
            errors.push(ValidationError {
                field: "listing.max_pages".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- drive ---
        if self.drive.max_retries > MAX_RETRIES_LIMIT {
            errors.push(ValidationError {
                field: "drive.max_retries".into(),
                message: format!("must be at most {MAX_RETRIES_LIMIT}"),
            });
        }
        if self.drive.base_url.trim().is_empty() {
            errors.push(ValidationError {
                field: "drive.base_url".into(),
                message: "must not be empty".into(),
            });
        }

        if self.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}', expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- operations ---
        if self.operations.is_empty() {
            errors.push(ValidationError {
                field: "operations".into(),
                message: "must contain at least one operation".into(),
            });
        }
        for (index, record) in self.operations.iter().enumerate() {
            if let Err(e) = self.parse_operation(record) {
                errors.push(ValidationError {
                    field: format!("operations[{index}]"),
                    message: e.to_string(),
                });
            }
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// Operation parsing
// ---------------------------------------------------------------------------

/// Source type of copy operations reading from a keyed blob store.
const KEY_VALUE_STORE: &str = "key-value-store";

/// Prefix of a folder value that names an entry of `constants`.
const CONSTANT_PREFIX: &str = "constants.";

/// Errors raised while turning raw operation records into [`Operation`]s.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The record's `type` is not a known operation
    #[error("Unknown operation type '{0}'")]
    UnknownOperationType(String),

    /// A required field is absent
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    /// The copy source is not a supported store kind
    #[error("Unknown source type '{0}', expected 'key-value-store'")]
    UnknownSourceType(String),

    /// A `constants.NAME` reference points nowhere
    #[error("Unknown constant '{0}'")]
    UnknownConstant(String),

    /// The folder spec failed validation
    #[error("Invalid folder: {0}")]
    InvalidFolder(#[from] DomainError),

    /// A field has the wrong shape
    #[error("Malformed {field}: {message}")]
    Malformed {
        /// Field being parsed
        field: &'static str,
        /// Deserializer message
        message: String,
    },

    /// Wraps any of the above with the position of the offending record
    #[error("Operation {index}: {source}")]
    AtOperation {
        index: usize,
        #[source]
        source: Box<ConfigError>,
    },
}

#[derive(Debug, Deserialize)]
struct RawOperation {
    #[serde(rename = "type")]
    kind: String,
    source: Option<Value>,
    destination: Option<Value>,
    folder: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(rename = "type")]
    kind: String,
    id: String,
    #[serde(default)]
    files: Vec<RawFile>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    key: ContentKey,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    options: RawFileOptions,
}

#[derive(Debug, Default, Deserialize)]
struct RawFileOptions {
    #[serde(default)]
    resource: ResourceMetadata,
    #[serde(default)]
    media: MediaOptions,
}

fn malformed(field: &'static str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Malformed {
        field,
        message: err.to_string(),
    }
}

impl Config {
    /// Parse every raw operation record, in order.
    ///
    /// Stops at the first invalid record; the error carries its index.
    pub fn operations(&self) -> Result<Vec<Operation>, ConfigError> {
        self.operations
            .iter()
            .enumerate()
            .map(|(index, record)| {
                self.parse_operation(record)
                    .map_err(|e| ConfigError::AtOperation {
                        index,
                        source: Box::new(e),
                    })
            })
            .collect()
    }

    /// Parse one raw operation record.
    pub fn parse_operation(&self, record: &Value) -> Result<Operation, ConfigError> {
        let raw: RawOperation =
            serde_json::from_value(record.clone()).map_err(|e| malformed("operation", e))?;

        match OperationKind::parse(&raw.kind) {
            Some(OperationKind::CopyFiles) => {
                let source = raw.source.ok_or(ConfigError::MissingField("source"))?;
                let destination = raw
                    .destination
                    .ok_or(ConfigError::MissingField("destination"))?;
                Ok(Operation::CopyFiles {
                    source: parse_source(source)?,
                    destination: self.folder_spec(&destination)?,
                })
            }
            Some(OperationKind::DeleteFolder) => {
                let folder = raw.folder.ok_or(ConfigError::MissingField("folder"))?;
                Ok(Operation::DeleteFolder {
                    target: self.folder_spec(&folder)?,
                })
            }
            None => Err(ConfigError::UnknownOperationType(raw.kind)),
        }
    }

    /// Parse a folder value: an inline object or a `constants.NAME` reference.
    pub fn folder_spec(&self, value: &Value) -> Result<FolderSpec, ConfigError> {
        let value = match value {
            Value::String(s) => {
                let name = s.strip_prefix(CONSTANT_PREFIX).ok_or_else(|| {
                    malformed(
                        "folder",
                        format!("expected an object or a constants reference, got '{s}'"),
                    )
                })?;
                self.constants
                    .get(name)
                    .ok_or_else(|| ConfigError::UnknownConstant(name.to_string()))?
            }
            other => other,
        };

        let input: FolderSpecInput =
            serde_json::from_value(value.clone()).map_err(|e| malformed("folder", e))?;
        Ok(FolderSpec::from_input(&input)?)
    }
}

fn parse_source(value: Value) -> Result<FileSource, ConfigError> {
    let raw: RawSource = serde_json::from_value(value).map_err(|e| malformed("source", e))?;
    if raw.kind != KEY_VALUE_STORE {
        return Err(ConfigError::UnknownSourceType(raw.kind));
    }

    let files = raw
        .files
        .into_iter()
        .map(|file| SourceFile {
            key: file.key,
            name: file.name,
            resource: file.options.resource,
            media: file.options.media,
        })
        .collect();

    Ok(FileSource {
        store: StoreRef { id: raw.id },
        files,
    })
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use driveops_core::config::ConfigBuilder;
/// use serde_json::json;
///
/// let config = ConfigBuilder::new()
///     .listing_page_size(100)
///     .logging_level("debug")
///     .operation(json!({
///         "type": "folders-delete",
///         "folder": {"parentFolderId": "root", "relativePath": "tmp"}
///     }))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- drive ---

    pub fn drive_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.drive.base_url = url.into();
        self
    }

    pub fn drive_access_token_env(mut self, var: impl Into<String>) -> Self {
        self.config.drive.access_token_env = var.into();
        self
    }

    pub fn drive_max_retries(mut self, n: u32) -> Self {
        self.config.drive.max_retries = n;
        self
    }

    // --- listing ---

    pub fn listing_page_size(mut self, n: u32) -> Self {
        self.config.listing.page_size = n;
        self
    }

    pub fn listing_max_pages(mut self, n: u32) -> Self {
        self.config.listing.max_pages = n;
        self
    }

    // --- resolution ---

    pub fn resolution_ambiguity(mut self, policy: AmbiguityPolicy) -> Self {
        self.config.resolution.ambiguity = policy;
        self
    }

    pub fn resolution_memoize(mut self, memoize: bool) -> Self {
        self.config.resolution.memoize = memoize;
        self
    }

    // --- content ---

    pub fn content_root(mut self, root: PathBuf) -> Self {
        self.config.content.root = root;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: LogFormat) -> Self {
        self.config.logging.format = format;
        self
    }

    // --- run ---

    pub fn timeout_secs(mut self, seconds: u64) -> Self {
        self.config.timeout_secs = seconds;
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.config.constants.insert(name.into(), value);
        self
    }

    pub fn operation(mut self, record: Value) -> Self {
        self.config.operations.push(record);
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
