//! Resolve command - Look up (or create) one folder spec
//!
//! The folder is given either as a JSON object in the operations-file form
//! (`{"parentFolderName": "Reports", "relativePath": "2024/q1"}`) or as a
//! `constants.NAME` reference into the loaded configuration.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use driveops_core::config::Config;
use driveops_core::ports::TracingObserver;
use driveops_core::usecases::{Resolution, ResolveMode};
use serde_json::{json, Value};
use tracing::info;

use crate::commands::{folder_resolver, load_config, remote_storage};
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct ResolveCommand {
    /// Folder spec as JSON, or `constants.NAME`
    pub folder: String,

    /// Create missing folders instead of stopping at the first one
    #[arg(long)]
    pub create: bool,
}

impl ResolveCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let config = if config_path.exists() {
            load_config(config_path)?
        } else {
            Config::default()
        };

        let spec = config.folder_spec(&parse_folder_arg(&self.folder)?)?;
        let mode = if self.create {
            ResolveMode::CreateIfMissing
        } else {
            ResolveMode::ReadOnly
        };
        info!(folder = %spec, ?mode, "Resolving folder");

        let resolver =
            folder_resolver(&config, remote_storage(&config), Arc::new(TracingObserver));
        let resolution = resolver.resolve(&spec, mode).await?;

        match (&resolution, format.is_json()) {
            (Resolution::Found(folder), true) => formatter.print_json(&json!({
                "folder": spec.to_string(),
                "found": true,
                "folder_id": folder.id,
            })),
            (Resolution::Found(folder), false) => {
                formatter.success(&format!("{spec} resolves to {}", folder.id));
            }
            (Resolution::NotFound { segment }, true) => formatter.print_json(&json!({
                "folder": spec.to_string(),
                "found": false,
                "missing_segment": segment,
            })),
            (Resolution::NotFound { segment }, false) => {
                formatter.warn(&format!("{spec} not found ('{segment}' is missing)"));
            }
        }

        Ok(())
    }
}

/// JSON objects are parsed, anything else is taken as a string reference
fn parse_folder_arg(arg: &str) -> Result<Value> {
    let trimmed = arg.trim();
    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).context("Folder argument is not valid JSON")
    } else {
        Ok(Value::String(trimmed.to_string()))
    }
}
