//! Subcommands and the adapter wiring they share

pub mod completions;
pub mod config;
pub mod resolve;
pub mod run;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use driveops_core::config::Config;
use driveops_core::ports::{IRemoteStorage, ISyncObserver};
use driveops_core::usecases::{FolderResolver, OperationExecutor, ResolutionCache};
use driveops_gdrive::{DriveClient, EnvToken, GoogleDriveStorage};
use driveops_store::LocalStoreRoot;

/// Loads the configuration file, failing if it is missing or unparsable
pub fn load_config(path: &Path) -> Result<Config> {
    Config::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Fails with every validation error joined into one message
pub fn ensure_valid(config: &Config) -> Result<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    bail!("Invalid configuration: {}", messages.join("; "))
}

/// Google Drive adapter configured from the `drive` section
pub fn remote_storage(config: &Config) -> Arc<dyn IRemoteStorage> {
    let client = DriveClient::with_token_source(
        Arc::new(EnvToken::new(config.drive.access_token_env.clone())),
        config.drive.base_url.clone(),
    )
    .with_max_retries(config.drive.max_retries);
    Arc::new(GoogleDriveStorage::new(client))
}

/// Folder resolver honouring the `resolution` section
pub fn folder_resolver(
    config: &Config,
    storage: Arc<dyn IRemoteStorage>,
    observer: Arc<dyn ISyncObserver>,
) -> FolderResolver {
    let resolver = FolderResolver::new(storage, observer, config.listing_settings())
        .with_policy(config.resolution.ambiguity);
    if config.resolution.memoize {
        resolver.with_cache(Arc::new(ResolutionCache::new()))
    } else {
        resolver
    }
}

/// Operation executor wired to the given storage and the local content root
pub fn operation_executor(
    config: &Config,
    storage: Arc<dyn IRemoteStorage>,
    observer: Arc<dyn ISyncObserver>,
) -> OperationExecutor {
    let content = Arc::new(LocalStoreRoot::new(config.content.root.clone()));
    let executor = OperationExecutor::new(storage, content, observer, config.listing_settings())
        .with_policy(config.resolution.ambiguity);
    if config.resolution.memoize {
        executor.with_cache(Arc::new(ResolutionCache::new()))
    } else {
        executor
    }
}
