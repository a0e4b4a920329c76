//! Tracing subscriber setup
//!
//! Level precedence: `RUST_LOG`, then `-v`/`-vv`, then `logging.level`.
//! Records are written to stderr as text or JSON.

use driveops_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is unset
pub fn default_directive(verbose: u8, config: &LoggingConfig) -> String {
    match verbose {
        0 => config.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the global subscriber
pub fn init(verbose: u8, config: &LoggingConfig, format: Option<LogFormat>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, config)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format.unwrap_or(config.format) {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
