//! driveops CLI - Declarative folder and file operations on Google Drive
//!
//! Provides commands for:
//! - Running an operations file (copy files into folders, delete folders)
//! - Validating the configuration
//! - Resolving a single folder spec
//! - Showing the effective configuration

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use driveops_core::config::{Config, LogFormat};

mod commands;
mod events;
mod logging;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, resolve::ResolveCommand,
    run::RunCommand, validate::ValidateCommand,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "driveops",
    version,
    about = "Resolve folder paths and copy or delete files on Google Drive"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log record format, overriding `logging.format`
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Execute every operation of the configuration
    Run(RunCommand),
    /// Validate the configuration and its operations
    Validate(ValidateCommand),
    /// Resolve one folder spec to its identifier
    Resolve(ResolveCommand),
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let logging = Config::load_or_default(&config_path).logging;
    logging::init(cli.verbose, &logging, cli.log_format.map(Into::into));

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let result = match &cli.command {
        Commands::Run(cmd) => cmd.execute(&config_path, format).await,
        Commands::Validate(cmd) => cmd.execute(&config_path, format).await,
        Commands::Resolve(cmd) => cmd.execute(&config_path, format).await,
        Commands::Config(cmd) => cmd.execute(&config_path, format).await,
        Commands::Completions(cmd) => cmd.execute(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            get_formatter(format).error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
