//! Run command - Execute the operations file
//!
//! Provides the `driveops run` CLI command which:
//! 1. Loads and validates the configuration and parses every operation
//! 2. Wires the Google Drive adapter and the local content stores
//! 3. Runs the operations in order under the wall-clock deadline
//! 4. Prints one line per completed operation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use driveops_core::config::Config;
use driveops_core::domain::{Operation, RunId};
use driveops_core::ports::{FanoutObserver, IRemoteStorage, ISyncObserver, TracingObserver};
use driveops_core::usecases::{OperationOutcome, OperationReport, RunReport};
use serde_json::json;
use tracing::{info, info_span, Instrument};

use crate::commands::{ensure_valid, load_config, operation_executor, remote_storage};
use crate::events::JsonLinesObserver;
use crate::output::{get_formatter, OutputFormat};

/// Run command options
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Run deadline in seconds, overriding `timeout_secs`
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Append a JSON line per engine event to this file
    #[arg(long)]
    pub events_file: Option<PathBuf>,

    /// Parse and validate the operations, print the plan, call nothing
    #[arg(long)]
    pub dry_run: bool,
}

impl RunCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let config = load_config(config_path)?;
        ensure_valid(&config)?;
        let operations = config.operations()?;
        info!(
            config_path = %config_path.display(),
            operations = operations.len(),
            "Loaded operations"
        );

        if self.dry_run {
            if format.is_json() {
                let plan: Vec<_> = operations
                    .iter()
                    .enumerate()
                    .map(|(index, operation)| plan_json(index, operation))
                    .collect();
                formatter.print_json(&json!({ "dry_run": true, "operations": plan }));
            } else {
                formatter.success(&format!(
                    "Dry run: {} operation{} parsed, nothing executed",
                    operations.len(),
                    plural(operations.len())
                ));
                for (index, operation) in operations.iter().enumerate() {
                    formatter.info(&plan_line(index, operation));
                }
            }
            return Ok(());
        }

        let timeout = self.deadline(&config)?;
        let run_id = RunId::new();
        let mut observer = FanoutObserver::new().with(Arc::new(TracingObserver));
        if let Some(path) = &self.events_file {
            observer = observer.with(Arc::new(JsonLinesObserver::create(path, run_id)?));
        }

        let report = run_operations(
            &config,
            remote_storage(&config),
            Arc::new(observer),
            &operations,
            timeout,
            run_id,
        )
        .await?;

        if format.is_json() {
            formatter.print_json(&json!({
                "run_id": run_id.to_string(),
                "files_created": report.files_created(),
                "files_updated": report.files_updated(),
                "operations": report.operations,
            }));
        } else {
            formatter.success(&format!(
                "Ran {} operation{} ({} created, {} updated)",
                report.operations.len(),
                plural(report.operations.len()),
                report.files_created(),
                report.files_updated()
            ));
            for operation in &report.operations {
                formatter.info(&report_line(operation));
            }
        }

        Ok(())
    }

    fn deadline(&self, config: &Config) -> Result<Duration> {
        match self.timeout_secs {
            Some(0) => bail!("--timeout-secs must be greater than zero"),
            Some(seconds) => Ok(Duration::from_secs(seconds)),
            None => Ok(Duration::from_secs(config.timeout_secs)),
        }
    }
}

/// Executes `operations` against `storage`, abandoning the run at `timeout`
pub async fn run_operations(
    config: &Config,
    storage: Arc<dyn IRemoteStorage>,
    observer: Arc<dyn ISyncObserver>,
    operations: &[Operation],
    timeout: Duration,
    run_id: RunId,
) -> Result<RunReport> {
    let executor = operation_executor(config, storage, observer);
    let span = info_span!("run", run_id = %run_id);

    let run = executor.execute_all(operations).instrument(span);
    match tokio::time::timeout(timeout, run).await {
        Ok(report) => Ok(report?),
        Err(_) => bail!("Run timed out after {} seconds", timeout.as_secs()),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn plan_line(index: usize, operation: &Operation) -> String {
    match operation {
        Operation::CopyFiles {
            source,
            destination,
        } => format!(
            "#{index} {} {destination} ({} file{} from store '{}')",
            operation.kind(),
            source.files.len(),
            plural(source.files.len()),
            source.store.id
        ),
        Operation::DeleteFolder { target } => format!("#{index} {} {target}", operation.kind()),
    }
}

fn plan_json(index: usize, operation: &Operation) -> serde_json::Value {
    let mut value = json!({
        "index": index,
        "kind": operation.kind(),
        "target": operation.folder().to_string(),
    });
    if let Operation::CopyFiles { source, .. } = operation {
        value["store"] = json!(source.store.id);
        value["files"] = json!(source
            .files
            .iter()
            .map(|file| file.key.to_string())
            .collect::<Vec<_>>());
    }
    value
}

fn report_line(report: &OperationReport) -> String {
    let outcome = match &report.outcome {
        OperationOutcome::Copied {
            folder_id,
            created,
            updated,
        } => format!("{created} created, {updated} updated in {folder_id}"),
        OperationOutcome::Deleted { folder_id } => format!("deleted {folder_id}"),
        OperationOutcome::AlreadyAbsent { folder_id } => format!("{folder_id} was already gone"),
        OperationOutcome::NotResolved { segment } => {
            format!("nothing to delete, '{segment}' not found")
        }
    };
    format!("#{} {} {}: {outcome}", report.index, report.kind, report.target)
}
