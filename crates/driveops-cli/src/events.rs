//! JSON-lines event sink
//!
//! Writes every [`SyncEvent`] of a run as one JSON object per line, stamped
//! with the run identifier and the wall-clock time it was observed at.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use driveops_core::domain::RunId;
use driveops_core::ports::{ISyncObserver, SyncEvent};
use serde_json::Value;
use tracing::warn;

/// Appends events to a file
pub struct JsonLinesObserver {
    run_id: RunId,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesObserver {
    /// Opens `path` for appending, creating it if needed
    pub fn create(path: &Path, run_id: RunId) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open events file {}", path.display()))?;
        Ok(Self {
            run_id,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    fn record(&self, event: &SyncEvent) -> Result<String> {
        let mut value = serde_json::to_value(event)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "timestamp".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
            map.insert("run_id".to_string(), Value::String(self.run_id.to_string()));
        }
        Ok(serde_json::to_string(&value)?)
    }
}

impl ISyncObserver for JsonLinesObserver {
    fn notify(&self, event: &SyncEvent) {
        let line = match self.record(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Could not serialize event");
                return;
            }
        };
        let Ok(mut writer) = self.writer.lock() else {
            warn!("Events file writer is poisoned");
            return;
        };
        if let Err(e) = writeln!(writer, "{line}").and_then(|()| writer.flush()) {
            warn!(error = %e, "Could not write event");
        }
    }
}
