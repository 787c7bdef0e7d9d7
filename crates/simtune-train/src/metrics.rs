//! Scalar metric sink: JSON lines on disk plus `tracing` events.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::Result;

/// File name written inside the metrics directory.
pub const METRICS_FILE: &str = "metrics.jsonl";

/// One logged scalar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Metric name (`train_loss_step`, `train_loss_epoch`, `val_loss`).
    pub name: String,
    /// Value.
    pub value: f32,
    /// Global optimizer step at logging time.
    pub step: usize,
    /// Epoch at logging time.
    pub epoch: usize,
    /// Wall-clock time.
    pub timestamp: DateTime<Utc>,
}

/// Appends metric records to `<dir>/metrics.jsonl`.
pub struct MetricsWriter {
    path: PathBuf,
    file: File,
}

impl MetricsWriter {
    /// Open (or create) the metrics file inside `dir`.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(METRICS_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Path of the metrics file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a scalar.
    pub fn log(&mut self, name: &str, value: f32, step: usize, epoch: usize) -> Result<()> {
        let record = MetricRecord {
            name: name.to_string(),
            value,
            step,
            epoch,
            timestamp: Utc::now(),
        };
        info!(metric = name, value, step, epoch, "metric");
        serde_json::to_writer(&mut self.file, &record)?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }
}

/// Read every record from a metrics file.
pub fn read_metrics(path: &Path) -> Result<Vec<MetricRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Warn when `dir` already holds files from an earlier run.
///
/// Returns whether anything was found. A missing directory counts as empty.
pub fn warn_if_dir_not_empty(dir: &Path) -> bool {
    let Ok(mut entries) = std::fs::read_dir(dir) else {
        return false;
    };
    let occupied = entries.next().is_some();
    if occupied {
        warn!(
            dir = %dir.display(),
            "metrics directory is not empty; new metrics will be appended to earlier runs"
        );
    }
    occupied
}
