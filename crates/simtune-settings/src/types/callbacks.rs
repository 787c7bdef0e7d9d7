//! Orchestrator-side declarations: callbacks, compute, logging.
//!
//! These sections are carried in the job plan and consumed by the external
//! orchestrator; simtune itself does not stop early or write checkpoints.

use serde::{Deserialize, Serialize};

/// Whether a monitored metric should go down or up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MonitorMode {
    /// Lower is better.
    #[default]
    Min,
    /// Higher is better.
    Max,
}

/// Early-stopping declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EarlyStoppingSettings {
    /// Metric name.
    pub monitor: String,
    /// Minimum change that counts as improvement.
    pub min_delta: f64,
    /// Direction of improvement.
    pub mode: MonitorMode,
    /// Validation rounds without improvement before stopping.
    pub patience: usize,
    /// Log stop decisions.
    pub verbose: bool,
}

impl Default for EarlyStoppingSettings {
    fn default() -> Self {
        Self {
            monitor: "val_loss".to_string(),
            min_delta: 0.0,
            mode: MonitorMode::Min,
            patience: 3,
            verbose: true,
        }
    }
}

/// Top-k checkpoint declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckpointSettings {
    /// Metric name.
    pub monitor: String,
    /// Direction of improvement.
    pub mode: MonitorMode,
    /// Number of best checkpoints kept.
    pub save_top_k: usize,
    /// Checkpoint directory (excluded from uploads).
    pub dir: String,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            monitor: "val_loss".to_string(),
            mode: MonitorMode::Min,
            save_top_k: 3,
            dir: "checkpoints".to_string(),
        }
    }
}

/// Callback declarations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallbackSettings {
    /// Early stopping.
    pub early_stopping: EarlyStoppingSettings,
    /// Model checkpointing.
    pub checkpoint: CheckpointSettings,
}

/// Cloud compute request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputeSettings {
    /// Machine profile name.
    pub name: String,
    /// Disk size in GB.
    pub disk_size_gb: u32,
}

impl Default for ComputeSettings {
    fn default() -> Self {
        Self {
            name: "gpu-fast".to_string(),
            disk_size_gb: 50,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory receiving `metrics.jsonl`.
    pub metrics_dir: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            metrics_dir: ".".to_string(),
        }
    }
}
