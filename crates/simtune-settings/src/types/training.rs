//! Backbone, data, trainer, and optimizer settings.

use serde::{Deserialize, Serialize};

/// Pretrained encoder the job fine-tunes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackboneSettings {
    /// Hugging Face model identifier (also used for the tokenizer).
    pub model: String,
    /// Embedding dimensionality produced by the backbone.
    pub dimensions: usize,
}

impl Default for BackboneSettings {
    fn default() -> Self {
        Self {
            // MiniLM-L12-H384, 33M parameters
            model: "microsoft/MiniLM-L12-H384-uncased".to_string(),
            dimensions: 384,
        }
    }
}

/// Dataset locations and batching.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSettings {
    /// Training CSV (may contain `~`).
    pub train_path: String,
    /// Validation CSV (may contain `~`).
    pub val_path: String,
    /// Training batch size.
    pub train_batch_size: usize,
    /// Validation batch size.
    pub val_batch_size: usize,
    /// Shuffle the training set every epoch.
    pub shuffle_train: bool,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            train_path: "~/data/yelp/train.csv".to_string(),
            val_path: "~/data/yelp/test.csv".to_string(),
            train_batch_size: 16,
            val_batch_size: 32,
            shuffle_train: true,
        }
    }
}

/// Trainer loop limits and the distributed setup declared to the orchestrator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainerSettings {
    /// Number of epochs.
    pub max_epochs: usize,
    /// Training batches per epoch (upper bound).
    pub limit_train_batches: usize,
    /// Validation batches per epoch (upper bound).
    pub limit_val_batches: usize,
    /// Distributed strategy name (`ddp`, ...).
    pub strategy: String,
    /// Floating-point precision in bits.
    pub precision: u8,
    /// Accelerator selection (`auto`, `gpu`, `cpu`).
    pub accelerator: String,
    /// Device selection (`auto` or a count).
    pub devices: String,
    /// Emit a step-level loss every N optimizer steps.
    pub log_every_n_steps: usize,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            max_epochs: 5,
            limit_train_batches: 100,
            limit_val_batches: 100,
            strategy: "ddp".to_string(),
            precision: 16,
            accelerator: "auto".to_string(),
            devices: "auto".to_string(),
            log_every_n_steps: 5,
        }
    }
}

/// When the learning-rate schedule advances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerInterval {
    /// After every optimizer step.
    Step,
    /// Once at the end of every epoch.
    #[default]
    Epoch,
}

/// `AdamW` hyper-parameters and linear warmup.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizerSettings {
    /// Peak learning rate.
    pub lr: f64,
    /// Decoupled weight decay.
    pub weight_decay: f64,
    /// Exponential decay rates for the moment estimates.
    pub betas: [f64; 2],
    /// Numerical stability term.
    pub eps: f64,
    /// Schedule steps of linear warmup before linear decay.
    pub warmup_steps: usize,
    /// Whether a schedule step is an optimizer step or an epoch.
    pub scheduler_interval: SchedulerInterval,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            lr: 5e-5,
            weight_decay: 0.001,
            betas: [0.9, 0.999],
            eps: 1e-8,
            warmup_steps: 5,
            scheduler_interval: SchedulerInterval::Epoch,
        }
    }
}
