//! # simtune-train
//!
//! Training-job wiring for sentence-similarity fine-tuning.
//!
//! - CSV `label,text` datasets and seeded, shuffling batch loaders
//! - [`EmbeddingService`] seam with a hashing stand-in encoder for dry runs
//! - [`EmbeddingSimilarity`]: encoder plus pairwise cosine loss
//! - `AdamW` config and linear warmup/decay schedule
//! - [`LocalTrainer`]: epochs, batch limits, validation, JSONL metrics
//! - [`TrainingJob`] / [`JobPlan`]: settings in, runnable job out
//!
//! ## Crate Position
//!
//! Depends on simtune-core, simtune-settings.
//! Depended on by: simtune-cli.

#![deny(unsafe_code)]

pub mod data;
pub mod encoder;
pub mod errors;
pub mod job;
pub mod loader;
pub mod metrics;
pub mod module;
pub mod optim;
pub mod schedule;
pub mod trainer;

pub use data::{TextDataset, TextExample};
pub use encoder::{EmbeddingService, HashingEncoder};
pub use errors::{EmbeddingError, Result, TrainError};
pub use job::{JobPlan, TrainingJob};
pub use loader::{Batch, DataLoader};
pub use metrics::{METRICS_FILE, MetricRecord, MetricsWriter, read_metrics, warn_if_dir_not_empty};
pub use module::{EmbeddingSimilarity, PairwiseLossFn, cosine_loss_fn};
pub use optim::{AdamWConfig, OptimizerPlan};
pub use schedule::{LinearWarmupSchedule, LrScheduler};
pub use trainer::{
    Backend, EpochSummary, FitReport, FrozenBackend, LocalTrainer, StepRecord, TrainerConfig,
    TrainingLoop,
};
