//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]`. Each type implements
//! [`Default`] with the job's production values, and `#[serde(default)]`
//! allows partial JSON: missing fields keep their default.

mod callbacks;
mod loss;
mod training;

pub use callbacks::*;
pub use loss::*;
pub use training::*;

use serde::{Deserialize, Serialize};

/// Root settings type for a simtune job.
///
/// ```json
/// {
///   "seed": 42,
///   "data": { "trainBatchSize": 8 },
///   "loss": { "margin": 0.5 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimtuneSettings {
    /// Settings schema version.
    pub version: String,
    /// Job name.
    pub name: String,
    /// Seed threaded into data shuffling.
    pub seed: u64,
    /// Pretrained encoder.
    pub backbone: BackboneSettings,
    /// Datasets and batching.
    pub data: DataSettings,
    /// Trainer loop limits and distributed declaration.
    pub trainer: TrainerSettings,
    /// Optimizer and schedule.
    pub optimizer: OptimizerSettings,
    /// Similarity loss.
    pub loss: LossSettings,
    /// Early stopping and checkpoint declarations.
    pub callbacks: CallbackSettings,
    /// Cloud compute request.
    pub compute: ComputeSettings,
    /// Logging and metrics output.
    pub logging: LoggingSettings,
}

impl Default for SimtuneSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "embedding-similarity".to_string(),
            seed: 777,
            backbone: BackboneSettings::default(),
            data: DataSettings::default(),
            trainer: TrainerSettings::default(),
            optimizer: OptimizerSettings::default(),
            loss: LossSettings::default(),
            callbacks: CallbackSettings::default(),
            compute: ComputeSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl SimtuneSettings {
    /// Clamp out-of-range values and correct broken invariants.
    ///
    /// Called automatically during loading. Bad values are corrected with
    /// a warning rather than rejected.
    pub fn validate(&mut self) {
        fn at_least_one(val: &mut usize, name: &str) {
            if *val == 0 {
                tracing::warn!("{name} must be at least 1, correcting");
                *val = 1;
            }
        }

        at_least_one(&mut self.data.train_batch_size, "train_batch_size");
        at_least_one(&mut self.data.val_batch_size, "val_batch_size");
        at_least_one(&mut self.trainer.log_every_n_steps, "log_every_n_steps");
        at_least_one(&mut self.backbone.dimensions, "dimensions");

        let loss = &mut self.loss;
        if !loss.margin.is_finite() {
            tracing::warn!("margin is not finite ({}), resetting to 0", loss.margin);
            loss.margin = 0.0;
        } else if !(-1.0..=1.0).contains(&loss.margin) {
            let clamped = loss.margin.clamp(-1.0, 1.0);
            tracing::warn!("margin out of range ({}), clamped to {clamped}", loss.margin);
            loss.margin = clamped;
        }
        if !loss.eps.is_finite() || loss.eps <= 0.0 {
            let fallback = LossSettings::default().eps;
            tracing::warn!("loss eps must be positive ({}), using {fallback}", loss.eps);
            loss.eps = fallback;
        }

        let opt = &mut self.optimizer;
        if !opt.lr.is_finite() || opt.lr <= 0.0 {
            let fallback = OptimizerSettings::default().lr;
            tracing::warn!("lr must be positive ({}), using {fallback}", opt.lr);
            opt.lr = fallback;
        }
        let default_betas = OptimizerSettings::default().betas;
        for (beta, fallback) in opt.betas.iter_mut().zip(default_betas) {
            if !beta.is_finite() {
                tracing::warn!("beta is not finite ({beta}), using {fallback}");
                *beta = fallback;
            } else if !(0.0..1.0).contains(beta) {
                let clamped = beta.clamp(0.0, 0.9999);
                tracing::warn!("beta out of range ({beta}), clamped to {clamped}");
                *beta = clamped;
            }
        }
    }
}
