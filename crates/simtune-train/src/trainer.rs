//! Training-loop interface and a sequential local implementation.
//!
//! The loop owns epochs, batch limits, LR scheduling, and metric logging.
//! Applying a step to model parameters is the [`Backend`]'s job; the real
//! backend (distributed, mixed precision) is the external orchestrator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use simtune_settings::types::{SchedulerInterval, TrainerSettings};
use tracing::{Instrument, debug, info, info_span};

use crate::errors::Result;
use crate::loader::DataLoader;
use crate::metrics::MetricsWriter;
use crate::module::EmbeddingSimilarity;
use crate::schedule::LrScheduler;

/// Loop limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerConfig {
    /// Number of epochs.
    pub max_epochs: usize,
    /// Training batches per epoch (upper bound).
    pub limit_train_batches: usize,
    /// Validation batches per epoch (upper bound).
    pub limit_val_batches: usize,
    /// Log `train_loss_step` every N steps.
    pub log_every_n_steps: usize,
}

impl TrainerConfig {
    /// Copy loop limits out of trainer settings.
    pub fn from_settings(s: &TrainerSettings) -> Self {
        Self {
            max_epochs: s.max_epochs,
            limit_train_batches: s.limit_train_batches,
            limit_val_batches: s.limit_val_batches,
            log_every_n_steps: s.log_every_n_steps.max(1),
        }
    }

    /// Optimizer steps per epoch for a loader.
    ///
    /// Batches too small to pair are skipped by the loop and not counted.
    pub fn steps_per_epoch(&self, train: &DataLoader) -> usize {
        train.pairable_batches().min(self.limit_train_batches)
    }

    /// Optimizer steps over the whole run.
    pub fn estimated_stepping_batches(&self, train: &DataLoader) -> usize {
        self.steps_per_epoch(train) * self.max_epochs
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self::from_settings(&TrainerSettings::default())
    }
}

/// One optimizer step as seen by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Epoch (0-based).
    pub epoch: usize,
    /// Global step (0-based) before this update.
    pub global_step: usize,
    /// Batch loss.
    pub loss: f32,
    /// Scheduled learning rate for this update.
    pub lr: f64,
}

/// Applies loss-driven updates to the model.
pub trait Backend: Send {
    /// Apply one optimizer step.
    fn apply_step(&mut self, step: &StepRecord) -> Result<()>;
}

/// Backend that records steps and leaves the encoder untouched.
#[derive(Debug, Default)]
pub struct FrozenBackend {
    steps: Vec<StepRecord>,
}

impl FrozenBackend {
    /// Steps received so far.
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }
}

impl Backend for FrozenBackend {
    fn apply_step(&mut self, step: &StepRecord) -> Result<()> {
        self.steps.push(step.clone());
        Ok(())
    }
}

/// Per-epoch outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochSummary {
    /// Epoch (0-based).
    pub epoch: usize,
    /// Mean training loss, if any batch ran.
    pub train_loss: Option<f32>,
    /// Mean validation loss, if validation ran.
    pub val_loss: Option<f32>,
    /// Optimizer steps taken this epoch.
    pub steps: usize,
}

/// Outcome of a full fit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitReport {
    /// One entry per epoch.
    pub epochs: Vec<EpochSummary>,
    /// Total optimizer steps.
    pub global_steps: usize,
}

impl FitReport {
    /// Lowest validation loss across epochs.
    pub fn best_val_loss(&self) -> Option<f32> {
        self.epochs
            .iter()
            .filter_map(|e| e.val_loss)
            .min_by(f32::total_cmp)
    }
}

/// A training loop the similarity module is passed into.
#[async_trait]
pub trait TrainingLoop: Send {
    /// Run training (and validation, if a loader is given).
    async fn fit(
        &mut self,
        module: &EmbeddingSimilarity,
        train: &DataLoader,
        val: Option<&DataLoader>,
    ) -> Result<FitReport>;
}

/// Single-process, sequential training loop.
pub struct LocalTrainer<B: Backend> {
    config: TrainerConfig,
    backend: B,
    metrics: Option<MetricsWriter>,
}

impl<B: Backend> LocalTrainer<B> {
    /// Create a trainer without a metrics file.
    pub fn new(config: TrainerConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            metrics: None,
        }
    }

    /// Also append metrics to `writer`.
    #[must_use]
    pub fn with_metrics(mut self, writer: MetricsWriter) -> Self {
        self.metrics = Some(writer);
        self
    }

    /// Loop limits.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Backend (e.g. to inspect recorded steps).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mean validation loss over at most `limit_val_batches` batches.
    pub async fn validate(
        &mut self,
        module: &EmbeddingSimilarity,
        val: &DataLoader,
        epoch: usize,
        global_step: usize,
    ) -> Result<Option<f32>> {
        let mut losses = Vec::new();
        for batch in val.batches(0).iter().take(self.config.limit_val_batches) {
            if batch.len() < 2 {
                debug!(size = batch.len(), "skipping batch too small to pair");
                continue;
            }
            losses.push(module.validation_step(batch).await?);
        }
        let val_loss = mean(&losses);
        if let Some(v) = val_loss {
            info!(epoch, val_loss = v, batches = losses.len(), "validation");
            self.log_metric("val_loss", v, global_step, epoch)?;
        }
        Ok(val_loss)
    }

    fn log_metric(&mut self, name: &str, value: f32, step: usize, epoch: usize) -> Result<()> {
        match self.metrics.as_mut() {
            Some(w) => w.log(name, value, step, epoch),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<B: Backend> TrainingLoop for LocalTrainer<B> {
    async fn fit(
        &mut self,
        module: &EmbeddingSimilarity,
        train: &DataLoader,
        val: Option<&DataLoader>,
    ) -> Result<FitReport> {
        let total_steps = self.config.estimated_stepping_batches(train);
        let plan = module.configure_optimizers(total_steps);
        let interval = plan.interval;
        let mut scheduler = ScheduleDriver {
            scheduler: plan.schedule,
            interval,
        };
        let mut report = FitReport::default();
        info!(
            epochs = self.config.max_epochs,
            total_steps,
            ?interval,
            train_rows = train.dataset().len(),
            "fit started"
        );

        for epoch in 0..self.config.max_epochs {
            let span = info_span!("epoch", epoch);
            let summary = self
                .run_epoch(module, train, val, epoch, &mut scheduler, &mut report.global_steps)
                .instrument(span)
                .await?;
            scheduler.after_epoch();
            report.epochs.push(summary);
        }

        info!(
            global_steps = report.global_steps,
            best_val_loss = ?report.best_val_loss(),
            "fit finished"
        );
        Ok(report)
    }
}

impl<B: Backend> LocalTrainer<B> {
    async fn run_epoch(
        &mut self,
        module: &EmbeddingSimilarity,
        train: &DataLoader,
        val: Option<&DataLoader>,
        epoch: usize,
        scheduler: &mut ScheduleDriver<impl LrScheduler + Send>,
        global_step: &mut usize,
    ) -> Result<EpochSummary> {
        let mut losses = Vec::new();
        for batch in train.batches(epoch).iter().take(self.config.limit_train_batches) {
            if batch.len() < 2 {
                debug!(size = batch.len(), "skipping batch too small to pair");
                continue;
            }
            let loss = module.training_step(batch).await?;
            let record = StepRecord {
                epoch,
                global_step: *global_step,
                loss,
                lr: scheduler.lr(),
            };
            self.backend.apply_step(&record)?;
            scheduler.after_step();
            *global_step += 1;
            losses.push(loss);

            if *global_step % self.config.log_every_n_steps == 0 {
                self.log_metric("train_loss_step", loss, *global_step, epoch)?;
            }
        }

        let train_loss = mean(&losses);
        if let Some(v) = train_loss {
            self.log_metric("train_loss_epoch", v, *global_step, epoch)?;
        }

        let val_loss = match val {
            Some(v) => self.validate(module, v, epoch, *global_step).await?,
            None => None,
        };

        Ok(EpochSummary {
            epoch,
            train_loss,
            val_loss,
            steps: losses.len(),
        })
    }
}

/// A schedule plus the interval at which it advances.
struct ScheduleDriver<S> {
    scheduler: S,
    interval: SchedulerInterval,
}

impl<S: LrScheduler> ScheduleDriver<S> {
    fn lr(&self) -> f64 {
        self.scheduler.get_lr()
    }

    fn after_step(&mut self) {
        if self.interval == SchedulerInterval::Step {
            self.scheduler.step();
        }
    }

    fn after_epoch(&mut self) {
        if self.interval == SchedulerInterval::Epoch {
            self.scheduler.step();
        }
    }
}

fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|v| f64::from(*v)).sum();
    Some((sum / values.len() as f64) as f32)
}
