//! The fine-tuning job: settings in, wired module and trainer out.
//!
//! [`TrainingJob`] is the declarative side of a run: which backbone, which
//! data, which loss, which optimizer. [`JobPlan`] is the serialisable form
//! an external orchestrator consumes (distributed strategy, precision,
//! callbacks, compute); simtune only runs the loop itself.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use simtune_core::{CosineEmbeddingLoss, LabelDomain, LossVariant};
use simtune_settings::types::{
    CallbackSettings, ComputeSettings, SchedulerInterval, SimtuneSettings, TrainerSettings,
};
use tracing::info;

use crate::data::TextDataset;
use crate::encoder::EmbeddingService;
use crate::errors::{Result, TrainError};
use crate::loader::DataLoader;
use crate::metrics::{MetricsWriter, warn_if_dir_not_empty};
use crate::module::{EmbeddingSimilarity, cosine_loss_fn};
use crate::optim::AdamWConfig;
use crate::trainer::{Backend, FitReport, LocalTrainer, TrainerConfig, TrainingLoop};

/// Serialisable job declaration for the orchestrator.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPlan {
    /// Job name.
    pub name: String,
    /// Seed for data order.
    pub seed: u64,
    /// Backbone model identifier.
    pub backbone: String,
    /// Tokenizer identifier (same repository as the backbone).
    pub tokenizer: String,
    /// Embedding dimensionality.
    pub dimensions: usize,
    /// Trainer declaration (strategy, precision, devices, limits).
    pub trainer: TrainerSettings,
    /// Optimizer hyper-parameters.
    pub optimizer: AdamWConfig,
    /// Linear warmup length.
    pub warmup_steps: usize,
    /// Whether the schedule advances per optimizer step or per epoch.
    pub scheduler_interval: SchedulerInterval,
    /// Loss variant.
    pub loss: LossVariant,
    /// Label domain.
    pub label_domain: LabelDomain,
    /// Early stopping and checkpoint declarations.
    pub callbacks: CallbackSettings,
    /// Compute request.
    pub compute: ComputeSettings,
    /// Paths the orchestrator should not upload.
    pub ignore: Vec<String>,
    /// Total optimizer steps, when the training set is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_stepping_batches: Option<usize>,
}

/// A configured fine-tuning job.
#[derive(Clone, Debug)]
pub struct TrainingJob {
    settings: SimtuneSettings,
    loss: CosineEmbeddingLoss,
}

impl TrainingJob {
    /// Validate settings and build the loss.
    pub fn from_settings(settings: SimtuneSettings) -> Result<Self> {
        let loss = CosineEmbeddingLoss::from_settings(&settings.loss)?;
        Ok(Self { settings, loss })
    }

    /// Settings the job was built from.
    pub fn settings(&self) -> &SimtuneSettings {
        &self.settings
    }

    /// Loss in use.
    pub fn loss(&self) -> &CosineEmbeddingLoss {
        &self.loss
    }

    /// Trainer loop limits.
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig::from_settings(&self.settings.trainer)
    }

    /// Load a CSV and wrap it in a loader seeded with the job seed.
    pub fn configure_data(
        &self,
        path: &str,
        batch_size: usize,
        shuffle: bool,
    ) -> Result<DataLoader> {
        let dataset = TextDataset::from_csv(path)?;
        Ok(DataLoader::new(
            Arc::new(dataset),
            batch_size,
            shuffle,
            self.settings.seed,
        ))
    }

    /// Training loader from settings.
    pub fn train_loader(&self) -> Result<DataLoader> {
        let d = &self.settings.data;
        self.configure_data(&d.train_path, d.train_batch_size, d.shuffle_train)
    }

    /// Validation loader from settings (never shuffled).
    pub fn val_loader(&self) -> Result<DataLoader> {
        let d = &self.settings.data;
        self.configure_data(&d.val_path, d.val_batch_size, false)
    }

    /// Pair the encoder with the job's loss and optimizer.
    ///
    /// Fails if the encoder's dimensionality differs from the backbone's.
    pub fn configure_module(
        &self,
        encoder: Arc<dyn EmbeddingService>,
    ) -> Result<EmbeddingSimilarity> {
        let expected = self.settings.backbone.dimensions;
        if encoder.dimensions() != expected {
            return Err(TrainError::Config(format!(
                "encoder produces {}-d vectors but backbone {} is {expected}-d",
                encoder.dimensions(),
                self.settings.backbone.model
            )));
        }
        Ok(EmbeddingSimilarity::new(
            encoder,
            cosine_loss_fn(self.loss),
            self.settings.optimizer.clone(),
        ))
    }

    /// Local trainer writing metrics under the configured directory.
    pub fn configure_trainer<B: Backend>(&self, backend: B) -> Result<LocalTrainer<B>> {
        let dir = Path::new(&self.settings.logging.metrics_dir);
        let _ = warn_if_dir_not_empty(dir);
        let writer = MetricsWriter::create(dir)?;
        Ok(LocalTrainer::new(self.trainer_config(), backend).with_metrics(writer))
    }

    /// Serialisable declaration of the whole job.
    pub fn plan(&self, train: Option<&DataLoader>) -> JobPlan {
        let s = &self.settings;
        JobPlan {
            name: s.name.clone(),
            seed: s.seed,
            backbone: s.backbone.model.clone(),
            tokenizer: s.backbone.model.clone(),
            dimensions: s.backbone.dimensions,
            trainer: s.trainer.clone(),
            optimizer: AdamWConfig::from_settings(&s.optimizer),
            warmup_steps: s.optimizer.warmup_steps,
            scheduler_interval: s.optimizer.scheduler_interval,
            loss: self.loss.variant(),
            label_domain: self.loss.label_domain(),
            callbacks: s.callbacks.clone(),
            compute: s.compute.clone(),
            ignore: vec![s.callbacks.checkpoint.dir.clone()],
            estimated_stepping_batches: train
                .map(|t| self.trainer_config().estimated_stepping_batches(t)),
        }
    }

    /// Load both datasets, wire the module, and fit.
    pub async fn run<B: Backend>(
        &self,
        encoder: Arc<dyn EmbeddingService>,
        backend: B,
    ) -> Result<FitReport> {
        let train = self.train_loader()?;
        let val = self.val_loader()?;
        let module = self.configure_module(encoder)?;
        let mut trainer = self.configure_trainer(backend)?;
        info!(
            name = %self.settings.name,
            seed = self.settings.seed,
            backbone = %self.settings.backbone.model,
            "running job"
        );
        trainer.fit(&module, &train, Some(&val)).await
    }
}
