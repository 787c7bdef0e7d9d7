//! The embedding-similarity module: encoder plus pairwise loss.
//!
//! The loss is a plain function value, so the training loop can swap it
//! without subclassing anything.

use std::sync::Arc;

use simtune_core::{CosineEmbeddingLoss, pairwise_cosine_embedding_loss};
use simtune_settings::types::OptimizerSettings;
use tracing::{debug, instrument};

use crate::encoder::EmbeddingService;
use crate::errors::{EmbeddingError, Result};
use crate::loader::Batch;
use crate::optim::{AdamWConfig, OptimizerPlan};
use crate::schedule::LinearWarmupSchedule;

/// Loss over a class-labelled batch of embeddings.
pub type PairwiseLossFn =
    Arc<dyn Fn(&[Vec<f32>], &[i64]) -> simtune_core::Result<f32> + Send + Sync>;

/// Wrap a cosine-embedding loss with the class-pairing contract.
pub fn cosine_loss_fn(loss: CosineEmbeddingLoss) -> PairwiseLossFn {
    Arc::new(move |embeddings: &[Vec<f32>], classes: &[i64]| {
        pairwise_cosine_embedding_loss(&loss, embeddings, classes)
    })
}

/// Fine-tunes an encoder by minimizing a pairwise cosine loss.
///
/// Loosely based on Sentence-BERT (<https://arxiv.org/abs/1908.10084>).
pub struct EmbeddingSimilarity {
    encoder: Arc<dyn EmbeddingService>,
    loss_fn: PairwiseLossFn,
    optimizer: OptimizerSettings,
}

impl EmbeddingSimilarity {
    /// Create a module from an encoder, a loss function, and optimizer settings.
    pub fn new(
        encoder: Arc<dyn EmbeddingService>,
        loss_fn: PairwiseLossFn,
        optimizer: OptimizerSettings,
    ) -> Self {
        Self {
            encoder,
            loss_fn,
            optimizer,
        }
    }

    /// Encoder in use.
    pub fn encoder(&self) -> &Arc<dyn EmbeddingService> {
        &self.encoder
    }

    /// Loss for one training batch.
    #[instrument(skip_all, fields(batch = batch.len()))]
    pub async fn training_step(&self, batch: &Batch) -> Result<f32> {
        let loss = self.forward(batch).await?;
        debug!(loss, "training step");
        Ok(loss)
    }

    /// Loss for one validation batch.
    #[instrument(skip_all, fields(batch = batch.len()))]
    pub async fn validation_step(&self, batch: &Batch) -> Result<f32> {
        let loss = self.forward(batch).await?;
        debug!(loss, "validation step");
        Ok(loss)
    }

    /// `AdamW` plus linear warmup/decay over `estimated_stepping_batches`.
    ///
    /// The schedule length is always counted in optimizer steps; with an
    /// epoch interval it advances once per epoch and never reaches the end.
    pub fn configure_optimizers(&self, estimated_stepping_batches: usize) -> OptimizerPlan {
        OptimizerPlan {
            optimizer: AdamWConfig::from_settings(&self.optimizer),
            schedule: LinearWarmupSchedule::new(
                self.optimizer.lr,
                self.optimizer.warmup_steps,
                estimated_stepping_batches,
            ),
            interval: self.optimizer.scheduler_interval,
        }
    }

    async fn forward(&self, batch: &Batch) -> Result<f32> {
        let embeddings = self.encoder.embed(&batch.texts).await?;
        if embeddings.len() != batch.len() {
            return Err(EmbeddingError::Inference(format!(
                "encoder returned {} vectors for {} texts",
                embeddings.len(),
                batch.len()
            ))
            .into());
        }
        let expected = self.encoder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: bad.len(),
            }
            .into());
        }
        Ok((self.loss_fn)(&embeddings, &batch.labels)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::HashingEncoder;
    use crate::errors::TrainError;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use simtune_core::LossError;
    use simtune_settings::types::SchedulerInterval;

    fn module(encoder: Arc<dyn EmbeddingService>) -> EmbeddingSimilarity {
        EmbeddingSimilarity::new(
            encoder,
            cosine_loss_fn(CosineEmbeddingLoss::default()),
            OptimizerSettings::default(),
        )
    }

    fn batch(texts: &[&str], labels: &[i64]) -> Batch {
        Batch {
            texts: texts.iter().map(|t| (*t).to_string()).collect(),
            labels: labels.to_vec(),
        }
    }

    #[tokio::test]
    async fn identical_texts_same_class_zero_loss() {
        let m = module(Arc::new(HashingEncoder::new("test-model", 16)));
        let loss = m
            .training_step(&batch(&["same", "same"], &[4, 4]))
            .await
            .unwrap();
        assert!(loss.abs() < 1e-5);
    }

    #[tokio::test]
    async fn validation_matches_training() {
        let m = module(Arc::new(HashingEncoder::new("test-model", 16)));
        let b = batch(&["a", "b", "c", "d"], &[1, 2, 1, 3]);
        let t = m.training_step(&b).await.unwrap();
        let v = m.validation_step(&b).await.unwrap();
        assert_eq!(t, v);
    }

    #[tokio::test]
    async fn single_item_batch_is_invalid_input() {
        let m = module(Arc::new(HashingEncoder::new("test-model", 16)));
        let err = m.training_step(&batch(&["alone"], &[1])).await.unwrap_err();
        assert_matches!(err, TrainError::Loss(LossError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn not_ready_encoder_propagates() {
        let m = module(Arc::new(HashingEncoder::new("test-model", 16).unloaded()));
        let err = m.training_step(&batch(&["a", "b"], &[1, 1])).await.unwrap_err();
        assert_matches!(err, TrainError::Embedding(EmbeddingError::NotReady));
    }

    #[tokio::test]
    async fn blank_review_fails_the_step() {
        let m = module(Arc::new(HashingEncoder::new("test-model", 16)));
        let err = m
            .validation_step(&batch(&["tasty", "", "bland", "ok"], &[5, 1, 1, 5]))
            .await
            .unwrap_err();
        assert_matches!(err, TrainError::Embedding(EmbeddingError::EmptyText { index: 1 }));
    }

    struct WrongDims;

    #[async_trait]
    impl EmbeddingService for WrongDims {
        async fn embed(
            &self,
            texts: &[String],
        ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0; 3]).collect())
        }
        fn is_ready(&self) -> bool {
            true
        }
        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn wrong_dimensions_rejected() {
        let m = module(Arc::new(WrongDims));
        let err = m.training_step(&batch(&["a", "b"], &[1, 1])).await.unwrap_err();
        assert_matches!(
            err,
            TrainError::Embedding(EmbeddingError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[tokio::test]
    async fn custom_loss_fn_is_used() {
        let m = EmbeddingSimilarity::new(
            Arc::new(HashingEncoder::new("test-model", 8)),
            Arc::new(|emb: &[Vec<f32>], _: &[i64]| Ok::<f32, LossError>(emb.len() as f32)),
            OptimizerSettings::default(),
        );
        let loss = m.training_step(&batch(&["a", "b", "c"], &[0, 0, 0])).await.unwrap();
        assert_eq!(loss, 3.0);
    }

    #[test]
    fn configure_optimizers_uses_settings() {
        let m = module(Arc::new(HashingEncoder::new("test-model", 8)));
        let plan = m.configure_optimizers(500);
        assert_eq!(plan.optimizer.lr, 5e-5);
        assert_eq!(plan.schedule.total_steps(), 500);
        assert_eq!(plan.schedule.lr_at(5), 5e-5);
        assert_eq!(plan.interval, SchedulerInterval::Epoch);
    }
}
