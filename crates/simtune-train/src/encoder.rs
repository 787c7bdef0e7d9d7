//! Encoder seam used by the similarity module.
//!
//! The pretrained backbone and its tokenizer run outside this workspace.
//! [`EmbeddingSimilarity`](crate::module::EmbeddingSimilarity) only needs one
//! vector per text, every vector as wide as the backbone's hidden size.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use simtune_core::l2_normalize;
use simtune_settings::types::BackboneSettings;

use crate::errors::EmbeddingError;

/// Turns a batch of texts into embeddings.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// One vector per text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Whether the backbone weights are loaded.
    fn is_ready(&self) -> bool;

    /// Width of every returned vector.
    fn dimensions(&self) -> usize;
}

/// Deterministic stand-in for a backbone, for dry runs and tests.
///
/// A text maps to the unit vector spelled out by SHA-256 over the model id,
/// a block counter, and the text. Each digest fills 32 components; wider
/// backbones take further blocks.
#[derive(Clone, Debug)]
pub struct HashingEncoder {
    model: String,
    dimensions: usize,
    loaded: bool,
}

impl HashingEncoder {
    /// Encoder named `model` producing `dimensions`-wide vectors.
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model: model.into(),
            dimensions,
            loaded: true,
        }
    }

    /// Encoder matching the configured backbone.
    pub fn from_backbone(backbone: &BackboneSettings) -> Self {
        Self::new(backbone.model.clone(), backbone.dimensions)
    }

    /// Same encoder, reporting its weights as not loaded.
    #[must_use]
    pub fn unloaded(mut self) -> Self {
        self.loaded = false;
        self
    }

    /// Backbone identifier this encoder stands in for.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut v = Vec::with_capacity(self.dimensions);
        let mut block: u32 = 0;
        while v.len() < self.dimensions {
            let digest = Sha256::new()
                .chain_update(self.model.as_bytes())
                .chain_update(block.to_le_bytes())
                .chain_update(text.as_bytes())
                .finalize();
            let take = self.dimensions - v.len();
            v.extend(
                digest
                    .iter()
                    .take(take)
                    .map(|&b| f32::from(b as i8) / 128.0),
            );
            block += 1;
        }
        l2_normalize(&mut v);
        v
    }
}

#[async_trait]
impl EmbeddingService for HashingEncoder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if !self.loaded {
            return Err(EmbeddingError::NotReady);
        }
        if let Some(index) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::EmptyText { index });
        }
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }

    fn is_ready(&self) -> bool {
        self.loaded
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
