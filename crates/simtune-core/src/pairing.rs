//! Pairing contract for class-labelled batches.
//!
//! A batch of `n` embeddings with class labels becomes `n / 2` pairs: item
//! `i` is paired with item `i + n / 2`. A pair is similar when both items
//! carry the same class. With an odd `n` the last item is left unpaired.

use crate::errors::{LossError, Result};
use crate::loss::CosineEmbeddingLoss;

/// Borrowed (a, b, label) triples ready for [`CosineEmbeddingLoss::forward`].
#[derive(Clone, Debug, PartialEq)]
pub struct PairBatch<'a> {
    /// First member of each pair.
    pub a: Vec<&'a [f32]>,
    /// Second member of each pair.
    pub b: Vec<&'a [f32]>,
    /// Similarity label per pair.
    pub labels: Vec<f32>,
}

impl PairBatch<'_> {
    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Split a class-labelled batch into halves and label each pair.
///
/// `similar` and `dissimilar` are the label values of the target domain.
pub fn pair_by_class<'a>(
    embeddings: &'a [Vec<f32>],
    classes: &[i64],
    similar: f32,
    dissimilar: f32,
) -> Result<PairBatch<'a>> {
    if embeddings.len() != classes.len() {
        return Err(LossError::InvalidInput(format!(
            "{} embeddings but {} class labels",
            embeddings.len(),
            classes.len()
        )));
    }
    let half = embeddings.len() / 2;
    if half == 0 {
        return Err(LossError::InvalidInput(format!(
            "need at least two items to form a pair, got {}",
            embeddings.len()
        )));
    }

    if embeddings.len() % 2 == 1 {
        tracing::debug!(size = embeddings.len(), "odd batch, last item left unpaired");
    }

    let mut batch = PairBatch {
        a: Vec::with_capacity(half),
        b: Vec::with_capacity(half),
        labels: Vec::with_capacity(half),
    };
    for i in 0..half {
        let j = i + half;
        batch.a.push(embeddings[i].as_slice());
        batch.b.push(embeddings[j].as_slice());
        batch.labels.push(if classes[i] == classes[j] { similar } else { dissimilar });
    }
    Ok(batch)
}

/// Pair a class-labelled batch and apply the loss.
pub fn pairwise_cosine_embedding_loss(
    loss: &CosineEmbeddingLoss,
    embeddings: &[Vec<f32>],
    classes: &[i64],
) -> Result<f32> {
    let pairs = pair_by_class(
        embeddings,
        classes,
        loss.similar_label(),
        loss.dissimilar_label(),
    )?;
    loss.forward(&pairs.a, &pairs.b, &pairs.labels)
}
