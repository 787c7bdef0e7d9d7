//! Batching over a [`TextDataset`].

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::data::TextDataset;

/// A batch of texts with their class labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    /// Input texts.
    pub texts: Vec<String>,
    /// Class label per text.
    pub labels: Vec<i64>,
}

impl Batch {
    /// Number of items.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Fixed-size batches, optionally reshuffled each epoch.
///
/// Shuffling is seeded with `seed + epoch`, so a given (seed, epoch) always
/// yields the same order. The final partial batch is kept.
#[derive(Clone, Debug)]
pub struct DataLoader {
    dataset: Arc<TextDataset>,
    batch_size: usize,
    shuffle: bool,
    seed: u64,
}

impl DataLoader {
    /// Create a loader. A zero batch size is treated as one.
    pub fn new(dataset: Arc<TextDataset>, batch_size: usize, shuffle: bool, seed: u64) -> Self {
        Self {
            dataset,
            batch_size: batch_size.max(1),
            shuffle,
            seed,
        }
    }

    /// Batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Underlying dataset.
    pub fn dataset(&self) -> &TextDataset {
        &self.dataset
    }

    /// Number of batches per epoch.
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Batches per epoch with at least two rows, the ones that can be paired.
    pub fn pairable_batches(&self) -> usize {
        let len = self.dataset.len();
        let full = if self.batch_size >= 2 {
            len / self.batch_size
        } else {
            0
        };
        full + usize::from(len % self.batch_size >= 2)
    }

    /// Item order for `epoch`.
    pub fn order(&self, epoch: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(epoch as u64));
            indices.shuffle(&mut rng);
        }
        indices
    }

    /// Materialize the batches for `epoch`.
    pub fn batches(&self, epoch: usize) -> Vec<Batch> {
        let examples = self.dataset.examples();
        self.order(epoch)
            .chunks(self.batch_size)
            .map(|chunk| Batch {
                texts: chunk.iter().map(|&i| examples[i].text.clone()).collect(),
                labels: chunk.iter().map(|&i| examples[i].label).collect(),
            })
            .collect()
    }
}
