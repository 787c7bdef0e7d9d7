//! # simtune-core
//!
//! Pairwise cosine-embedding similarity loss for sentence-similarity
//! fine-tuning.
//!
//! - [`loss::CosineEmbeddingLoss`]: margin or target-cosine loss over
//!   (a, b, label) triples, epsilon-guarded against zero norms
//! - [`pairing::pair_by_class`]: turns a class-labelled batch into pairs
//! - [`normalize`]: L2 norm, normalization, cosine similarity
//! - [`logging::init_subscriber`]: stderr `tracing` setup
//!
//! ## Crate Position
//!
//! Depends on simtune-settings.
//! Depended on by: simtune-train, simtune-cli.

#![deny(unsafe_code)]

pub mod errors;
pub mod logging;
pub mod loss;
pub mod normalize;
pub mod pairing;

pub use errors::{LossError, Result};
pub use loss::{CosineEmbeddingLoss, LabelDomain, LossVariant, Reduction};
pub use normalize::{cosine_similarity, l2_norm, l2_normalize};
pub use pairing::{PairBatch, pair_by_class, pairwise_cosine_embedding_loss};
