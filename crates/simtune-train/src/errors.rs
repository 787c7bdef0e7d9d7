//! Training-job error types.

use simtune_core::LossError;
use thiserror::Error;

/// Errors from the encoder seam.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Inference failed.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Encoder returned vectors of the wrong size.
    #[error("Expected {expected}-d embeddings, got {actual}-d")]
    DimensionMismatch {
        /// Configured dimensionality.
        expected: usize,
        /// Dimensionality actually returned.
        actual: usize,
    },

    /// Service not ready (model not loaded).
    #[error("Embedding service not ready")]
    NotReady,

    /// A text had no content to tokenize.
    #[error("Text {index} in batch is empty")]
    EmptyText {
        /// Position of the text in the batch.
        index: usize,
    },
}

/// Errors from dataset loading, the training loop, and job assembly.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Loss computation failed.
    #[error("Loss error: {0}")]
    Loss(#[from] LossError),

    /// Encoder failed.
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Malformed dataset row.
    #[error("Data error at line {line}: {reason}")]
    Data {
        /// 1-based line where the offending record starts.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metric serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inconsistent job configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// The optimizer backend rejected a step.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result alias for training operations.
pub type Result<T> = std::result::Result<T, TrainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn error_display_variants() {
        let cases = vec![
            (
                TrainError::Data {
                    line: 7,
                    reason: "bad label".into(),
                },
                "Data error at line 7: bad label",
            ),
            (TrainError::Config("dims".into()), "Config error: dims"),
            (TrainError::Backend("nan grad".into()), "Backend error: nan grad"),
            (
                TrainError::Embedding(EmbeddingError::NotReady),
                "Embedding error: Embedding service not ready",
            ),
            (
                TrainError::Embedding(EmbeddingError::DimensionMismatch {
                    expected: 384,
                    actual: 512,
                }),
                "Embedding error: Expected 384-d embeddings, got 512-d",
            ),
            (
                TrainError::Embedding(EmbeddingError::EmptyText { index: 3 }),
                "Embedding error: Text 3 in batch is empty",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn loss_error_converts() {
        let err: TrainError = LossError::InvalidInput("empty batch".into()).into();
        assert!(matches!(err, TrainError::Loss(LossError::InvalidInput(_))));
        assert_eq!(err.to_string(), "Loss error: Invalid input: empty batch");
    }

    #[test]
    fn io_source_chain_preserved() {
        let err: TrainError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
        let source = err.source().expect("should have source");
        assert!(source.to_string().contains("no such file"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrainError>();
        assert_send_sync::<EmbeddingError>();
    }
}
