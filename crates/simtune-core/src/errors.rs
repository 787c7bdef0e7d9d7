//! Loss error types.

use thiserror::Error;

/// Errors from similarity loss computation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LossError {
    /// Batch shape, label domain, or loss parameters are invalid.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The cosine or loss value is undefined even after epsilon guarding.
    #[error("Numeric instability: {0}")]
    NumericInstability(String),
}

/// Result alias for loss operations.
pub type Result<T> = std::result::Result<T, LossError>;
