//! Error types for kinbag.

use thiserror::Error;

/// The main error type for kinbag operations.
#[derive(Debug, Error)]
pub enum KinbagError {
    /// Input file line could not be parsed as a triple
    #[error("malformed input at line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    /// Underlying I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity has no vocabulary entry
    #[error("entity not in vocabulary: {0}")]
    MissingEntity(String),

    /// Relation is not part of the relation set
    #[error("relation not in relation set: {0}")]
    MissingRelation(String),

    /// Embedding lookup outside the matrix
    #[error("index {index} out of range for embedding matrix with {rows} rows")]
    OutOfRange { index: usize, rows: usize },

    /// Training loss became NaN or infinite
    #[error("non-finite loss at epoch {epoch}, batch {batch}")]
    NonFiniteLoss { epoch: usize, batch: usize },

    /// A stage received no examples
    #[error("empty dataset: {0}")]
    EmptyDataset(&'static str),

    /// Shape mismatch
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Invalid configuration value
    #[error("invalid config: {0}")]
    Config(String),

    /// Candle tensor operation failed
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// JSON (de)serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for kinbag operations.
pub type Result<T> = std::result::Result<T, KinbagError>;
