//! Error types for the forecasting pipeline

use thiserror::Error;

/// Errors that can occur across the forecasting pipeline
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Caller-supplied input failed validation. Messages accumulate; the
    /// pipeline never proceeds to scaling or inference on invalid input.
    #[error("input validation failed: {}", .0.join(" | "))]
    Validation(Vec<String>),

    /// Loaded artifact components do not fit together. Raised at load time,
    /// never deferred to the first prediction.
    #[error("artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error("{0} has not been fitted yet")]
    NotFitted(&'static str),

    #[error("{0} is already fitted; fit is called exactly once per artifact")]
    AlreadyFitted(&'static str),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ForecastError>;
