//! Error types for potability prediction.

use hydrosense_core::error::HydroError;

/// Errors from loading the classifier or running a prediction.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("invalid sample: {0}")]
    InvalidSample(String),
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<HydroError> for PredictError {
    fn from(err: HydroError) -> Self {
        PredictError::InvalidSample(err.to_string())
    }
}
