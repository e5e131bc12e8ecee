use thiserror::Error;

use crate::types::Parameter;

/// Top-level error type for HydroSense.
///
/// Subsystem crates define their own error types and implement
/// `From<HydroError>` (or the reverse) so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HydroError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{parameter} value {value} is outside the accepted range {min}..={max}")]
    OutOfRange {
        parameter: Parameter,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{0} value is not a finite number")]
    NotFinite(Parameter),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
}

impl From<toml::de::Error> for HydroError {
    fn from(err: toml::de::Error) -> Self {
        HydroError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HydroError {
    fn from(err: toml::ser::Error) -> Self {
        HydroError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HydroError {
    fn from(err: serde_json::Error) -> Self {
        HydroError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for HydroSense operations.
pub type Result<T> = std::result::Result<T, HydroError>;
