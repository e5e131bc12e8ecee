//! Error types for session actions.

use hydrosense_core::error::HydroError;

/// Errors from a user action on a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no water sample has been analyzed yet")]
    NoSample,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid sample: {0}")]
    InvalidSample(String),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<HydroError> for SessionError {
    fn from(err: HydroError) -> Self {
        SessionError::InvalidSample(err.to_string())
    }
}
