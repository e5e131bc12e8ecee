//! API error types and JSON error response formatting.
//!
//! ApiError gives every endpoint the same JSON error body and maps domain
//! errors to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hydrosense_core::HydroError;
use hydrosense_session::SessionError;
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - malformed or unknown parameter.
    BadRequest(String),
    /// 404 Not Found - session does not exist or has expired.
    NotFound(String),
    /// 409 Conflict - action not allowed in the session's current state.
    Conflict(String),
    /// 422 Unprocessable Entity - sample failed validation.
    UnprocessableEntity(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal API error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoSample => ApiError::Conflict(err.to_string()),
            SessionError::EmptyMessage | SessionError::MessageTooLong(_) => {
                ApiError::BadRequest(err.to_string())
            }
            SessionError::InvalidSample(msg) => ApiError::UnprocessableEntity(msg),
            SessionError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            SessionError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<HydroError> for ApiError {
    fn from(err: HydroError) -> Self {
        match err {
            HydroError::OutOfRange { .. } | HydroError::NotFinite(_) => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            HydroError::UnknownLanguage(_) | HydroError::UnknownParameter(_) => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}
