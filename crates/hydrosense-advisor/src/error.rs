//! Error types for the text-completion provider.

/// Why a completion request failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("API key not configured (set {0})")]
    MissingApiKey(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("rate limited or quota exceeded: {0}")]
    RateLimited(String),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}
