use reqwest::StatusCode;
use thiserror::Error;

/// Errors at the completion-service boundary.
///
/// Every variant is recoverable: the session answers with the fallback reply
/// and the visitor can simply try again.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("completion service returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("malformed completion response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{provider} API key not configured")]
    MissingApiKey { provider: &'static str },
    #[error("completion service returned no content")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, CompletionError>;
