use thiserror::Error;

use crate::domain::ports::CompletionError;

/// Errors raised by the chat completion HTTP client.
#[derive(Error, Debug)]
pub enum CompletionApiError {
    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Unexpected status ({0}): {1}")]
    UnexpectedStatus(u16, String),

    #[error("Response had no choices")]
    EmptyResponse,

    #[error("Response content was not valid JSON: {0}")]
    InvalidContent(String),
}

impl From<CompletionApiError> for CompletionError {
    fn from(err: CompletionApiError) -> Self {
        match err {
            CompletionApiError::EmptyResponse | CompletionApiError::InvalidContent(_) => {
                CompletionError::Malformed(err.to_string())
            }
            other => CompletionError::Transport(other.to_string()),
        }
    }
}
