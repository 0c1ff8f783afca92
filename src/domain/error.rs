//! Attempt-failure sentinel shared across the execution layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stringified cause of one failed step attempt.
///
/// Returned by the step executor instead of an exception-style error so the
/// retry controller can thread it into the next attempt's prompt as
/// `error_info`. Distinguishes "attempt failed, retry" from hard failures
/// in type signatures rather than via catch-all handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Capture any error's display form.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<String> for ErrorInfo {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ErrorInfo {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
