//! Completion client port.
//!
//! One request/response round trip with a language model returning
//! structured output. Adapters own transport concerns (HTTP, auth, body
//! parsing); the engine only sees parsed JSON or a classified failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Role of a conversation message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
}

/// A single role-tagged message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Completion failure modes the engine distinguishes.
///
/// Both count against the step-level retry budget; `Malformed` additionally
/// triggers the executor's one immediate re-ask before the attempt fails.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Request never produced a usable response body
    #[error("completion transport error: {0}")]
    Transport(String),

    /// Response body could not be parsed into structured data
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

/// Port trait for the language-model completion service.
///
/// Implementations must be `Send + Sync`; the orchestrator issues at most
/// one in-flight request per task but independent tasks share one client.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a conversation and return the parsed structured answer.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, CompletionError>;
}
