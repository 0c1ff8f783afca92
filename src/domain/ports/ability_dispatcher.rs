//! Ability dispatcher port.
//!
//! An opaque, capability-indexed call surface: the engine selects an
//! ability by name from a model answer and invokes it with the parsed
//! argument map. Argument validation happens here, not in the engine.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::AbilitySpec;

/// Dispatch failure modes. All of them feed the retry loop's error
/// context; none are silently ignored.
#[derive(Debug, Error)]
pub enum AbilityError {
    #[error("unknown ability: {0}")]
    UnknownAbility(String),

    #[error("invalid arguments for {ability}: {reason}")]
    InvalidArguments { ability: String, reason: String },

    #[error("ability {ability} failed: {reason}")]
    ExecutionFailed { ability: String, reason: String },
}

/// Port trait for the ability registry/dispatcher.
#[async_trait]
pub trait AbilityDispatcher: Send + Sync {
    /// Enumerate available abilities for prompt construction.
    fn list_abilities(&self) -> Vec<AbilitySpec>;

    /// Execute the named ability with the given arguments.
    async fn invoke(
        &self,
        task_id: Uuid,
        name: &str,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Value, AbilityError>;
}
