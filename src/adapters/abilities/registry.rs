//! Ability registry implementing the dispatcher port.
//!
//! Abilities register under a unique name with a declared parameter
//! schema; the registry routes invocations by name and reports unknown
//! names and handler failures as dispatch errors.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::AbilitySpec;
use crate::domain::ports::{AbilityDispatcher, AbilityError};

/// One executable ability: its catalogue entry plus the operation itself.
#[async_trait]
pub trait AbilityHandler: Send + Sync {
    /// Catalogue entry rendered into prompts.
    fn spec(&self) -> AbilitySpec;

    /// Execute with the arguments the model supplied. Argument shapes are
    /// validated here, not by the caller.
    async fn run(
        &self,
        task_id: Uuid,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Value, AbilityError>;
}

/// Name-indexed ability registry.
#[derive(Default)]
pub struct AbilityRegistry {
    handlers: HashMap<String, Arc<dyn AbilityHandler>>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its spec name, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn AbilityHandler>) {
        self.handlers.insert(handler.spec().name, handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl AbilityDispatcher for AbilityRegistry {
    fn list_abilities(&self) -> Vec<AbilitySpec> {
        let mut specs: Vec<AbilitySpec> =
            self.handlers.values().map(|h| h.spec()).collect();
        // Stable catalogue order keeps prompts deterministic.
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    async fn invoke(
        &self,
        task_id: Uuid,
        name: &str,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Value, AbilityError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| AbilityError::UnknownAbility(name.to_string()))?;

        debug!(task_id = %task_id, ability = name, "Invoking ability");
        handler.run(task_id, args).await
    }
}

/// Extract a required string argument or fail with `InvalidArguments`.
pub fn required_str<'a>(
    args: &'a serde_json::Map<String, Value>,
    name: &str,
    ability: &str,
) -> Result<&'a str, AbilityError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| AbilityError::InvalidArguments {
            ability: ability.to_string(),
            reason: format!("missing required string argument '{name}'"),
        })
}
