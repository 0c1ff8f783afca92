//! Semantic memory store port.
//!
//! Keeps step and step-output records for similarity search over prior
//! results. Every call here is best-effort from the engine's point of
//! view: a failing memory store degrades a step's context, never its
//! outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::StoreError;
use crate::domain::models::{Step, StepOutput};

/// One prior output returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHit {
    pub thought: String,
    pub value: String,
    /// Similarity score in [0, 1]; higher is closer
    pub score: f64,
}

/// Port trait for the semantic memory store.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Record a step for later retrieval.
    async fn record_step(&self, step: &Step) -> Result<(), StoreError>;

    /// Record a step's rationale/result pairing.
    async fn record_step_output(&self, output: &StepOutput) -> Result<(), StoreError>;

    /// Return prior outputs most similar to the given prompt text.
    async fn search_step_outputs(&self, prompt: &str) -> Result<Vec<MemoryHit>, StoreError>;
}

/// No-op memory store for configurations without semantic memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMemoryStore;

#[async_trait]
impl MemoryStore for NullMemoryStore {
    async fn record_step(&self, _step: &Step) -> Result<(), StoreError> {
        Ok(())
    }

    async fn record_step_output(&self, _output: &StepOutput) -> Result<(), StoreError> {
        Ok(())
    }

    async fn search_step_outputs(&self, _prompt: &str) -> Result<Vec<MemoryHit>, StoreError> {
        Ok(Vec::new())
    }
}
