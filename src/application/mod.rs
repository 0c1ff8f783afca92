//! Application layer: top-level task orchestration.

pub mod orchestrator;

pub use orchestrator::{OrchestrationError, TaskOrchestrator, TaskOutcome};
