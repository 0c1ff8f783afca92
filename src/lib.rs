//! Insight Engine - Plan-and-Execute Task Agent
//!
//! Insight Engine takes a natural-language task, asks a language model for
//! an ordered plan, then executes each planned step through a catalogue of
//! abilities with bounded per-step retries and output propagation between
//! steps.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure business logic and domain models
//! - **Service Layer** (`services`): Planning, step execution, and retry logic
//! - **Application Layer** (`application`): Task orchestration
//! - **Adapters** (`adapters`): SQLite persistence and the ability registry
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, completion API
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use insight_engine::application::TaskOrchestrator;
//! use insight_engine::domain::models::Task;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire an orchestrator, then:
//!     // let outcome = orchestrator.run(Task::new("summarize sales")).await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{OrchestrationError, TaskOrchestrator, TaskOutcome};
pub use domain::models::{
    AbilityCall, AbilitySpec, Config, DatabaseConfig, LoggingConfig, PlannedStep, Step,
    StepPayload, StepStatus, Task, TaskStatus,
};
pub use domain::ports::{
    AbilityDispatcher, CompletionClient, MemoryStore, TaskRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Planner, PromptBuilder, RetryController, StepExecutor, MAX_ATTEMPTS};
