//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that infrastructure adapters must implement:
//! - `CompletionClient`: language-model completion round trips
//! - `AbilityDispatcher`: named ability enumeration and invocation
//! - `TaskRepository`: persistent task/step records
//! - `MemoryStore`: best-effort semantic memory over step outputs
//!
//! These contracts keep the orchestration engine independent of specific
//! infrastructure implementations.

pub mod ability_dispatcher;
pub mod completion_client;
pub mod errors;
pub mod memory_store;
pub mod task_repository;

pub use ability_dispatcher::{AbilityDispatcher, AbilityError};
pub use completion_client::{ChatMessage, CompletionClient, CompletionError, Role};
pub use errors::StoreError;
pub use memory_store::{MemoryHit, MemoryStore, NullMemoryStore};
pub use task_repository::TaskRepository;
