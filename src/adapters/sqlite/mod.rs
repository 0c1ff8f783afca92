//! SQLite adapters for the persistence ports.

pub mod connection;
pub mod memory_store;
pub mod migrations;
pub mod task_repository;

pub use connection::{create_pool, create_test_pool, ConnectionError, PoolConfig};
pub use memory_store::SqliteMemoryStore;
pub use migrations::{Migrator, MigrationError};
pub use task_repository::SqliteTaskRepository;
