//! Configuration loading with hierarchical merging (defaults, project
//! YAML, local overrides, environment variables).

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
