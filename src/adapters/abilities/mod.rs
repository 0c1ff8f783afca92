//! Ability adapters: the registry plus the built-in ability set.

pub mod builtin;
pub mod registry;

pub use builtin::{Finish, ReadFile, SearchMemory, WriteFile};
pub use registry::{AbilityHandler, AbilityRegistry};

use std::path::Path;
use std::sync::Arc;

use crate::domain::ports::MemoryStore;

/// Build a registry populated with the built-in abilities.
pub fn builtin_registry(workspace_root: &Path, memory: Arc<dyn MemoryStore>) -> AbilityRegistry {
    let mut registry = AbilityRegistry::new();
    registry.register(Arc::new(ReadFile::new(workspace_root)));
    registry.register(Arc::new(WriteFile::new(workspace_root)));
    registry.register(Arc::new(SearchMemory::new(memory)));
    registry.register(Arc::new(Finish));
    registry
}
