pub mod ability;
pub mod config;
pub mod step;
pub mod task;

pub use ability::{AbilityCall, AbilityParameter, AbilitySpec};
pub use config::{
    CompletionConfig, Config, DatabaseConfig, LoggingConfig, MemoryConfig, WorkspaceConfig,
};
pub use step::{PlannedStep, Step, StepOutput, StepPayload, StepStatus, Thoughts};
pub use task::{Task, TaskStatus};
