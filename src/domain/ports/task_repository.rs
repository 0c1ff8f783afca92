//! Persistent task/step store port.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::errors::StoreError;
use crate::domain::models::{Step, Task, TaskStatus};

/// Repository trait for task and step records.
///
/// Every execution attempt persists a fresh step row before the model is
/// consulted, so partial progress stays observable even when the attempt
/// fails. Failed attempts keep their rows; nothing is compensated or
/// rolled back after a task halts.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task.
    async fn create_task(&self, task: &Task) -> Result<(), StoreError>;

    /// Fetch a task by id.
    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    /// Move a task to a new status, stamping `completed_at` on terminal ones.
    async fn set_task_status(&self, id: Uuid, status: TaskStatus) -> Result<(), StoreError>;

    /// Persist a new step attempt record.
    async fn create_step(&self, step: &Step) -> Result<(), StoreError>;

    /// Mark a step completed with its answer output and ability result.
    async fn record_step_success(
        &self,
        step_id: Uuid,
        output: &Value,
        result: &Value,
    ) -> Result<(), StoreError>;

    /// Mark a step failed with a stringified cause.
    async fn record_step_failure(&self, step_id: Uuid, error: &str) -> Result<(), StoreError>;

    /// List all step attempts of a task in creation order.
    async fn list_steps(&self, task_id: Uuid) -> Result<Vec<Step>, StoreError>;
}
