//! Task domain model.
//!
//! A task is one top-level unit of work submitted by a caller. It is
//! decomposed into an ordered plan of steps exactly once, then driven
//! to a terminal status by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal and in-flight status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is persisted but execution has not started
    Created,
    /// Plan obtained, steps are being executed
    Running,
    /// All planned steps succeeded
    Completed,
    /// Planning failed or a step exhausted its retries
    Failed,
    /// Execution was cancelled before reaching a terminal step
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Created
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created" => Some(Self::Created),
            "running" => Some(Self::Running),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// One top-level unit of work, decomposed into a plan by the orchestrator.
///
/// Immutable after creation except for the terminal status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: Uuid,
    /// Original natural-language input
    pub input: String,
    /// Free-form caller-supplied parameters
    #[serde(default)]
    pub additional_input: serde_json::Map<String, serde_json::Value>,
    /// Current status
    pub status: TaskStatus,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When a terminal status was reached
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task from its natural-language input.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            input: input.into(),
            additional_input: serde_json::Map::new(),
            status: TaskStatus::Created,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Attach caller-supplied parameters.
    #[must_use]
    pub fn with_additional_input(
        mut self,
        additional_input: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.additional_input = additional_input;
        self
    }

    /// Validate task invariants before persisting.
    pub fn validate(&self) -> Result<(), String> {
        if self.input.trim().is_empty() {
            return Err("Task input cannot be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation() {
        let task = Task::new("Compute total sales by region");
        assert_eq!(task.input, "Compute total sales by region");
        assert_eq!(task.status, TaskStatus::Created);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_task_validation() {
        assert!(Task::new("   ").validate().is_err());
        assert!(Task::new("real work").validate().is_ok());
    }

    #[test]
    fn test_status_terminality() {
        assert!(!TaskStatus::Created.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TaskStatus::Created,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(TaskStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_str("canceled"), Some(TaskStatus::Cancelled));
        assert_eq!(TaskStatus::from_str("bogus"), None);
    }
}
