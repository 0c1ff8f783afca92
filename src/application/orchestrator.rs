//! Top-level task driver.
//!
//! Runs the planner once per task, then drives each planned step through
//! the retry controller in ordinal order, propagating every step's ability
//! result into the next step's parameters before it begins. A step that
//! exhausts its retries halts the task immediately; completed steps stay
//! persisted as-is with no compensation.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::domain::error::ErrorInfo;
use crate::domain::models::{Step, Task, TaskStatus};
use crate::domain::ports::{StoreError, TaskRepository};
use crate::services::planner::{PlanError, Planner};
use crate::services::retry::{RetryController, StepFailure};

/// Terminal outcome of one task run.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Every planned step succeeded. `last_step` is `None` only for an
    /// empty plan.
    Completed { last_step: Option<Step> },
    /// A step exhausted its retries; later steps never executed.
    Failed {
        ordinal: u32,
        error: ErrorInfo,
        last_step: Option<Step>,
    },
    /// Cancellation fired while the step at `ordinal` was in flight.
    Cancelled { ordinal: u32 },
}

impl TaskOutcome {
    /// The last step record processed, successful or not.
    pub fn last_step(&self) -> Option<&Step> {
        match self {
            Self::Completed { last_step } | Self::Failed { last_step, .. } => last_step.as_ref(),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Failures that prevent the step loop from running at all.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error(transparent)]
    Planning(#[from] PlanError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates one task: a single planning round, then a strictly
/// sequential step loop. Collaborators are injected at construction;
/// independent tasks run as independent orchestrator calls sharing no
/// mutable state outside the injected stores.
pub struct TaskOrchestrator {
    planner: Planner,
    retry: RetryController,
    tasks: Arc<dyn TaskRepository>,
}

impl TaskOrchestrator {
    pub fn new(planner: Planner, retry: RetryController, tasks: Arc<dyn TaskRepository>) -> Self {
        Self {
            planner,
            retry,
            tasks,
        }
    }

    /// Run a task to a terminal state without external cancellation.
    pub async fn run(&self, task: Task) -> Result<TaskOutcome, OrchestrationError> {
        let (_keep_alive, cancel) = watch::channel(false);
        self.run_with_cancel(task, cancel).await
    }

    /// Run a task to a terminal state.
    ///
    /// Flipping the cancel channel to `true` aborts the in-flight step
    /// attempt and ends the task in `Cancelled` instead of continuing the
    /// loop.
    pub async fn run_with_cancel(
        &self,
        task: Task,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<TaskOutcome, OrchestrationError> {
        task.validate().map_err(OrchestrationError::InvalidTask)?;

        self.tasks.create_task(&task).await?;
        info!(task_id = %task.id, input = %task.input, "Task created");

        // Planning failure aborts before any step executes.
        let mut plan = match self.planner.plan(&task).await {
            Ok(plan) => plan,
            Err(e) => {
                error!(task_id = %task.id, error = %e, "Planning failed, no steps executed");
                self.finish(&task, TaskStatus::Failed).await;
                return Err(e.into());
            }
        };

        self.tasks
            .set_task_status(task.id, TaskStatus::Running)
            .await?;

        let total = plan.len();
        let mut last_step: Option<Step> = None;

        for ordinal in 0..total {
            let is_last = ordinal + 1 == total;
            let planned = plan[ordinal].clone();

            let outcome = self
                .retry
                .execute_with_retry(&task, &planned, ordinal as u32, is_last, &mut cancel)
                .await;

            match outcome {
                Ok(step) => {
                    // Propagate the ability result into the next step's
                    // parameters before that step begins.
                    if let (Some(result), false) = (&step.result, is_last) {
                        plan[ordinal + 1].additional_input.previous_step_output =
                            Some(result.clone());
                    }
                    last_step = Some(step);
                }
                Err(StepFailure::RetriesExhausted {
                    ordinal,
                    attempts,
                    last_error,
                    last_step: failed_step,
                }) => {
                    warn!(
                        task_id = %task.id,
                        ordinal,
                        attempts,
                        error = %last_error,
                        "Step exhausted retries, halting task"
                    );
                    self.finish(&task, TaskStatus::Failed).await;
                    return Ok(TaskOutcome::Failed {
                        ordinal,
                        error: last_error,
                        last_step: failed_step.or(last_step),
                    });
                }
                Err(StepFailure::Cancelled { ordinal }) => {
                    info!(task_id = %task.id, ordinal, "Task cancelled");
                    self.finish(&task, TaskStatus::Cancelled).await;
                    return Ok(TaskOutcome::Cancelled { ordinal });
                }
            }
        }

        self.finish(&task, TaskStatus::Completed).await;
        info!(task_id = %task.id, steps = total, "Task completed");
        Ok(TaskOutcome::Completed { last_step })
    }

    /// Record the terminal status; a store failure here is logged rather
    /// than masking the task's real outcome.
    async fn finish(&self, task: &Task, status: TaskStatus) {
        if let Err(e) = self.tasks.set_task_status(task.id, status).await {
            warn!(task_id = %task.id, status = status.as_str(), error = %e, "Failed to record terminal status");
        }
    }
}
