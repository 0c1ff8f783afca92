//! Bounded per-step retry control.
//!
//! Wraps the step executor in a fixed-budget retry loop. Per planned step
//! the state machine is Pending -> Attempting -> {Succeeded, Retrying,
//! ExhaustedRetries}: each failed attempt's cause is carried into the next
//! attempt's prompt as `error_info`, retries are immediate with no
//! backoff, and the budget is a hardcoded policy of three attempts.

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::error::ErrorInfo;
use crate::domain::models::{PlannedStep, Step, Task};
use crate::services::step_executor::StepExecutor;

/// Attempts per step. A policy of the engine, not a tunable.
pub const MAX_ATTEMPTS: u32 = 3;

/// Terminal failure of one planned step.
#[derive(Debug, Error)]
pub enum StepFailure {
    #[error("step {ordinal} exhausted {attempts} attempts: {last_error}")]
    RetriesExhausted {
        ordinal: u32,
        attempts: u32,
        last_error: ErrorInfo,
        /// The final attempt's persisted record, when one was created
        last_step: Option<Step>,
    },

    #[error("step {ordinal} cancelled")]
    Cancelled { ordinal: u32 },
}

/// Drives one planned step to a terminal state.
pub struct RetryController {
    executor: StepExecutor,
}

impl RetryController {
    pub fn new(executor: StepExecutor) -> Self {
        Self { executor }
    }

    /// Execute a planned step with up to [`MAX_ATTEMPTS`] attempts.
    ///
    /// The cancel channel aborts the in-flight attempt (dropping its
    /// future, and with it any in-flight completion or dispatch call) and
    /// reports `Cancelled` instead of continuing the loop.
    pub async fn execute_with_retry(
        &self,
        task: &Task,
        planned: &PlannedStep,
        ordinal: u32,
        is_last: bool,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Step, StepFailure> {
        let mut error_info: Option<ErrorInfo> = None;
        let mut last_step: Option<Step> = None;

        for attempt in 1..=MAX_ATTEMPTS {
            if *cancel.borrow() {
                return Err(StepFailure::Cancelled { ordinal });
            }

            // Hand the attempt its own copy of the prior failure; the
            // loop's slot is reassigned below while the future may still
            // be pinned.
            let current_error = error_info.clone();
            let attempt_fut = self.executor.execute_once(
                task,
                planned,
                ordinal,
                attempt,
                current_error.as_ref(),
                is_last,
            );
            tokio::pin!(attempt_fut);

            let outcome = tokio::select! {
                outcome = &mut attempt_fut => outcome,
                () = cancelled(cancel) => {
                    return Err(StepFailure::Cancelled { ordinal });
                }
            };

            match outcome {
                Ok(step) => {
                    info!(
                        task_id = %task.id,
                        ordinal,
                        attempt,
                        "Step succeeded"
                    );
                    return Ok(step);
                }
                Err(failure) => {
                    warn!(
                        task_id = %task.id,
                        ordinal,
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        error = %failure.error,
                        "Step attempt failed"
                    );
                    last_step = failure.step.or(last_step);
                    error_info = Some(failure.error);
                }
            }
        }

        let last_error = error_info.unwrap_or_else(|| ErrorInfo::new("unknown failure"));
        Err(StepFailure::RetriesExhausted {
            ordinal,
            attempts: MAX_ATTEMPTS,
            last_error,
            last_step,
        })
    }
}

/// Resolves once the cancel flag flips to true; never resolves when the
/// sender side is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
