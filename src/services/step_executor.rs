//! Single-attempt step execution.
//!
//! One attempt drives a planned step through: persist the attempt record,
//! enrich the prompt from semantic memory (best-effort), request a
//! completion (with one immediate re-ask on client failure), parse the
//! chosen ability, dispatch it, and record the outcome. Failures come back
//! as an [`ErrorInfo`] sentinel for the retry controller; they are never
//! thrown past it.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::error::ErrorInfo;
use crate::domain::models::{
    AbilityCall, PlannedStep, Step, StepOutput, StepStatus, Task, Thoughts,
};
use crate::domain::ports::{
    AbilityDispatcher, CompletionClient, CompletionError, MemoryHit, MemoryStore, TaskRepository,
};
use crate::services::prompt::PromptBuilder;

/// Structured answer expected from a step completion.
#[derive(Debug, Deserialize)]
struct StepAnswer {
    #[serde(default)]
    thoughts: Thoughts,
    ability: AbilityCall,
}

/// One failed attempt: the persisted step record (when one was created
/// before the failure) plus the stringified cause.
#[derive(Debug)]
pub struct AttemptFailure {
    pub step: Option<Step>,
    pub error: ErrorInfo,
}

/// Executes exactly one attempt of a planned step.
pub struct StepExecutor {
    completion: Arc<dyn CompletionClient>,
    dispatcher: Arc<dyn AbilityDispatcher>,
    tasks: Arc<dyn TaskRepository>,
    memory: Arc<dyn MemoryStore>,
    prompts: PromptBuilder,
    /// Upper bound on each completion/dispatch call
    call_timeout: Duration,
}

impl StepExecutor {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        dispatcher: Arc<dyn AbilityDispatcher>,
        tasks: Arc<dyn TaskRepository>,
        memory: Arc<dyn MemoryStore>,
        prompts: PromptBuilder,
        call_timeout: Duration,
    ) -> Self {
        Self {
            completion,
            dispatcher,
            tasks,
            memory,
            prompts,
            call_timeout,
        }
    }

    /// Run one attempt of a planned step.
    ///
    /// `error_info` carries the prior attempt's failure cause on retries;
    /// it is injected into the step payload so the model sees what went
    /// wrong. The attempt record is persisted before the model is
    /// consulted, so a failed attempt still leaves an observable row.
    pub async fn execute_once(
        &self,
        task: &Task,
        planned: &PlannedStep,
        ordinal: u32,
        attempt: u32,
        error_info: Option<&ErrorInfo>,
        is_last: bool,
    ) -> Result<Step, AttemptFailure> {
        let mut step = Step::from_planned(task.id, planned, ordinal, attempt, is_last);
        if let Some(info) = error_info {
            step.additional_input.error_info = Some(info.message.clone());
        }

        if let Err(e) = self.tasks.create_step(&step).await {
            return Err(AttemptFailure {
                step: None,
                error: ErrorInfo::new(format!("failed to persist step record: {e}")),
            });
        }
        if let Err(e) = self.memory.record_step(&step).await {
            warn!(step_id = %step.id, error = %e, "Memory store rejected step record");
        }

        let memory_context = self.enrich_from_memory(&step).await;
        let messages =
            self.prompts
                .step_messages(task, &step, memory_context.as_deref(), &self.dispatcher.list_abilities());

        // One narrow, immediate re-ask absorbs transient completion failures
        // before the attempt is charged against the retry budget.
        let answer = match self.request_completion(&messages).await {
            Ok(answer) => answer,
            Err(first) => {
                warn!(
                    step_id = %step.id,
                    error = %first,
                    "Completion failed, re-asking once"
                );
                match self.request_completion(&messages).await {
                    Ok(answer) => answer,
                    Err(second) => {
                        return self.fail_attempt(step, ErrorInfo::new(second.to_string())).await;
                    }
                }
            }
        };

        let parsed: StepAnswer = match serde_json::from_value(answer.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                return self
                    .fail_attempt(step, ErrorInfo::new(format!("malformed step answer: {e}")))
                    .await;
            }
        };

        debug!(
            step_id = %step.id,
            ability = %parsed.ability.name,
            "Dispatching ability"
        );

        let dispatch = timeout(
            self.call_timeout,
            self.dispatcher
                .invoke(task.id, &parsed.ability.name, &parsed.ability.args),
        )
        .await;

        let result = match dispatch {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => return self.fail_attempt(step, ErrorInfo::new(e.to_string())).await,
            Err(_) => {
                return self
                    .fail_attempt(
                        step,
                        ErrorInfo::new(format!(
                            "ability {} timed out after {}s",
                            parsed.ability.name,
                            self.call_timeout.as_secs()
                        )),
                    )
                    .await;
            }
        };

        // Prefer the spoken summary as the step output, falling back to the
        // full structured answer.
        let output = parsed
            .thoughts
            .speak
            .as_ref()
            .map_or_else(|| answer.clone(), |speak| serde_json::Value::String(speak.clone()));

        if let Err(e) = self.tasks.record_step_success(step.id, &output, &result).await {
            // The ability already ran; losing the success row is preferable
            // to re-running its side effects on a retry.
            warn!(step_id = %step.id, error = %e, "Failed to record step success");
        }

        let step_output = StepOutput::new(
            step.id,
            parsed.thoughts.rationale(),
            result.to_string(),
            &parsed.ability.name,
        );
        if let Err(e) = self.memory.record_step_output(&step_output).await {
            warn!(step_id = %step.id, error = %e, "Memory store rejected step output");
        }

        step.status = StepStatus::Completed;
        step.output = Some(output);
        step.result = Some(result);
        Ok(step)
    }

    /// Best-effort semantic lookup; a memory failure downgrades to no
    /// context rather than failing the step.
    async fn enrich_from_memory(&self, step: &Step) -> Option<String> {
        match self.memory.search_step_outputs(&step.input).await {
            Ok(hits) if hits.is_empty() => None,
            Ok(hits) => Some(render_memory_context(&hits)),
            Err(e) => {
                warn!(step_id = %step.id, error = %e, "Memory search failed, continuing without context");
                None
            }
        }
    }

    async fn request_completion(
        &self,
        messages: &[crate::domain::ports::ChatMessage],
    ) -> Result<serde_json::Value, CompletionError> {
        timeout(self.call_timeout, self.completion.complete(messages))
            .await
            .map_err(|_| {
                CompletionError::Transport(format!(
                    "completion timed out after {}s",
                    self.call_timeout.as_secs()
                ))
            })?
    }

    async fn fail_attempt(
        &self,
        mut step: Step,
        error: ErrorInfo,
    ) -> Result<Step, AttemptFailure> {
        if let Err(e) = self.tasks.record_step_failure(step.id, &error.message).await {
            warn!(step_id = %step.id, error = %e, "Failed to record step failure");
        }
        step.status = StepStatus::Failed;
        step.error = Some(error.message.clone());
        Err(AttemptFailure {
            step: Some(step),
            error,
        })
    }
}

/// Fold similarity hits into one prompt context block.
fn render_memory_context(hits: &[MemoryHit]) -> String {
    hits.iter()
        .map(|hit| {
            if hit.thought.is_empty() {
                format!("- {}", hit.value)
            } else {
                format!("- {}: {}", hit.thought, hit.value)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
