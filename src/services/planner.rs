//! Task planning via one completion round trip.
//!
//! Converts a task description into an ordered list of step specifications.
//! No retry lives at this layer: a planning failure aborts the task before
//! any step executes.

use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::models::{PlannedStep, StepPayload, Task};
use crate::domain::ports::{AbilityDispatcher, CompletionClient, CompletionError};
use crate::services::prompt::PromptBuilder;

/// Planning failure: fatal to the whole task, no steps run.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("planning completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("malformed plan answer: {0}")]
    MalformedPlan(String),
}

/// Raw shape of the planning answer.
#[derive(Debug, Deserialize)]
struct PlanAnswer {
    plan: Vec<PlanEntry>,
}

#[derive(Debug, Deserialize)]
struct PlanEntry {
    input: String,
    #[serde(default)]
    additional_input: serde_json::Map<String, serde_json::Value>,
}

/// Obtains a step plan for a task with a single completion request.
pub struct Planner {
    completion: Arc<dyn CompletionClient>,
    dispatcher: Arc<dyn AbilityDispatcher>,
    prompts: PromptBuilder,
}

impl Planner {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        dispatcher: Arc<dyn AbilityDispatcher>,
        prompts: PromptBuilder,
    ) -> Self {
        Self {
            completion,
            dispatcher,
            prompts,
        }
    }

    /// Produce the ordered plan for a task.
    ///
    /// Issues exactly one completion request. The answer must be an object
    /// with a `plan` key holding an ordered list of step objects, each with
    /// at least an `input` string; `additional_input` defaults to empty.
    pub async fn plan(&self, task: &Task) -> Result<Vec<PlannedStep>, PlanError> {
        let abilities = self.dispatcher.list_abilities();
        let messages = self.prompts.plan_messages(task, &abilities);

        debug!(task_id = %task.id, abilities = abilities.len(), "Requesting plan");
        let answer = self.completion.complete(&messages).await?;

        let parsed: PlanAnswer = serde_json::from_value(answer)
            .map_err(|e| PlanError::MalformedPlan(e.to_string()))?;

        let plan: Vec<PlannedStep> = parsed
            .plan
            .into_iter()
            .map(|entry| PlannedStep {
                input: entry.input,
                additional_input: StepPayload::from_map(entry.additional_input),
            })
            .collect();

        info!(task_id = %task.id, steps = plan.len(), "Plan obtained");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_answer_parsing() {
        let answer: PlanAnswer = serde_json::from_value(json!({
            "plan": [
                {"input": "query sales data"},
                {"input": "summarize totals", "additional_input": {"style": "brief"}}
            ]
        }))
        .unwrap();

        assert_eq!(answer.plan.len(), 2);
        assert_eq!(answer.plan[0].input, "query sales data");
        assert!(answer.plan[0].additional_input.is_empty());
        assert_eq!(
            answer.plan[1].additional_input.get("style"),
            Some(&json!("brief"))
        );
    }

    #[test]
    fn test_plan_answer_rejects_missing_plan_key() {
        let result: Result<PlanAnswer, _> =
            serde_json::from_value(json!({"steps": [{"input": "nope"}]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_plan_answer_rejects_missing_input() {
        let result: Result<PlanAnswer, _> =
            serde_json::from_value(json!({"plan": [{"additional_input": {}}]}));
        assert!(result.is_err());
    }
}
