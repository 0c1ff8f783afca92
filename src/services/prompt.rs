//! Prompt assembly for planning and step execution.
//!
//! Two conversation shapes exist: the planning round trip (task text plus
//! ability catalogue, answered with a `plan` list) and the step round trip
//! (task context, step input, threaded error/previous-output keys, ability
//! catalogue, answered with `thoughts` + `ability`). System messages carry
//! the required output format; user messages carry the content.

use chrono::{NaiveDate, Utc};
use std::fmt::Write as _;

use crate::domain::models::{AbilitySpec, Step, Task};
use crate::domain::ports::ChatMessage;

/// Required output format for the planning round trip.
const PLAN_SYSTEM_FORMAT: &str = r#"You are a task-planning assistant. Decompose the task into an ordered list of executable steps, each resolvable with exactly one of the listed abilities.

Respond with ONLY a JSON object of this exact shape, no other text:
{
  "plan": [
    {
      "input": "instruction text for this step",
      "additional_input": {}
    }
  ]
}"#;

/// Required output format for the step execution round trip.
const STEP_SYSTEM_FORMAT: &str = r#"You are an autonomous task executor. Select exactly one ability to accomplish the current step and supply its arguments.

Respond with ONLY a JSON object of this exact shape, no other text:
{
  "thoughts": {
    "reasoning": "why this ability and these arguments",
    "speak": "one-sentence summary of what you are doing"
  },
  "ability": {
    "name": "ability name from the catalogue",
    "args": {}
  }
}"#;

/// Builds planning and execution conversations under a hard prompt budget.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    /// Hard character cap applied to each user message
    char_budget: usize,
}

impl PromptBuilder {
    pub fn new(char_budget: usize) -> Self {
        Self { char_budget }
    }

    /// Conversation for the single planning completion.
    pub fn plan_messages(&self, task: &Task, abilities: &[AbilitySpec]) -> Vec<ChatMessage> {
        let mut user = String::new();
        let _ = writeln!(user, "Today's date: {}", today());
        let _ = writeln!(user, "\nTask:\n{}", task.input);
        if !task.additional_input.is_empty() {
            let _ = writeln!(
                user,
                "\nTask parameters:\n{}",
                serde_json::Value::Object(task.additional_input.clone())
            );
        }
        let _ = writeln!(user, "\nAvailable abilities:\n{}", render_catalogue(abilities));

        vec![
            ChatMessage::system(PLAN_SYSTEM_FORMAT),
            ChatMessage::user(truncate_tail(&user, self.char_budget).to_string()),
        ]
    }

    /// Conversation for one step execution completion.
    ///
    /// Injected keys are spelled out individually so the model sees a prior
    /// failure (`error_info`) and the preceding step's result
    /// (`previous_step_output`) as distinct context blocks.
    pub fn step_messages(
        &self,
        task: &Task,
        step: &Step,
        memory_context: Option<&str>,
        abilities: &[AbilitySpec],
    ) -> Vec<ChatMessage> {
        let mut user = String::new();
        let _ = writeln!(user, "Today's date: {}", today());
        let _ = writeln!(user, "\nTask:\n{}", task.input);
        let _ = writeln!(user, "\nCurrent step:\n{}", step.input);

        if let Some(previous) = &step.additional_input.previous_step_output {
            let _ = writeln!(user, "\nOutput of the previous step:\n{previous}");
        }
        if let Some(error) = &step.additional_input.error_info {
            let _ = writeln!(
                user,
                "\nThe previous attempt at this step failed. Avoid repeating the cause:\n{error}"
            );
        }
        if !step.additional_input.extra.is_empty() {
            let _ = writeln!(
                user,
                "\nStep parameters:\n{}",
                serde_json::Value::Object(step.additional_input.extra.clone())
            );
        }
        if let Some(memory) = memory_context {
            if !memory.is_empty() {
                let _ = writeln!(user, "\nRelevant prior results:\n{memory}");
            }
        }
        let _ = writeln!(user, "\nAvailable abilities:\n{}", render_catalogue(abilities));

        vec![
            ChatMessage::system(STEP_SYSTEM_FORMAT),
            ChatMessage::user(truncate_tail(&user, self.char_budget).to_string()),
        ]
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Render the ability catalogue as one line per ability.
fn render_catalogue(abilities: &[AbilitySpec]) -> String {
    if abilities.is_empty() {
        return "(none)".to_string();
    }
    abilities
        .iter()
        .map(|spec| format!("- {}", spec.prompt_line()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trim trailing content past the hard character budget.
///
/// Always terminates: the cut point only moves backwards to the nearest
/// UTF-8 character boundary. Leading context (task text, step input) is
/// the part worth keeping, so the tail is what goes.
pub fn truncate_tail(text: &str, budget: usize) -> &str {
    if text.len() <= budget {
        return text;
    }
    let mut end = budget;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
