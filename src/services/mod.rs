//! Service layer: planning, prompt assembly, and step execution.

pub mod planner;
pub mod prompt;
pub mod retry;
pub mod step_executor;

pub use planner::{PlanError, Planner};
pub use prompt::PromptBuilder;
pub use retry::{RetryController, StepFailure, MAX_ATTEMPTS};
pub use step_executor::{AttemptFailure, StepExecutor};

/// Extract JSON from a model response that may wrap it in a markdown code
/// block.
pub fn extract_json_from_response(response: &str) -> String {
    let trimmed = response.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim().to_string();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim().to_string();
        }
    }
    trimmed.to_string()
}
