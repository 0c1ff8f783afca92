//! Step domain model.
//!
//! A step is one execution *attempt* at a planned position within a task.
//! Retries create fresh step records rather than mutating one, so a logical
//! plan position may own several step rows, at most one of them successful.
//! A step without a successful output is a normal, queryable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Typed step payload.
///
/// The orchestration engine reads and writes exactly two keys of the
/// free-form `additional_input` map the caller and the model see:
/// `error_info` (failure cause threaded into retry prompts) and
/// `previous_step_output` (result of the preceding step). Everything else
/// rides along untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepPayload {
    /// Stringified cause of the previous failed attempt, if this is a retry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_info: Option<String>,
    /// Normalized ability result of the preceding step, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_step_output: Option<Value>,
    /// Open extension bag for ability-specific parameters
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl StepPayload {
    pub fn is_empty(&self) -> bool {
        self.error_info.is_none() && self.previous_step_output.is_none() && self.extra.is_empty()
    }

    /// Parse from a free-form additional-input map, lifting the recognized keys.
    pub fn from_map(map: serde_json::Map<String, Value>) -> Self {
        let mut payload = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "error_info" => payload.error_info = value.as_str().map(ToString::to_string),
                "previous_step_output" => payload.previous_step_output = Some(value),
                _ => {
                    payload.extra.insert(key, value);
                }
            }
        }
        payload
    }
}

/// An ordered element of a plan: the specification a step is instantiated
/// from. Holds no identity until executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Instruction text for this step
    pub input: String,
    /// Step parameters; accumulates propagated output before execution
    #[serde(default)]
    pub additional_input: StepPayload,
}

impl PlannedStep {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            additional_input: StepPayload::default(),
        }
    }
}

/// Outcome status of a step record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Persisted, attempt in flight
    Created,
    /// Ability invoked successfully, output recorded
    Completed,
    /// Attempt failed (parse or dispatch error)
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created" => Some(Self::Created),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One execution attempt at a planned position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier of this attempt
    pub id: Uuid,
    /// Owning task
    pub task_id: Uuid,
    /// Instruction text, copied from the planned step
    pub input: String,
    /// Parameters visible to the model, including injected error/output keys
    pub additional_input: StepPayload,
    /// Ordinal position within the plan
    pub ordinal: u32,
    /// 1-based attempt counter at this ordinal
    pub attempt: u32,
    /// Whether this is the final planned step
    pub is_last: bool,
    /// Outcome status
    pub status: StepStatus,
    /// Model answer on success: the `thoughts.speak` summary when present,
    /// otherwise the full structured answer
    pub output: Option<Value>,
    /// Normalized ability result, propagated into the next step
    pub result: Option<Value>,
    /// Failure cause when the attempt did not succeed
    pub error: Option<String>,
    /// When created
    pub created_at: DateTime<Utc>,
}

impl Step {
    /// Instantiate an attempt from a planned step.
    pub fn from_planned(
        task_id: Uuid,
        planned: &PlannedStep,
        ordinal: u32,
        attempt: u32,
        is_last: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            input: planned.input.clone(),
            additional_input: planned.additional_input.clone(),
            ordinal,
            attempt,
            is_last,
            status: StepStatus::Created,
            output: None,
            result: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

/// Persisted pairing of a step's rationale text with its normalized ability
/// result, kept for later semantic retrieval. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub id: Uuid,
    pub step_id: Uuid,
    /// Rationale portion of the model answer
    pub thought: String,
    /// Normalized ability result, serialized
    pub value: String,
    /// Ability name that produced the value
    pub output_type: String,
    pub created_at: DateTime<Utc>,
}

impl StepOutput {
    pub fn new(
        step_id: Uuid,
        thought: impl Into<String>,
        value: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            step_id,
            thought: thought.into(),
            value: value.into(),
            output_type: output_type.into(),
            created_at: Utc::now(),
        }
    }
}

/// Rationale block of a step answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thoughts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,
}

impl Thoughts {
    /// Best available rationale text, preferring the explicit reasoning.
    pub fn rationale(&self) -> &str {
        self.reasoning
            .as_deref()
            .or(self.speak.as_deref())
            .unwrap_or_default()
    }
}
