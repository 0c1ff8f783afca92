//! Shared test doubles for the orchestration integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

use insight_engine::domain::models::{AbilitySpec, Step, StepOutput, StepStatus, Task, TaskStatus};
use insight_engine::domain::ports::{
    AbilityDispatcher, AbilityError, ChatMessage, CompletionClient, CompletionError, MemoryHit,
    MemoryStore, StoreError, TaskRepository,
};

/// One scripted completion reply.
pub enum Reply {
    Ok(Value),
    Transport(String),
    Malformed(String),
    /// Never resolves; the caller's timeout or cancellation must fire.
    Stall,
}

/// Completion client that replays a fixed script and records every
/// conversation it was sent.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, answer: Value) {
        self.replies.lock().unwrap().push_back(Reply::Ok(answer));
    }

    pub fn push_transport_error(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Transport(message.to_string()));
    }

    pub fn push_malformed(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Malformed(message.to_string()));
    }

    pub fn push_stall(&self) {
        self.replies.lock().unwrap().push_back(Reply::Stall);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Full text of the user message in the nth recorded conversation.
    pub fn user_prompt(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index]
            .iter()
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, CompletionError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ok(answer)) => Ok(answer),
            Some(Reply::Transport(msg)) => Err(CompletionError::Transport(msg)),
            Some(Reply::Malformed(msg)) => Err(CompletionError::Malformed(msg)),
            Some(Reply::Stall) => std::future::pending().await,
            None => Err(CompletionError::Transport(
                "completion script exhausted".to_string(),
            )),
        }
    }
}

/// One scripted dispatch reply for a named ability.
pub enum Dispatch {
    Ok(Value),
    Fail(String),
    /// Never resolves; the caller's timeout or cancellation must fire.
    Stall,
}

/// Dispatcher that serves scripted results per ability name and records
/// every invocation. Names with no script entry are unknown abilities.
#[derive(Default)]
pub struct RecordingDispatcher {
    specs: Vec<AbilitySpec>,
    results: Mutex<HashMap<String, VecDeque<Dispatch>>>,
    pub invocations: Mutex<Vec<(String, serde_json::Map<String, Value>)>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ability in the catalogue without scripting a result.
    pub fn with_spec(mut self, name: &str) -> Self {
        self.specs.push(AbilitySpec {
            name: name.to_string(),
            description: format!("test ability {name}"),
            parameters: vec![],
            output_type: "object".to_string(),
        });
        self
    }

    pub fn queue_ok(&self, name: &str, result: Value) {
        self.results
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push_back(Dispatch::Ok(result));
    }

    pub fn queue_failure(&self, name: &str, reason: &str) {
        self.results
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push_back(Dispatch::Fail(reason.to_string()));
    }

    pub fn queue_stall(&self, name: &str) {
        self.results
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push_back(Dispatch::Stall);
    }

    pub fn invocation_count(&self, name: &str) -> usize {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .count()
    }
}

#[async_trait]
impl AbilityDispatcher for RecordingDispatcher {
    fn list_abilities(&self) -> Vec<AbilitySpec> {
        self.specs.clone()
    }

    async fn invoke(
        &self,
        _task_id: Uuid,
        name: &str,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Value, AbilityError> {
        self.invocations
            .lock()
            .unwrap()
            .push((name.to_string(), args.clone()));

        let reply = match self.results.lock().unwrap().get_mut(name) {
            None => return Err(AbilityError::UnknownAbility(name.to_string())),
            Some(queue) => queue.pop_front(),
        };
        match reply {
            Some(Dispatch::Ok(result)) => Ok(result),
            Some(Dispatch::Fail(reason)) => Err(AbilityError::ExecutionFailed {
                ability: name.to_string(),
                reason,
            }),
            Some(Dispatch::Stall) => std::future::pending().await,
            None => Ok(Value::Null),
        }
    }
}

/// In-memory task repository mirroring the SQLite adapter's semantics.
#[derive(Default)]
pub struct InMemoryTaskRepository {
    tasks: Mutex<HashMap<Uuid, Task>>,
    steps: Mutex<Vec<Step>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_status(&self, id: Uuid) -> Option<TaskStatus> {
        self.tasks.lock().unwrap().get(&id).map(|t| t.status)
    }

    pub fn step_count(&self) -> usize {
        self.steps.lock().unwrap().len()
    }

    /// Synchronous step listing for assertions.
    pub fn list_steps_blocking(&self, task_id: Uuid) -> Vec<Step> {
        self.steps
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.task_id == task_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create_task(&self, task: &Task) -> Result<(), StoreError> {
        self.tasks.lock().unwrap().insert(task.id, task.clone());
        Ok(())
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.lock().unwrap().get(&id).cloned())
    }

    async fn set_task_status(&self, id: Uuid, status: TaskStatus) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.get_mut(&id).ok_or(StoreError::TaskNotFound(id))?;
        task.status = status;
        if status.is_terminal() {
            task.completed_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn create_step(&self, step: &Step) -> Result<(), StoreError> {
        self.steps.lock().unwrap().push(step.clone());
        Ok(())
    }

    async fn record_step_success(
        &self,
        step_id: Uuid,
        output: &Value,
        result: &Value,
    ) -> Result<(), StoreError> {
        let mut steps = self.steps.lock().unwrap();
        let step = steps
            .iter_mut()
            .find(|s| s.id == step_id)
            .ok_or(StoreError::StepNotFound(step_id))?;
        step.status = StepStatus::Completed;
        step.output = Some(output.clone());
        step.result = Some(result.clone());
        Ok(())
    }

    async fn record_step_failure(&self, step_id: Uuid, error: &str) -> Result<(), StoreError> {
        let mut steps = self.steps.lock().unwrap();
        let step = steps
            .iter_mut()
            .find(|s| s.id == step_id)
            .ok_or(StoreError::StepNotFound(step_id))?;
        step.status = StepStatus::Failed;
        step.error = Some(error.to_string());
        Ok(())
    }

    async fn list_steps(&self, task_id: Uuid) -> Result<Vec<Step>, StoreError> {
        Ok(self
            .steps
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.task_id == task_id)
            .cloned()
            .collect())
    }
}

/// Memory store in which every operation fails.
pub struct FailingMemoryStore;

#[async_trait]
impl MemoryStore for FailingMemoryStore {
    async fn record_step(&self, _step: &Step) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("memory store offline".to_string()))
    }

    async fn record_step_output(&self, _output: &StepOutput) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("memory store offline".to_string()))
    }

    async fn search_step_outputs(&self, _prompt: &str) -> Result<Vec<MemoryHit>, StoreError> {
        Err(StoreError::Unavailable("memory store offline".to_string()))
    }
}
