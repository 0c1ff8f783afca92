//! Built-in abilities: workspace file access, memory search, and the
//! terminal `finish` marker.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

use crate::domain::models::{AbilityParameter, AbilitySpec};
use crate::domain::ports::{AbilityError, MemoryStore};

use super::registry::{required_str, AbilityHandler};

/// Resolve a model-supplied relative path inside the workspace root.
///
/// Absolute paths and parent-directory components are rejected so an
/// ability call can never escape the workspace.
fn resolve_workspace_path(
    root: &Path,
    relative: &str,
    ability: &str,
) -> Result<PathBuf, AbilityError> {
    let candidate = Path::new(relative);
    if candidate.is_absolute() {
        return Err(AbilityError::InvalidArguments {
            ability: ability.to_string(),
            reason: format!("path must be relative to the workspace: {relative}"),
        });
    }
    for component in candidate.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(AbilityError::InvalidArguments {
                    ability: ability.to_string(),
                    reason: format!("path escapes the workspace: {relative}"),
                })
            }
        }
    }
    Ok(root.join(candidate))
}

/// Read a UTF-8 file from the task workspace.
pub struct ReadFile {
    workspace_root: PathBuf,
}

impl ReadFile {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }
}

#[async_trait]
impl AbilityHandler for ReadFile {
    fn spec(&self) -> AbilitySpec {
        AbilitySpec {
            name: "read_file".to_string(),
            description: "Read the contents of a file in the workspace".to_string(),
            parameters: vec![AbilityParameter::required(
                "path",
                "string",
                "Workspace-relative path to read",
            )],
            output_type: "string".to_string(),
        }
    }

    async fn run(
        &self,
        _task_id: Uuid,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Value, AbilityError> {
        let relative = required_str(args, "path", "read_file")?;
        let path = resolve_workspace_path(&self.workspace_root, relative, "read_file")?;
        let contents = fs::read_to_string(&path).await.map_err(|e| {
            AbilityError::ExecutionFailed {
                ability: "read_file".to_string(),
                reason: format!("failed to read {relative}: {e}"),
            }
        })?;
        Ok(Value::String(contents))
    }
}

/// Write a UTF-8 file into the task workspace, creating parent
/// directories as needed.
pub struct WriteFile {
    workspace_root: PathBuf,
}

impl WriteFile {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }
}

#[async_trait]
impl AbilityHandler for WriteFile {
    fn spec(&self) -> AbilitySpec {
        AbilitySpec {
            name: "write_file".to_string(),
            description: "Write contents to a file in the workspace".to_string(),
            parameters: vec![
                AbilityParameter::required("path", "string", "Workspace-relative path to write"),
                AbilityParameter::required("contents", "string", "Text contents to write"),
            ],
            output_type: "string".to_string(),
        }
    }

    async fn run(
        &self,
        _task_id: Uuid,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Value, AbilityError> {
        let relative = required_str(args, "path", "write_file")?;
        let contents = required_str(args, "contents", "write_file")?;
        let path = resolve_workspace_path(&self.workspace_root, relative, "write_file")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AbilityError::ExecutionFailed {
                    ability: "write_file".to_string(),
                    reason: format!("failed to create directories for {relative}: {e}"),
                }
            })?;
        }
        fs::write(&path, contents).await.map_err(|e| {
            AbilityError::ExecutionFailed {
                ability: "write_file".to_string(),
                reason: format!("failed to write {relative}: {e}"),
            }
        })?;
        Ok(json!({ "path": relative, "bytes_written": contents.len() }))
    }
}

/// Search prior step outputs for context relevant to a query.
pub struct SearchMemory {
    memory: Arc<dyn MemoryStore>,
}

impl SearchMemory {
    pub fn new(memory: Arc<dyn MemoryStore>) -> Self {
        Self { memory }
    }
}

#[async_trait]
impl AbilityHandler for SearchMemory {
    fn spec(&self) -> AbilitySpec {
        AbilitySpec {
            name: "search_memory".to_string(),
            description: "Search previously recorded step outputs for relevant context"
                .to_string(),
            parameters: vec![AbilityParameter::required(
                "query",
                "string",
                "Text to match against prior results",
            )],
            output_type: "list".to_string(),
        }
    }

    async fn run(
        &self,
        _task_id: Uuid,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Value, AbilityError> {
        let query = required_str(args, "query", "search_memory")?;
        let hits = self
            .memory
            .search_step_outputs(query)
            .await
            .map_err(|e| AbilityError::ExecutionFailed {
                ability: "search_memory".to_string(),
                reason: e.to_string(),
            })?;
        let entries: Vec<Value> = hits
            .into_iter()
            .map(|hit| json!({ "thought": hit.thought, "value": hit.value }))
            .collect();
        Ok(Value::Array(entries))
    }
}

/// Terminal marker ability. Produces a closing summary and no side effects.
pub struct Finish;

#[async_trait]
impl AbilityHandler for Finish {
    fn spec(&self) -> AbilitySpec {
        AbilitySpec {
            name: "finish".to_string(),
            description: "Conclude the task with a final summary".to_string(),
            parameters: vec![AbilityParameter::optional(
                "reason",
                "string",
                "Closing summary of the task",
            )],
            output_type: "string".to_string(),
        }
    }

    async fn run(
        &self,
        _task_id: Uuid,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Value, AbilityError> {
        let reason = args
            .get("reason")
            .and_then(Value::as_str)
            .unwrap_or("task complete");
        Ok(Value::String(reason.to_string()))
    }
}
