//! SQLite implementation of the `TaskRepository` port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::models::{Step, StepPayload, StepStatus, Task, TaskStatus};
use crate::domain::ports::{StoreError, TaskRepository};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create_task(&self, task: &Task) -> Result<(), StoreError> {
        let additional_input =
            serde_json::to_string(&Value::Object(task.additional_input.clone()))?;

        sqlx::query(
            r"INSERT INTO tasks (id, input, additional_input, status, created_at, completed_at)
              VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(task.id.to_string())
        .bind(&task.input)
        .bind(&additional_input)
        .bind(task.status.as_str())
        .bind(task.created_at.to_rfc3339())
        .bind(task.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn set_task_status(&self, id: Uuid, status: TaskStatus) -> Result<(), StoreError> {
        let completed_at = status.is_terminal().then(|| Utc::now().to_rfc3339());

        let result = sqlx::query("UPDATE tasks SET status = ?, completed_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(completed_at)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TaskNotFound(id));
        }
        Ok(())
    }

    async fn create_step(&self, step: &Step) -> Result<(), StoreError> {
        let additional_input = serde_json::to_string(&step.additional_input)?;

        sqlx::query(
            r"INSERT INTO steps (id, task_id, input, additional_input, ordinal, attempt,
              is_last, status, output, result, error, created_at)
              VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(step.id.to_string())
        .bind(step.task_id.to_string())
        .bind(&step.input)
        .bind(&additional_input)
        .bind(i64::from(step.ordinal))
        .bind(i64::from(step.attempt))
        .bind(i32::from(step.is_last))
        .bind(step.status.as_str())
        .bind(step.output.as_ref().map(ToString::to_string))
        .bind(step.result.as_ref().map(ToString::to_string))
        .bind(&step.error)
        .bind(step.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_step_success(
        &self,
        step_id: Uuid,
        output: &Value,
        result: &Value,
    ) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE steps SET status = ?, output = ?, result = ?, error = NULL WHERE id = ?",
        )
        .bind(StepStatus::Completed.as_str())
        .bind(output.to_string())
        .bind(result.to_string())
        .bind(step_id.to_string())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::StepNotFound(step_id));
        }
        Ok(())
    }

    async fn record_step_failure(&self, step_id: Uuid, error: &str) -> Result<(), StoreError> {
        let updated = sqlx::query("UPDATE steps SET status = ?, error = ? WHERE id = ?")
            .bind(StepStatus::Failed.as_str())
            .bind(error)
            .bind(step_id.to_string())
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::StepNotFound(step_id));
        }
        Ok(())
    }

    async fn list_steps(&self, task_id: Uuid) -> Result<Vec<Step>, StoreError> {
        let rows: Vec<StepRow> = sqlx::query_as(
            "SELECT * FROM steps WHERE task_id = ? ORDER BY ordinal ASC, attempt ASC",
        )
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    input: String,
    additional_input: String,
    status: String,
    created_at: String,
    completed_at: Option<String>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let additional_input = match serde_json::from_str(&row.additional_input)? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        Ok(Task {
            id: Uuid::parse_str(&row.id)?,
            input: row.input,
            additional_input,
            status: TaskStatus::from_str(&row.status).unwrap_or(TaskStatus::Created),
            created_at: parse_timestamp(&row.created_at)?,
            completed_at: row.completed_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StepRow {
    id: String,
    task_id: String,
    input: String,
    additional_input: String,
    ordinal: i64,
    attempt: i64,
    is_last: i64,
    status: String,
    output: Option<String>,
    result: Option<String>,
    error: Option<String>,
    created_at: String,
}

impl TryFrom<StepRow> for Step {
    type Error = StoreError;

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn try_from(row: StepRow) -> Result<Self, Self::Error> {
        let additional_input: StepPayload = serde_json::from_str(&row.additional_input)?;

        Ok(Step {
            id: Uuid::parse_str(&row.id)?,
            task_id: Uuid::parse_str(&row.task_id)?,
            input: row.input,
            additional_input,
            ordinal: row.ordinal as u32,
            attempt: row.attempt as u32,
            is_last: row.is_last != 0,
            status: StepStatus::from_str(&row.status).unwrap_or(StepStatus::Created),
            output: row.output.as_deref().map(serde_json::from_str).transpose()?,
            result: row.result.as_deref().map(serde_json::from_str).transpose()?,
            error: row.error,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}
