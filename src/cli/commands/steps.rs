//! Implementation of the `insight-engine steps` command: list the step
//! records of a task, every attempt included.

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use uuid::Uuid;

use crate::adapters::sqlite::{create_pool, SqliteTaskRepository};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Step};
use crate::domain::ports::TaskRepository;

#[derive(Args, Debug)]
pub struct StepsArgs {
    /// Task id to list steps for
    pub task_id: Uuid,
}

#[derive(Debug, serde::Serialize)]
pub struct StepsOutput {
    pub task_id: Uuid,
    pub task_status: String,
    pub steps: Vec<Step>,
}

impl CommandOutput for StepsOutput {
    fn to_human(&self) -> String {
        if self.steps.is_empty() {
            return format!(
                "Task {} ({}): no steps recorded",
                self.task_id, self.task_status
            );
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "Attempt", "Status", "Input", "Error"]);

        for step in &self.steps {
            table.add_row(vec![
                Cell::new(step.ordinal),
                Cell::new(step.attempt),
                Cell::new(step.status.as_str()),
                Cell::new(truncate(&step.input, 60)),
                Cell::new(step.error.as_deref().map_or("-", |e| e)),
            ]);
        }

        format!(
            "Task {} ({})\n{table}",
            self.task_id, self.task_status
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars).collect();
        format!("{kept}…")
    }
}

pub async fn execute(args: StepsArgs, config: &Config, json_mode: bool) -> Result<()> {
    let db_url = format!("sqlite:{}", config.database.path);
    let pool = create_pool(&db_url, None)
        .await
        .context("Failed to open database; run `insight-engine init` first")?;
    let repo = SqliteTaskRepository::new(pool);

    let task = repo
        .get_task(args.task_id)
        .await?
        .with_context(|| format!("Task {} not found", args.task_id))?;
    let steps = repo.list_steps(args.task_id).await?;

    let output_data = StepsOutput {
        task_id: args.task_id,
        task_status: task.status.as_str().to_string(),
        steps,
    };
    output(&output_data, json_mode);
    Ok(())
}
