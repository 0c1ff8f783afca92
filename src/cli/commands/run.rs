//! Implementation of the `insight-engine run` command: execute one task
//! end to end.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adapters::abilities::builtin_registry;
use crate::adapters::sqlite::{create_pool, Migrator, SqliteMemoryStore, SqliteTaskRepository};
use crate::application::{TaskOrchestrator, TaskOutcome};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Task};
use crate::domain::ports::{MemoryStore, NullMemoryStore};
use crate::infrastructure::completion::OpenAiCompletionClient;
use crate::services::{Planner, PromptBuilder, RetryController, StepExecutor};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Natural-language task input
    pub input: String,

    /// Additional task parameters as a JSON object
    #[arg(long)]
    pub additional_input: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct RunOutput {
    pub task_id: Uuid,
    pub status: String,
    pub final_output: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Task {} finished: {}", self.task_id, self.status),
        ];
        if let Some(ref out) = self.final_output {
            lines.push(format!("Output: {out}"));
        }
        if let Some(ref err) = self.error {
            lines.push(format!("Error: {err}"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RunArgs, config: &Config, json_mode: bool) -> Result<()> {
    let orchestrator = build_orchestrator(config).await?;

    let mut task = Task::new(args.input);
    if let Some(raw) = args.additional_input.as_deref() {
        let params: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(raw).context("--additional-input must be a JSON object")?;
        task = task.with_additional_input(params);
    }
    let task_id = task.id;

    // Ctrl-C flips the cancel channel; the in-flight step is abandoned
    // and the task records Cancelled.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling task");
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = orchestrator.run_with_cancel(task, cancel_rx).await?;

    let output_data = match outcome {
        TaskOutcome::Completed { ref last_step } => RunOutput {
            task_id,
            status: "completed".to_string(),
            final_output: last_step.as_ref().and_then(|s| s.output.clone()),
            error: None,
        },
        TaskOutcome::Failed {
            ordinal,
            ref error,
            ref last_step,
        } => RunOutput {
            task_id,
            status: "failed".to_string(),
            final_output: last_step.as_ref().and_then(|s| s.output.clone()),
            error: Some(format!("step {ordinal} exhausted retries: {error}")),
        },
        TaskOutcome::Cancelled { ordinal } => RunOutput {
            task_id,
            status: "cancelled".to_string(),
            final_output: None,
            error: Some(format!("cancelled during step {ordinal}")),
        },
    };
    output(&output_data, json_mode);
    Ok(())
}

/// Wire the full orchestration stack from configuration.
async fn build_orchestrator(config: &Config) -> Result<TaskOrchestrator> {
    let db_url = format!("sqlite:{}", config.database.path);
    let pool = create_pool(&db_url, None)
        .await
        .context("Failed to open database; run `insight-engine init` first")?;
    Migrator::new(pool.clone())
        .run()
        .await
        .context("Failed to run database migrations")?;

    let tasks = Arc::new(SqliteTaskRepository::new(pool.clone()));

    let memory: Arc<dyn MemoryStore> = if config.memory.enabled {
        Arc::new(SqliteMemoryStore::new(pool, config.memory.search_limit))
    } else {
        info!("Memory enrichment disabled by configuration");
        Arc::new(NullMemoryStore)
    };

    let registry = Arc::new(builtin_registry(
        std::path::Path::new(&config.workspace.root),
        memory.clone(),
    ));

    let completion = Arc::new(
        OpenAiCompletionClient::from_config(&config.completion)
            .context("Failed to build completion client")?,
    );

    let prompts = PromptBuilder::new(config.completion.prompt_char_budget);
    let call_timeout = Duration::from_secs(config.completion.request_timeout_secs);

    let planner = Planner::new(completion.clone(), registry.clone(), prompts.clone());
    let executor = StepExecutor::new(
        completion,
        registry,
        tasks.clone(),
        memory,
        prompts,
        call_timeout,
    );
    let retry = RetryController::new(executor);

    Ok(TaskOrchestrator::new(planner, retry, tasks))
}
