//! Implementation of the `insight-engine init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use crate::adapters::sqlite::{create_pool, Migrator};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization even if already initialized
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub directories_created: Vec<String>,
    pub database_initialized: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {dir}"));
            }
        }
        if self.database_initialized {
            lines.push("\nDatabase initialized at .insight/insight.db".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let insight_dir = target_path.join(".insight");

    if insight_dir.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Project already initialized. Use --force to reinitialize.".to_string(),
            initialized_path: target_path,
            directories_created: vec![],
            database_initialized: false,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    if args.force && insight_dir.exists() {
        fs::remove_dir_all(&insight_dir)
            .await
            .context("Failed to remove existing .insight directory")?;
    }

    let defaults = Config::default();
    let mut directories_created = vec![];

    let dirs = [
        insight_dir.clone(),
        insight_dir.join("logs"),
        target_path.join(&defaults.workspace.root),
    ];
    for dir in &dirs {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {dir:?}"))?;
            let relative = dir
                .strip_prefix(&target_path)
                .unwrap_or(dir)
                .to_string_lossy()
                .to_string();
            directories_created.push(relative);
        }
    }

    // Seed a commented starter config so overrides are discoverable.
    let config_path = insight_dir.join("config.yaml");
    if !config_path.exists() {
        fs::write(&config_path, starter_config())
            .await
            .context("Failed to write .insight/config.yaml")?;
    }

    let db_path = target_path.join(&defaults.database.path);
    let db_url = format!("sqlite:{}", db_path.display());
    let pool = create_pool(&db_url, None)
        .await
        .context("Failed to open database")?;
    Migrator::new(pool)
        .run()
        .await
        .context("Failed to run database migrations")?;

    let output_data = InitOutput {
        success: true,
        message: if args.force {
            "Project reinitialized successfully.".to_string()
        } else {
            "Project initialized successfully.".to_string()
        },
        initialized_path: target_path,
        directories_created,
        database_initialized: true,
    };
    output(&output_data, json_mode);
    Ok(())
}

fn starter_config() -> &'static str {
    r"# insight-engine project configuration.
# Values here override built-in defaults; .insight/local.yaml overrides
# this file, and INSIGHT_* environment variables override everything.
#
# completion:
#   model: gpt-3.5-turbo
#   temperature: 0.2
# logging:
#   level: info
#   format: pretty
# memory:
#   enabled: true
#   search_limit: 3
"
}
