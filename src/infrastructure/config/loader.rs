use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Completion base_url cannot be empty")]
    EmptyBaseUrl,

    #[error("Completion model cannot be empty")]
    EmptyModel,

    #[error("Invalid prompt_char_budget: {0}. Must be at least 1024")]
    InvalidPromptBudget(usize),

    #[error("Invalid memory search_limit: {0}. Must be at least 1")]
    InvalidSearchLimit(usize),

    #[error("Workspace root cannot be empty")]
    EmptyWorkspaceRoot,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .insight/config.yaml (project config, created by init)
    /// 3. .insight/local.yaml (project local overrides, optional)
    /// 4. Environment variables (INSIGHT_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.insight/) so multiple
    /// agents on one machine can work against different projects.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".insight/config.yaml"))
            .merge(Yaml::file(".insight/local.yaml"))
            .merge(Env::prefixed("INSIGHT_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.completion.base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        if config.completion.model.is_empty() {
            return Err(ConfigError::EmptyModel);
        }

        if config.completion.prompt_char_budget < 1024 {
            return Err(ConfigError::InvalidPromptBudget(
                config.completion.prompt_char_budget,
            ));
        }

        if config.memory.search_limit == 0 {
            return Err(ConfigError::InvalidSearchLimit(config.memory.search_limit));
        }

        if config.workspace.root.is_empty() {
            return Err(ConfigError::EmptyWorkspaceRoot);
        }

        Ok(())
    }
}
