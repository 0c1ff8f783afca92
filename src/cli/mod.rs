//! Command-line interface for the insight engine.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

pub use output::{handle_error, output, CommandOutput};

#[derive(Parser, Debug)]
#[command(
    name = "insight-engine",
    about = "Plan-and-execute agent for data insight tasks",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a project directory (.insight/, workspace, database)
    Init(commands::init::InitArgs),
    /// Run one task to completion
    Run(commands::run::RunArgs),
    /// List the recorded steps of a task
    Steps(commands::steps::StepsArgs),
}
