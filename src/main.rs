//! insight-engine CLI entry point.

use clap::Parser;

use insight_engine::cli::{handle_error, Cli, Commands};
use insight_engine::infrastructure::config::ConfigLoader;
use insight_engine::infrastructure::logging::Logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        // init runs before any config or logger exists.
        Commands::Init(args) => insight_engine::cli::commands::init::execute(args, cli.json).await,
        Commands::Run(args) => match ConfigLoader::load() {
            Ok(config) => match Logger::init(&config.logging) {
                Ok(_guard) => {
                    insight_engine::cli::commands::run::execute(args, &config, cli.json).await
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        },
        Commands::Steps(args) => match ConfigLoader::load() {
            Ok(config) => {
                insight_engine::cli::commands::steps::execute(args, &config, cli.json).await
            }
            Err(e) => Err(e),
        },
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
