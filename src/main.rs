//! spinlog CLI entry point.

use anyhow::Result;
use clap::Parser;

use spinlog::cli::{commands, handle_error, Cli, Commands};
use spinlog::infrastructure::config::ConfigLoader;
use spinlog::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&config.logging)?;

    match cli.command {
        Commands::Play(args) => commands::play::execute(args, config, cli.json).await,
        Commands::Targets => commands::targets::execute(&config, cli.json),
        Commands::Report(args) => commands::report::execute(args, cli.json),
    }
}
