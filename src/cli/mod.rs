//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::play::PlayArgs;
use commands::report::ReportArgs;

#[derive(Parser, Debug)]
#[command(name = "spinlog")]
#[command(about = "Play slot games automatically and record every round", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this YAML file instead of .spinlog/
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a game and play rounds, recording each outcome
    Play(PlayArgs),

    /// List the games that can be played
    Targets,

    /// Summarise one or more recorded ledgers
    Report(ReportArgs),
}

/// Print a command failure and exit with a non-zero status.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        let body = serde_json::json!({ "error": err.to_string(), "causes": chain });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
