//! `spinlog report`: statistics over recorded ledgers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::CsvLedgerStore;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::OutcomeRecord;
use crate::services::statistics::LedgerStats;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Ledger CSV files; their rounds are merged
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub files: Vec<String>,
    #[serde(flatten)]
    pub stats: LedgerStats,
}

impl CommandOutput for ReportOutput {
    fn to_human(&self) -> String {
        format!(
            "Ledgers: {}\n{}",
            self.files.join(", "),
            TableFormatter::new().format_stats(&self.stats)
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Read and merge every ledger in `files`.
pub fn load_records(files: &[PathBuf]) -> Result<Vec<OutcomeRecord>> {
    let mut records = Vec::new();
    for file in files {
        let mut ledger = CsvLedgerStore::read(file)
            .with_context(|| format!("failed to read ledger {}", file.display()))?;
        records.append(&mut ledger);
    }
    Ok(records)
}

pub fn execute(args: ReportArgs, json_mode: bool) -> Result<()> {
    let records = load_records(&args.files)?;
    let result = ReportOutput {
        files: args.files.iter().map(|f| f.display().to_string()).collect(),
        stats: LedgerStats::from_records(&records),
    };
    output(&result, json_mode);
    Ok(())
}
