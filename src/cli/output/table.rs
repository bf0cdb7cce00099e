//! Table output formatting for CLI commands
//!
//! Tables for game targets and ledger statistics using comfy-table.

use std::env;

use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::domain::models::{GameTarget, Provider};
use crate::services::statistics::LedgerStats;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<usize>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format the known game targets
    pub fn format_targets(&self, targets: &[GameTarget]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Game", "Provider", "Address"]));

        for target in targets {
            let provider = if self.use_colors {
                Cell::new(target.provider).fg(provider_color(target.provider))
            } else {
                Cell::new(target.provider)
            };
            table.add_row(vec![Cell::new(&target.name), provider, Cell::new(&target.address)]);
        }

        table.to_string()
    }

    /// Format ledger totals followed by the win-multiple distribution
    pub fn format_stats(&self, stats: &LedgerStats) -> String {
        let mut summary = self.create_base_table();
        summary.set_header(header(&["Rounds", "Wagered", "Won", "RTP"]));
        summary.add_row(vec![
            Cell::new(stats.rounds).set_alignment(CellAlignment::Right),
            Cell::new(stats.total_wagered).set_alignment(CellAlignment::Right),
            Cell::new(stats.total_won).set_alignment(CellAlignment::Right),
            Cell::new(stats.rtp.map_or_else(|| "-".to_string(), |rtp| format!("{:.2}%", rtp * 100.0)))
                .set_alignment(CellAlignment::Right),
        ]);

        let mut distribution = self.create_base_table();
        distribution.set_header(header(&["Win / Wager", "Rounds", "Probability"]));
        for bucket in &stats.distribution {
            let label = if self.use_colors && bucket.label == "Loss" {
                Cell::new(&bucket.label).fg(Color::Red)
            } else {
                Cell::new(&bucket.label)
            };
            distribution.add_row(vec![
                label,
                Cell::new(bucket.rounds).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4}", bucket.probability)).set_alignment(CellAlignment::Right),
            ]);
        }

        format!("{summary}\n{distribution}")
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(u16::try_from(width).unwrap_or(u16::MAX));
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

const fn provider_color(provider: Provider) -> Color {
    match provider {
        Provider::Igt => Color::Cyan,
        Provider::Aristocrat => Color::Magenta,
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}
