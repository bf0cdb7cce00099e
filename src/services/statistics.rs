//! Return-to-player statistics over recorded rounds.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::models::OutcomeRecord;

/// Upper bounds (inclusive) of the win/wager multiple buckets after "Loss".
const MULTIPLE_BOUNDS: &[f64] = &[0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0];

/// Share of rounds whose win fell into one multiple bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub rounds: u64,
    pub probability: f64,
}

/// Summary of a set of played rounds.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStats {
    pub rounds: u64,
    pub total_wagered: Decimal,
    pub total_won: Decimal,
    /// Won divided by wagered; `None` before any round.
    pub rtp: Option<f64>,
    /// Running mean of win/wager after each round.
    pub rtp_series: Vec<f64>,
    pub distribution: Vec<Bucket>,
}

impl LedgerStats {
    /// Statistics over `records`, ordered by timestamp. Opening rows are ignored.
    pub fn from_records(records: &[OutcomeRecord]) -> Self {
        let mut rounds: Vec<&OutcomeRecord> = records.iter().filter(|r| r.wager > Decimal::ZERO).collect();
        rounds.sort_by_key(|r| r.timestamp);

        let mut labels = vec!["Loss".to_string()];
        labels.extend(MULTIPLE_BOUNDS.iter().map(|bound| format!("<={bound}x")));
        labels.push(format!(">{}x", MULTIPLE_BOUNDS[MULTIPLE_BOUNDS.len() - 1]));
        let mut counts = vec![0u64; labels.len()];

        let mut total_wagered = Decimal::ZERO;
        let mut total_won = Decimal::ZERO;
        let mut ratio_sum = 0.0;
        let mut rtp_series = Vec::with_capacity(rounds.len());

        for (index, record) in rounds.iter().enumerate() {
            total_wagered += record.wager;
            total_won += record.win;

            let ratio = (record.win / record.wager).to_f64().unwrap_or(0.0);
            ratio_sum += ratio;
            rtp_series.push(ratio_sum / (index + 1) as f64);

            counts[bucket_index(ratio)] += 1;
        }

        let played = rounds.len() as u64;
        let distribution = labels
            .into_iter()
            .zip(counts)
            .map(|(label, count)| Bucket {
                label,
                rounds: count,
                probability: if played == 0 { 0.0 } else { count as f64 / played as f64 },
            })
            .collect();

        let rtp = if total_wagered.is_zero() {
            None
        } else {
            (total_won / total_wagered).to_f64()
        };

        Self {
            rounds: played,
            total_wagered,
            total_won,
            rtp,
            rtp_series,
            distribution,
        }
    }
}

fn bucket_index(ratio: f64) -> usize {
    if ratio <= 0.0 {
        return 0;
    }
    MULTIPLE_BOUNDS
        .iter()
        .position(|bound| ratio <= *bound)
        .map_or(MULTIPLE_BOUNDS.len() + 1, |position| position + 1)
}
