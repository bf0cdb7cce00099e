//! Outcome records and the append-only ledger.

use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Timestamp layout used for ledger rows (`2019-06-03 14:02:11.523418`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// The monetary outcome of one round, or the opening balance after a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub timestamp: NaiveDateTime,
    pub wager: Decimal,
    pub win: Decimal,
    pub balance: Decimal,
}

impl OutcomeRecord {
    pub const fn new(timestamp: NaiveDateTime, wager: Decimal, win: Decimal, balance: Decimal) -> Self {
        Self {
            timestamp,
            wager,
            win,
            balance,
        }
    }

    /// Synthetic row written after every (re)load: nothing staked, nothing won.
    pub fn opening(timestamp: NaiveDateTime, balance: Decimal) -> Self {
        Self::new(timestamp, Decimal::ZERO, Decimal::ZERO, balance)
    }

    pub fn is_opening(&self) -> bool {
        self.wager.is_zero() && self.win.is_zero()
    }

    /// Whether `self` follows `previous` without money appearing or vanishing.
    pub fn follows(&self, previous: &Self) -> bool {
        previous.balance - self.wager + self.win == self.balance
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Current local wall-clock time, as recorded in ledger rows.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Append-only, insertion-ordered sequence of outcome records.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<OutcomeRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: OutcomeRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&OutcomeRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of played rounds, excluding opening rows.
    pub fn rounds(&self) -> usize {
        self.records.iter().filter(|r| !r.is_opening()).count()
    }
}

/// Parse a displayed currency amount such as `1,250.00`, `$ 3.50` or `3.50 FPY`.
///
/// Returns `None` for blank or non-numeric text.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let numeric = cleaned
        .trim_start_matches(|c: char| !(c.is_ascii_digit() || c == '-' || c == '.'))
        .trim_end_matches(|c: char| !c.is_ascii_digit());
    if numeric.is_empty() {
        return None;
    }
    Decimal::from_str(numeric).ok()
}
