//! Ledger store port - durable storage for outcome records.

use std::path::Path;

use crate::domain::errors::SessionResult;
use crate::domain::models::OutcomeRecord;

pub trait LedgerStore: Send + Sync {
    /// Where records end up, for log messages.
    fn location(&self) -> &Path;

    /// Replace the stored ledger with `records`, in order.
    fn persist(&self, records: &[OutcomeRecord]) -> SessionResult<()>;
}
