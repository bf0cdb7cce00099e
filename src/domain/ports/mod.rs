//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces that adapters must implement:
//! - Automation: browser automation against the game page
//! - PageFetcher: one-shot HTML fetch used to find an embedded game frame
//! - LedgerStore: durable storage for the outcome ledger

pub mod automation;
pub mod ledger_store;
pub mod page_fetcher;

pub use automation::{Automation, AutomationResult, ControlRef, Locator};
pub use ledger_store::LedgerStore;
pub use page_fetcher::PageFetcher;
