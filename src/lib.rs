//! spinlog - slot machine session automation
//!
//! Drives browser-hosted slot games round by round and keeps a crash-safe
//! ledger of every outcome (time, wager, win, balance).
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - **Domain Layer** (`domain`): outcome ledger, game catalog, configuration, errors and ports
//! - **Service Layer** (`services`): wait conditions, the slot session state machine, reconciliation, statistics
//! - **Adapters** (`adapters`): WebDriver, page fetching, CSV storage and an in-process mock machine
//! - **Infrastructure Layer** (`infrastructure`): configuration loading and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use spinlog::adapters::{CsvLedgerStore, MockSlotMachine};
//! use spinlog::domain::models::{Catalog, Provider};
//! use spinlog::services::SlotSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let target = Catalog::default().resolve("red_hot", Provider::Igt)?;
//!     let driver = Arc::new(MockSlotMachine::demo(Provider::Igt));
//!     let store = Arc::new(CsvLedgerStore::new("slot_results.csv", true));
//!
//!     let mut session = SlotSession::builder(target, driver, store).build()?;
//!     session.load().await?;
//!     session.spin(Some(10)).await?;
//!     session.save()?;
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{Catalog, Config, GameTarget, Ledger, OutcomeRecord, Provider};
pub use domain::{AutomationError, SessionError, SessionResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{SlotSession, SpinSummary};
