//! Domain models for slot sessions.

pub mod catalog;
pub mod config;
pub mod outcome;
pub mod spin_phase;

pub use catalog::{Catalog, GameTarget, Provider};
pub use config::{
    CatalogConfig, Config, LoggingConfig, OutputConfig, TimeoutConfig, WebDriverConfig,
};
pub use outcome::{now, parse_amount, Ledger, OutcomeRecord, TIMESTAMP_FORMAT};
pub use spin_phase::SpinPhase;
