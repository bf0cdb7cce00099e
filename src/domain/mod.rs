//! Domain layer for slot sessions
//!
//! This module contains the session's models, errors and port traits.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{AutomationError, SessionError, SessionResult};
