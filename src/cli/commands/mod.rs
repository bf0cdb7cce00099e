//! CLI command implementations.

pub mod play;
pub mod report;
pub mod targets;
