//! Public configuration and result types for slot sessions.

use serde::{Deserialize, Serialize};

use crate::domain::models::{Config, TimeoutConfig};

/// Behaviour switches for one session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Keep game audio on.
    pub sound: bool,
    /// Reload the game to restore a free balance once the wager exceeds it.
    pub restore_balance: bool,
    /// Keep triggering while the engine reports free rounds, recording only the final result.
    pub free_rounds: bool,
    pub timeouts: TimeoutConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sound: false,
            restore_balance: true,
            free_rounds: false,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sound: config.sound,
            restore_balance: config.restore_balance,
            free_rounds: config.free_rounds_enabled(),
            timeouts: config.timeouts.clone(),
        }
    }
}

/// What a call to `spin` achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinSummary {
    /// Rounds recorded by this call.
    pub completed: u64,
    /// Whether the loop ended on a stop request rather than its count.
    pub cancelled: bool,
}
