//! Games driven through the engine's script state.
//!
//! Readiness, round progress and amounts are all read by evaluating
//! expressions against the game's global objects; nothing is clicked.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::errors::SessionResult;
use crate::domain::models::TimeoutConfig;
use crate::domain::ports::Automation;
use crate::services::wait_condition::WaitCondition;

use super::surface::{amount_from_value, is_truthy, require_amount, GameSurface};

/// Expressions evaluated in the game frame.
pub mod scripts {
    /// Height of the first reel; numeric once the reels are drawn.
    pub const REELS_HEIGHT: &str = "return reels['position'][0]['height'];";
    pub const ACTION: &str = "return game.action;";
    /// Opens the settings menu, toggles sound, closes the menu again.
    pub const MUTE: &str =
        "game['settingStandard'](); game['settingStandardSound'](); game['settingStandard']();";
    pub const WAGER: &str = "return game.getCash(game.config['betInfo']['totalBet']);";
    pub const BALANCE: &str = "return game.getCash(game.config['balance']);";
    pub const WIN: &str = "return game.getCash(game.config['win']);";
    pub const SPIN: &str = "game.actionSpin();";
    pub const FREE_SPIN: &str = "return game.config.freeSpin;";
}

/// Values of `game.action` the surface waits on.
pub mod actions {
    pub const IDLE: &[&str] = &["normal"];
    pub const SPINNING: &[&str] = &["spin"];
    pub const SETTLED: &[&str] = &["normal", "spin_OR_gamble"];
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineSurface;

#[async_trait]
impl GameSurface for EngineSurface {
    fn ready_condition(&self) -> WaitCondition<'_> {
        WaitCondition::EngineNumeric {
            query: scripts::REELS_HEIGHT,
        }
    }

    fn ready_timeout(&self, timeouts: &TimeoutConfig) -> Duration {
        timeouts.load()
    }

    async fn answer_sound_prompt(&self, _driver: &dyn Automation, _sound: bool) -> SessionResult<()> {
        Ok(())
    }

    fn idle_condition(&self) -> WaitCondition<'_> {
        WaitCondition::EngineState {
            query: scripts::ACTION,
            accepted: actions::IDLE,
        }
    }

    async fn mute(&self, driver: &dyn Automation, sound: bool) -> SessionResult<()> {
        if !sound {
            debug!("disabling game audio");
            driver.evaluate(scripts::MUTE).await?;
        }
        Ok(())
    }

    async fn bind_controls(&mut self, _driver: &dyn Automation) -> SessionResult<()> {
        Ok(())
    }

    async fn read_wager(&self, driver: &dyn Automation) -> SessionResult<Decimal> {
        require_amount("wager", &driver.evaluate(scripts::WAGER).await?)
    }

    async fn read_balance(&self, driver: &dyn Automation) -> SessionResult<Decimal> {
        require_amount("balance", &driver.evaluate(scripts::BALANCE).await?)
    }

    async fn read_win(&self, driver: &dyn Automation) -> SessionResult<Option<Decimal>> {
        Ok(amount_from_value(&driver.evaluate(scripts::WIN).await?))
    }

    async fn trigger_ready(&self, driver: &dyn Automation) -> SessionResult<bool> {
        let action = driver.evaluate(scripts::ACTION).await?;
        Ok(action
            .as_str()
            .is_some_and(|state| actions::IDLE.contains(&state)))
    }

    async fn trigger(&self, driver: &dyn Automation) -> SessionResult<()> {
        driver.evaluate(scripts::SPIN).await?;
        Ok(())
    }

    fn started_condition(&self) -> SessionResult<WaitCondition<'_>> {
        Ok(WaitCondition::EngineState {
            query: scripts::ACTION,
            accepted: actions::SPINNING,
        })
    }

    fn settled_condition(&mut self) -> SessionResult<WaitCondition<'_>> {
        Ok(WaitCondition::EngineState {
            query: scripts::ACTION,
            accepted: actions::SETTLED,
        })
    }

    async fn free_round_pending(&self, driver: &dyn Automation) -> SessionResult<bool> {
        Ok(is_truthy(&driver.evaluate(scripts::FREE_SPIN).await?))
    }
}
