//! Loading the game and binding its controls.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::errors::{SessionError, SessionResult};
use crate::domain::models::{now, OutcomeRecord, SpinPhase};

use super::SlotSession;

impl SlotSession {
    /// Navigate to the game and wait until it can be played.
    ///
    /// Appends an opening record holding the starting balance. A stop
    /// request is returned as-is; any other failure is fatal: the browser is
    /// released and the ledger flushed before the error is returned.
    #[instrument(skip(self), fields(session = %self.id, game = %self.target.name))]
    pub async fn load(&mut self) -> SessionResult<()> {
        match self.load_game().await {
            Ok(()) => Ok(()),
            Err(err) if err.is_cancellation() => {
                info!(reason = %err, "load interrupted");
                Err(err)
            }
            Err(err) => {
                let context = if err.is_timeout() {
                    format!("{} did not show up in time; browser closed", self.target.name)
                } else {
                    format!("failed to load {}; browser closed", self.target.name)
                };
                Err(self.abort(err, context).await)
            }
        }
    }

    /// Load steps without the shutdown path, shared with balance recovery.
    pub(super) async fn load_game(&mut self) -> SessionResult<()> {
        self.ensure_open()?;
        let driver = Arc::clone(&self.driver);
        let driver = driver.as_ref();

        let address = self.game_address().await?;
        info!(provider = %self.target.provider, %address, "loading game");
        driver.navigate(&address).await?;

        let timeouts = self.settings.timeouts.clone();
        {
            let bound = self.surface.ready_timeout(&timeouts);
            let mut ready = self.surface.ready_condition();
            self.waiter.until(driver, &mut ready, bound).await?;
        }
        self.surface
            .answer_sound_prompt(driver, self.settings.sound)
            .await?;
        {
            let mut idle = self.surface.idle_condition();
            self.waiter.until(driver, &mut idle, timeouts.load()).await?;
        }
        self.surface.mute(driver, self.settings.sound).await?;
        self.surface.bind_controls(driver).await?;

        let balance = self.surface.read_balance(driver).await?;
        self.ledger.append(OutcomeRecord::opening(now(), balance));
        self.just_loaded = true;
        self.phase = SpinPhase::Idle;

        info!(%balance, "game ready");
        Ok(())
    }

    /// Address to navigate to, following the frame indirection when needed.
    async fn game_address(&self) -> SessionResult<String> {
        if !self.target.provider.embeds_frame() {
            return Ok(self.target.address.clone());
        }

        let fetcher = self.fetcher.as_ref().ok_or_else(|| {
            SessionError::Resolution("no page fetcher configured".to_string())
        })?;
        let frame = fetcher.resolve_frame(&self.target.address).await?;
        debug!(page = %self.target.address, %frame, "resolved game frame");
        Ok(frame)
    }
}
