//! Fund exhaustion and the fatal shutdown path.

use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::domain::errors::{SessionError, SessionResult};
use crate::domain::models::SpinPhase;
use crate::domain::ports::Automation;

use super::SlotSession;

impl SlotSession {
    /// Balance to play the next round from.
    ///
    /// When the wager exceeds the balance, the game is reloaded to get a
    /// fresh starting balance, or the round is refused if that is disabled.
    pub(super) async fn ensure_funds(&mut self, driver: &dyn Automation) -> SessionResult<Decimal> {
        let wager = self.surface.read_wager(driver).await?;
        let balance = self.surface.read_balance(driver).await?;
        if wager <= balance {
            return Ok(balance);
        }

        if !self.settings.restore_balance {
            return Err(SessionError::InsufficientFunds { wager, balance });
        }

        warn!(%wager, %balance, "balance exhausted, reloading game to restore it");
        self.load_game().await?;

        let wager = self.surface.read_wager(driver).await?;
        let balance = self.surface.read_balance(driver).await?;
        if wager > balance {
            return Err(SessionError::InsufficientFunds { wager, balance });
        }
        Ok(balance)
    }

    /// Shut down after a failed round unless the failure was a stop request.
    pub(super) async fn escalate(&mut self, err: SessionError) -> SessionError {
        if err.is_cancellation() {
            info!(reason = %err, "session stopped");
            return err;
        }

        let context = match err.root() {
            SessionError::TimedOut { .. } => format!(
                "lost contact with {} while {}; browser closed",
                self.target.name, self.phase
            ),
            SessionError::InsufficientFunds { .. } => {
                "balance too low for the wager; enable restore_balance to reload automatically"
                    .to_string()
            }
            _ => format!("round failed while {}; browser closed", self.phase),
        };
        self.abort(err, context).await
    }

    /// The single fatal exit: release the browser, flush the ledger, annotate the fault.
    ///
    /// Persistence failures here are logged and do not replace `fault`.
    pub(super) async fn abort(&mut self, fault: SessionError, context: String) -> SessionError {
        error!(session = %self.id, error = %fault, %context, "fatal session fault");
        self.transition(SpinPhase::Error);

        if !self.closed {
            self.closed = true;
            if let Err(err) = self.driver.close().await {
                warn!(error = %err, "failed to release browser during shutdown");
            }
        }

        if !self.ledger.is_empty() {
            if let Err(err) = self.save() {
                error!(error = %err, "could not flush ledger during shutdown");
            }
        }

        SessionError::Aborted {
            context,
            source: Box::new(fault),
        }
    }
}
