//! The per-round state machine.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::errors::SessionResult;
use crate::domain::models::{now, OutcomeRecord, SpinPhase};
use crate::domain::ports::Automation;
use crate::services::reconciliation::{reconcile, WinCheck};

use super::{SlotSession, SpinSummary};

impl SlotSession {
    /// Play one round and record its outcome.
    ///
    /// A cancellation is returned as-is, and so is `SessionError::Closed`
    /// on a closed session. Any other failure shuts the session down
    /// (browser released, ledger flushed) before it is returned.
    pub async fn spin_once(&mut self) -> SessionResult<OutcomeRecord> {
        self.ensure_open()?;
        match self.play_round().await {
            Ok(record) => Ok(record),
            Err(err) => Err(self.escalate(err).await),
        }
    }

    /// Play `count` rounds, or keep playing until stopped when `count` is `None`.
    ///
    /// Stopping (stop signal, lost window) ends the loop without an error.
    #[instrument(skip(self), fields(session = %self.id, game = %self.target.name))]
    pub async fn spin(&mut self, count: Option<u64>) -> SessionResult<SpinSummary> {
        self.ensure_open()?;
        let mut summary = SpinSummary::default();

        loop {
            if count.is_some_and(|limit| summary.completed >= limit) {
                break;
            }
            if self.waiter.stop_signal().is_stopped() {
                info!("session terminated by user");
                summary.cancelled = true;
                break;
            }

            match self.play_round().await {
                Ok(record) => {
                    summary.completed += 1;
                    info!(
                        spin = summary.completed,
                        wager = %record.wager,
                        win = %record.win,
                        balance = %record.balance,
                        "spin resolved"
                    );
                }
                Err(err) if err.is_cancellation() => {
                    info!(reason = %err, "session terminated by user");
                    summary.cancelled = true;
                    break;
                }
                Err(err) => return Err(self.escalate(err).await),
            }
        }

        Ok(summary)
    }

    /// One round, without the shutdown path.
    pub(super) async fn play_round(&mut self) -> SessionResult<OutcomeRecord> {
        self.ensure_open()?;
        let driver = Arc::clone(&self.driver);
        let driver = driver.as_ref();

        self.transition(SpinPhase::Idle);
        let old_balance = self.ensure_funds(driver).await?;

        self.transition(SpinPhase::Triggering);
        self.trigger_round(driver).await?;
        let timestamp = now();

        loop {
            self.transition(SpinPhase::InProgress);
            self.await_resolution(driver).await?;
            self.transition(SpinPhase::Resolving);

            if !self.settings.free_rounds || !self.surface.free_round_pending(driver).await? {
                break;
            }
            debug!("free round pending, triggering again");
            self.transition(SpinPhase::Triggering);
            self.surface.trigger(driver).await?;
        }

        let balance = self.surface.read_balance(driver).await?;
        let wager = self.surface.read_wager(driver).await?;
        let raw_win = self.surface.read_win(driver).await?;

        let reconciled = reconcile(old_balance, wager, raw_win, balance);
        if let WinCheck::Inconsistent { reported } = reconciled.check {
            warn!(
                %old_balance, %wager, %reported, %balance,
                "win display contradicts balance, recording no win"
            );
        }

        let record = OutcomeRecord::new(timestamp, wager, reconciled.win, balance);
        self.ledger.append(record.clone());
        self.transition(SpinPhase::Resolved);
        Ok(record)
    }

    /// Start the round unless the fresh load already set it going.
    async fn trigger_round(&mut self, driver: &dyn Automation) -> SessionResult<()> {
        if self.just_loaded && !self.surface.trigger_ready(driver).await? {
            debug!("round already advancing after load, not triggering");
        } else {
            self.surface.trigger(driver).await?;
        }
        self.just_loaded = false;
        Ok(())
    }

    /// Wait for the round to start, then for its outcome to settle.
    async fn await_resolution(&mut self, driver: &dyn Automation) -> SessionResult<()> {
        let bound = self.settings.timeouts.resolve();
        {
            let mut started = self.surface.started_condition()?;
            self.waiter.until(driver, &mut started, bound).await?;
        }
        let mut settled = self.surface.settled_condition()?;
        self.waiter.until(driver, &mut settled, bound).await
    }
}
