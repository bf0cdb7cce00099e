//! Slot session - drives one playthrough of a remote slot game.
//!
//! The session is split into subsystems:
//!
//! - **types**: settings and spin summaries
//! - **surface**: the provider-specific half (`GameSurface`) and its two implementations
//! - **lifecycle**: loading the game and binding controls
//! - **spin_cycle**: the per-round state machine
//! - **recovery**: fund exhaustion and the single fatal shutdown path

pub mod dom_surface;
pub mod engine_surface;
mod lifecycle;
mod recovery;
mod spin_cycle;
pub mod surface;
pub mod types;

pub use surface::{surface_for, GameSurface};
pub use types::{SessionSettings, SpinSummary};

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::errors::{SessionError, SessionResult};
use crate::domain::models::{GameTarget, Ledger, OutcomeRecord, SpinPhase};
use crate::domain::ports::{Automation, LedgerStore, PageFetcher};
use crate::services::cancellation::StopSignal;
use crate::services::wait_condition::Waiter;

/// A single play attempt against one game.
///
/// Owns its automation handle and its ledger; not meant to be shared.
pub struct SlotSession {
    pub(super) id: Uuid,
    pub(super) target: GameTarget,
    pub(super) settings: SessionSettings,
    pub(super) driver: Arc<dyn Automation>,
    pub(super) fetcher: Option<Arc<dyn PageFetcher>>,
    pub(super) store: Arc<dyn LedgerStore>,
    pub(super) surface: Box<dyn GameSurface>,
    pub(super) waiter: Waiter,
    pub(super) ledger: Ledger,
    pub(super) phase: SpinPhase,
    /// Set by every load: the trigger's state right after a load must not
    /// be read as a round in progress.
    pub(super) just_loaded: bool,
    pub(super) closed: bool,
}

// ============================================================================
// Construction
// ============================================================================

/// Builder for [`SlotSession`].
pub struct SessionBuilder {
    target: GameTarget,
    driver: Arc<dyn Automation>,
    store: Arc<dyn LedgerStore>,
    settings: SessionSettings,
    fetcher: Option<Arc<dyn PageFetcher>>,
    stop: StopSignal,
}

impl SessionBuilder {
    #[must_use]
    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub fn stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn build(self) -> SessionResult<SlotSession> {
        if self.target.provider.embeds_frame() && self.fetcher.is_none() {
            return Err(SessionError::Resolution(format!(
                "{} games need a page fetcher to find the game frame",
                self.target.provider
            )));
        }

        let waiter = Waiter::new(self.settings.timeouts.poll_interval(), self.stop);
        Ok(SlotSession {
            id: Uuid::new_v4(),
            surface: surface_for(self.target.provider),
            target: self.target,
            settings: self.settings,
            driver: self.driver,
            fetcher: self.fetcher,
            store: self.store,
            waiter,
            ledger: Ledger::new(),
            phase: SpinPhase::Idle,
            just_loaded: false,
            closed: false,
        })
    }
}

impl SlotSession {
    pub fn builder(
        target: GameTarget,
        driver: Arc<dyn Automation>,
        store: Arc<dyn LedgerStore>,
    ) -> SessionBuilder {
        SessionBuilder {
            target,
            driver,
            store,
            settings: SessionSettings::default(),
            fetcher: None,
            stop: StopSignal::never(),
        }
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    pub const fn target(&self) -> &GameTarget {
        &self.target
    }

    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub const fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn records(&self) -> &[OutcomeRecord] {
        self.ledger.records()
    }

    // ========================================================================
    // Persistence & teardown
    // ========================================================================

    /// Write the whole ledger to the session's store.
    pub fn save(&self) -> SessionResult<()> {
        self.store.persist(self.ledger.records())?;
        info!(
            records = self.ledger.len(),
            path = %self.store.location().display(),
            "ledger saved"
        );
        Ok(())
    }

    /// Release the browser. Closing twice is a no-op.
    pub async fn close(&mut self) -> SessionResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        match self.driver.close().await {
            Ok(()) => {
                info!(session = %self.id, "session closed");
                Ok(())
            }
            // the window is already gone, which is what closing wants
            Err(err) if err.is_window_lost() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub(super) fn ensure_open(&self) -> SessionResult<()> {
        if self.closed {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }

    pub(super) fn transition(&mut self, next: SpinPhase) {
        if self.phase == next {
            return;
        }
        if !self.phase.can_transition_to(next) {
            warn!(from = %self.phase, to = %next, "unexpected spin phase transition");
        }
        debug!(from = %self.phase, to = %next, "spin phase");
        self.phase = next;
    }
}
