//! In-process slot machine for tests and dry runs.
//!
//! [`MockSlotMachine`] answers the same scripts and XPath expressions the
//! game surfaces use, so a session drives it exactly like a real page. Time
//! advances with each poll of the round state, not with the wall clock.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::adapters::http_fetcher::extract_frame_src;
use crate::domain::errors::{AutomationError, SessionError, SessionResult};
use crate::domain::models::{OutcomeRecord, Provider};
use crate::domain::ports::{
    Automation, AutomationResult, ControlRef, LedgerStore, Locator, PageFetcher,
};
use crate::services::cancellation::StopHandle;
use crate::services::slot_session::dom_surface::xpaths;
use crate::services::slot_session::engine_surface::scripts;

/// Polls of the round state a spin stays in progress for.
pub const SPIN_POLLS: u32 = 2;

const REELS_HEIGHT_PX: u64 = 540;

mod ids {
    pub const SOUND_PROMPT: &str = "sound-prompt";
    pub const SOUND_YES: &str = "sound-yes";
    pub const SOUND_NO: &str = "sound-no";
    pub const TOTAL_BET_LABEL: &str = "total-bet-label";
    pub const WAGER: &str = "wager";
    pub const BALANCE: &str = "balance";
    pub const WIN: &str = "win";
    pub const SPIN: &str = "spin";
    pub const SKIP: &str = "skip";
    pub const BONUS: &str = "bonus";
    pub const BROKEN: &str = "broken";
    pub const INSUFFICIENT_FUNDS: &str = "insufficient-funds";
}

/// Scripted outcome of one paid round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRound {
    pub win: Decimal,
    /// Text shown in the win display instead of `win`.
    pub displayed_win: Option<String>,
    /// Free rounds the engine reports after this round settles.
    pub free_rounds: u32,
    /// Hold the round behind a dialog that has to be clicked away.
    pub interstitial: bool,
    /// Never settle.
    pub stall: bool,
}

impl MockRound {
    pub const fn lose() -> Self {
        Self {
            win: Decimal::ZERO,
            displayed_win: None,
            free_rounds: 0,
            interstitial: false,
            stall: false,
        }
    }

    pub fn win(amount: Decimal) -> Self {
        Self {
            win: amount,
            ..Self::lose()
        }
    }

    pub fn stall() -> Self {
        Self {
            stall: true,
            ..Self::lose()
        }
    }

    #[must_use]
    pub fn displaying(mut self, text: impl Into<String>) -> Self {
        self.displayed_win = Some(text.into());
        self
    }

    #[must_use]
    pub const fn with_free_rounds(mut self, count: u32) -> Self {
        self.free_rounds = count;
        self
    }

    #[must_use]
    pub const fn with_interstitial(mut self) -> Self {
        self.interstitial = true;
        self
    }

    fn display(&self) -> String {
        self.displayed_win.clone().unwrap_or_else(|| {
            if self.win.is_zero() {
                String::new()
            } else {
                self.win.to_string()
            }
        })
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Loading { polls_left: u32 },
    /// Page is up, sound preference not answered yet.
    Prompt,
    Idle,
    /// `None` marks a free round.
    Spinning {
        polls_left: u32,
        round: Option<MockRound>,
    },
    Interstitial,
}

#[derive(Debug)]
struct MachineState {
    provider: Provider,
    starting_balance: Decimal,
    balance: Decimal,
    wager: Decimal,
    win_display: String,
    phase: Phase,
    loading_polls: u32,
    never_ready: bool,
    autostart: bool,
    queue: VecDeque<MockRound>,
    pattern: Vec<MockRound>,
    cursor: usize,
    free_pending: u32,
    insufficient_dialog: bool,
    broken_control: bool,
    lose_window_after: Option<u64>,
    stop_after: Option<(u64, StopHandle)>,
    window_lost: bool,
    closed: bool,
    // telemetry
    visited: Vec<String>,
    triggers: u64,
    settled: u64,
    dismissals: u64,
    muted: bool,
    sound_choice: Option<bool>,
}

impl MachineState {
    fn check_window(&self) -> AutomationResult<()> {
        if self.closed {
            return Err(AutomationError::NoSuchWindow("browser was closed".to_string()));
        }
        if self.window_lost {
            return Err(AutomationError::NoSuchWindow("target window already closed".to_string()));
        }
        Ok(())
    }

    const fn is_loaded(&self) -> bool {
        !matches!(self.phase, Phase::Loading { .. } | Phase::Prompt)
    }

    fn next_round(&mut self) -> MockRound {
        if let Some(round) = self.queue.pop_front() {
            return round;
        }
        if self.pattern.is_empty() {
            return MockRound::lose();
        }
        let round = self.pattern[self.cursor % self.pattern.len()].clone();
        self.cursor += 1;
        round
    }

    /// Start a round from the idle state. Free rounds are played before paid ones.
    fn start_round(&mut self) {
        if let Some((after, handle)) = &self.stop_after {
            if self.settled >= *after {
                handle.stop();
            }
        }
        self.triggers += 1;
        let round = if self.free_pending > 0 {
            self.free_pending -= 1;
            None
        } else {
            Some(self.next_round())
        };
        self.phase = Phase::Spinning {
            polls_left: SPIN_POLLS,
            round,
        };
    }

    /// Advance the loading countdown; true once the game is up.
    fn tick_loading(&mut self) -> bool {
        match &mut self.phase {
            Phase::Loading { polls_left } if self.never_ready => {
                *polls_left = polls_left.saturating_sub(1);
                false
            }
            Phase::Loading { polls_left } => {
                if *polls_left > 0 {
                    *polls_left -= 1;
                    return false;
                }
                self.phase = match self.provider {
                    Provider::Igt => Phase::Prompt,
                    Provider::Aristocrat => Phase::Idle,
                };
                true
            }
            _ => true,
        }
    }

    /// Advance a spinning round by one poll, settling it when due.
    fn tick_round(&mut self) {
        let Phase::Spinning { polls_left, round } = &mut self.phase else {
            return;
        };
        if round.as_ref().is_some_and(|r| r.stall) {
            return;
        }
        if *polls_left > 0 {
            *polls_left -= 1;
            return;
        }

        let round = round.take();
        self.phase = Phase::Idle;
        let Some(round) = round else {
            return;
        };

        self.balance = self.balance - self.wager + round.win;
        self.win_display = round.display();
        self.free_pending = round.free_rounds;
        if round.interstitial && self.provider == Provider::Igt {
            self.phase = Phase::Interstitial;
        }

        self.settled += 1;
        if self.lose_window_after.is_some_and(|after| self.settled >= after) {
            self.window_lost = true;
        }
    }

    fn action(&self) -> &'static str {
        match self.phase {
            Phase::Spinning { .. } => "spin",
            _ => "normal",
        }
    }

    fn finish_load(&mut self) {
        self.phase = Phase::Idle;
        if self.autostart {
            self.start_round();
        }
    }
}

/// Scriptable stand-in for a browser running one slot game.
#[derive(Debug)]
pub struct MockSlotMachine {
    provider: Provider,
    state: Mutex<MachineState>,
}

impl MockSlotMachine {
    /// Machine with a balance of 100 and a wager of 1 that loses every round.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            state: Mutex::new(MachineState {
                provider,
                starting_balance: Decimal::from(100),
                balance: Decimal::from(100),
                wager: Decimal::ONE,
                win_display: String::new(),
                phase: Phase::Loading { polls_left: 1 },
                loading_polls: 1,
                never_ready: false,
                autostart: false,
                queue: VecDeque::new(),
                pattern: Vec::new(),
                cursor: 0,
                free_pending: 0,
                insufficient_dialog: false,
                broken_control: false,
                lose_window_after: None,
                stop_after: None,
                window_lost: false,
                closed: false,
                visited: Vec::new(),
                triggers: 0,
                settled: 0,
                dismissals: 0,
                muted: false,
                sound_choice: None,
            }),
        }
    }

    /// A machine for dry runs: a large balance and a repeating mix of outcomes.
    pub fn demo(provider: Provider) -> Self {
        let mut bonus = MockRound::win(Decimal::from(25)).with_interstitial();
        if provider == Provider::Aristocrat {
            bonus = bonus.with_free_rounds(3);
        }
        Self::new(provider)
            .with_balance(Decimal::from(1000))
            .with_pattern(vec![
                MockRound::lose(),
                MockRound::win(Decimal::new(5, 1)),
                MockRound::lose(),
                MockRound::win(Decimal::from(2)),
                MockRound::lose(),
                MockRound::lose(),
                bonus,
                MockRound::win(Decimal::ONE),
            ])
    }

    #[must_use]
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        let state = self.state.get_mut();
        state.starting_balance = balance;
        state.balance = balance;
        self
    }

    #[must_use]
    pub fn with_wager(mut self, wager: Decimal) -> Self {
        self.state.get_mut().wager = wager;
        self
    }

    /// Rounds played in order before the pattern (or plain losses) take over.
    #[must_use]
    pub fn with_rounds(mut self, rounds: Vec<MockRound>) -> Self {
        self.state.get_mut().queue = rounds.into();
        self
    }

    /// Rounds repeated forever once the scripted queue is used up.
    #[must_use]
    pub fn with_pattern(mut self, pattern: Vec<MockRound>) -> Self {
        self.state.get_mut().pattern = pattern;
        self
    }

    #[must_use]
    pub fn with_loading_polls(mut self, polls: u32) -> Self {
        let state = self.state.get_mut();
        state.loading_polls = polls;
        state.phase = Phase::Loading { polls_left: polls };
        self
    }

    /// The game never finishes loading.
    #[must_use]
    pub fn never_ready(mut self) -> Self {
        self.state.get_mut().never_ready = true;
        self
    }

    /// Every load sets a round going on its own.
    #[must_use]
    pub fn autostart(mut self) -> Self {
        self.state.get_mut().autostart = true;
        self
    }

    /// The window disappears once `rounds` rounds have settled.
    #[must_use]
    pub fn lose_window_after(mut self, rounds: u64) -> Self {
        self.state.get_mut().lose_window_after = Some(rounds);
        self
    }

    /// Raise `handle` when a round is started after `rounds` have settled.
    #[must_use]
    pub fn stop_after(mut self, rounds: u64, handle: StopHandle) -> Self {
        self.state.get_mut().stop_after = Some((rounds, handle));
        self
    }

    /// Add a control next to the spin button that errors when inspected.
    #[must_use]
    pub fn with_broken_control(mut self) -> Self {
        self.state.get_mut().broken_control = true;
        self
    }

    pub const fn provider(&self) -> Provider {
        self.provider
    }

    /// Show or hide the insufficient-funds dialog.
    pub async fn set_insufficient_funds(&self, shown: bool) {
        self.state.lock().await.insufficient_dialog = shown;
    }

    pub async fn balance(&self) -> Decimal {
        self.state.lock().await.balance
    }

    /// Addresses navigated to, oldest first.
    pub async fn visited(&self) -> Vec<String> {
        self.state.lock().await.visited.clone()
    }

    pub async fn navigations(&self) -> usize {
        self.state.lock().await.visited.len()
    }

    /// Rounds started, whether by the session or by the game itself.
    pub async fn triggers(&self) -> u64 {
        self.state.lock().await.triggers
    }

    pub async fn dismissals(&self) -> u64 {
        self.state.lock().await.dismissals
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    pub async fn is_muted(&self) -> bool {
        self.state.lock().await.muted
    }

    pub async fn sound_choice(&self) -> Option<bool> {
        self.state.lock().await.sound_choice
    }
}

#[async_trait]
impl Automation for MockSlotMachine {
    async fn navigate(&self, address: &str) -> AutomationResult<()> {
        let mut state = self.state.lock().await;
        state.check_window()?;
        state.visited.push(address.to_string());
        state.balance = state.starting_balance;
        state.win_display = String::new();
        state.free_pending = 0;
        state.insufficient_dialog = false;
        state.phase = Phase::Loading {
            polls_left: state.loading_polls,
        };
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> AutomationResult<Value> {
        let mut state = self.state.lock().await;
        state.check_window()?;
        if state.provider != Provider::Aristocrat {
            return Err(AutomationError::Script("game is undefined".to_string()));
        }

        match script {
            scripts::REELS_HEIGHT => Ok(if state.tick_loading() {
                json!(REELS_HEIGHT_PX)
            } else {
                Value::Null
            }),
            _ if !state.is_loaded() => Err(AutomationError::Script("game is undefined".to_string())),
            scripts::ACTION => {
                let action = state.action();
                state.tick_round();
                Ok(json!(action))
            }
            scripts::MUTE => {
                state.muted = true;
                if state.autostart && matches!(state.phase, Phase::Idle) {
                    state.start_round();
                }
                Ok(Value::Null)
            }
            scripts::WAGER => Ok(json!(state.wager.to_string())),
            scripts::BALANCE => Ok(json!(state.balance.to_string())),
            scripts::WIN => Ok(json!(state.win_display)),
            scripts::SPIN => {
                if matches!(state.phase, Phase::Idle) {
                    state.start_round();
                }
                Ok(Value::Null)
            }
            scripts::FREE_SPIN => Ok(json!(state.free_pending > 0)),
            other => Err(AutomationError::Script(format!("unsupported script: {other}"))),
        }
    }

    async fn find(&self, locator: &Locator) -> AutomationResult<Option<ControlRef>> {
        let mut state = self.state.lock().await;
        state.check_window()?;
        if state.provider != Provider::Igt {
            return Ok(None);
        }

        let id = match locator.expression() {
            xpaths::SOUND_PROMPT => state.tick_loading().then_some(ids::SOUND_PROMPT),
            xpaths::SOUND_YES => Some(ids::SOUND_YES),
            xpaths::SOUND_NO => Some(ids::SOUND_NO),
            xpaths::TOTAL_BET_LABEL => state.is_loaded().then_some(ids::TOTAL_BET_LABEL),
            xpaths::WAGER_DISPLAY => Some(ids::WAGER),
            xpaths::BALANCE_DISPLAY => Some(ids::BALANCE),
            xpaths::WIN_DISPLAY => Some(ids::WIN),
            xpaths::SPIN_BUTTON => Some(ids::SPIN),
            xpaths::INSUFFICIENT_FUNDS => state.insufficient_dialog.then_some(ids::INSUFFICIENT_FUNDS),
            _ => None,
        };
        Ok(id.map(ControlRef::new))
    }

    async fn find_all(&self, locator: &Locator) -> AutomationResult<Vec<ControlRef>> {
        let state = self.state.lock().await;
        state.check_window()?;
        if state.provider != Provider::Igt {
            return Ok(Vec::new());
        }

        let found: Vec<&str> = match locator.expression() {
            xpaths::SPIN_PRECEDING if state.broken_control => vec![ids::BROKEN, ids::SKIP],
            xpaths::SPIN_PRECEDING => vec![ids::SKIP],
            xpaths::SPIN_FOLLOWING => vec![ids::BONUS],
            _ => Vec::new(),
        };
        Ok(found.into_iter().map(ControlRef::new).collect())
    }

    async fn is_displayed(&self, control: &ControlRef) -> AutomationResult<bool> {
        let mut state = self.state.lock().await;
        state.check_window()?;

        match control.id() {
            ids::SOUND_PROMPT => Ok(matches!(state.phase, Phase::Prompt)),
            ids::TOTAL_BET_LABEL | ids::WAGER | ids::BALANCE | ids::WIN => Ok(state.is_loaded()),
            ids::SPIN => {
                let visible = matches!(state.phase, Phase::Idle);
                state.tick_round();
                Ok(visible)
            }
            ids::SKIP => Ok(matches!(state.phase, Phase::Interstitial)),
            ids::BONUS => Ok(false),
            ids::INSUFFICIENT_FUNDS => Ok(state.insufficient_dialog),
            ids::BROKEN => Err(AutomationError::Protocol {
                code: "unknown error".to_string(),
                message: "cannot determine visibility".to_string(),
            }),
            other => Err(AutomationError::StaleReference(other.to_string())),
        }
    }

    async fn click(&self, control: &ControlRef) -> AutomationResult<()> {
        let mut state = self.state.lock().await;
        state.check_window()?;
        let not_interactable = || AutomationError::NotInteractable(control.to_string());

        match control.id() {
            ids::SOUND_YES | ids::SOUND_NO if matches!(state.phase, Phase::Prompt) => {
                state.sound_choice = Some(control.id() == ids::SOUND_YES);
                state.finish_load();
                Ok(())
            }
            ids::SPIN if matches!(state.phase, Phase::Idle) => {
                state.start_round();
                Ok(())
            }
            ids::SKIP if matches!(state.phase, Phase::Interstitial) => {
                state.dismissals += 1;
                state.phase = Phase::Idle;
                Ok(())
            }
            ids::SOUND_YES | ids::SOUND_NO | ids::SPIN | ids::SKIP | ids::BONUS => Err(not_interactable()),
            other => Err(AutomationError::StaleReference(other.to_string())),
        }
    }

    async fn read_attribute(
        &self,
        control: &ControlRef,
        name: &str,
    ) -> AutomationResult<Option<String>> {
        let state = self.state.lock().await;
        state.check_window()?;
        if name != "innerHTML" {
            return Ok(None);
        }

        let value = match control.id() {
            ids::WAGER => Some(state.wager.to_string()),
            ids::BALANCE => Some(state.balance.to_string()),
            ids::WIN => Some(state.win_display.clone()),
            _ => None,
        };
        Ok(value)
    }

    async fn close(&self) -> AutomationResult<()> {
        let mut state = self.state.lock().await;
        state.check_window()?;
        state.closed = true;
        Ok(())
    }
}

/// Page fetcher serving fixed HTML per address.
#[derive(Debug, Default)]
pub struct StaticPageFetcher {
    pages: HashMap<String, String>,
}

impl StaticPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn fetch(&self, url: &str) -> SessionResult<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| SessionError::Resolution(format!("no page at {url}")))
    }

    fn extract_frame_src(&self, html: &str, base: &str) -> SessionResult<String> {
        extract_frame_src(html, base)
    }
}

/// Ledger store keeping the last persisted ledger in memory.
#[derive(Debug)]
pub struct MemoryLedgerStore {
    location: PathBuf,
    records: StdMutex<Vec<OutcomeRecord>>,
    flushes: StdMutex<usize>,
    fail: bool,
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            location: PathBuf::from("memory"),
            records: StdMutex::new(Vec::new()),
            flushes: StdMutex::new(0),
            fail: false,
        }
    }

    /// A store whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn records(&self) -> Vec<OutcomeRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Number of successful writes.
    pub fn flushes(&self) -> usize {
        self.flushes.lock().map(|count| *count).unwrap_or_default()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn persist(&self, records: &[OutcomeRecord]) -> SessionResult<()> {
        let io_error = |message: &str| SessionError::Persistence {
            path: self.location.clone(),
            source: std::io::Error::other(message.to_string()),
        };
        if self.fail {
            return Err(io_error("store is read-only"));
        }

        let mut stored = self.records.lock().map_err(|_| io_error("store lock poisoned"))?;
        *stored = records.to_vec();
        drop(stored);

        if let Ok(mut flushes) = self.flushes.lock() {
            *flushes += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_engine_round_settles_after_polls() {
        let machine = MockSlotMachine::new(Provider::Aristocrat)
            .with_rounds(vec![MockRound::win(Decimal::from(5))]);
        machine.navigate("https://games.example/frame").await.unwrap();

        // one loading poll, then the reels are drawn
        assert_eq!(machine.evaluate(scripts::REELS_HEIGHT).await.unwrap(), Value::Null);
        assert_eq!(machine.evaluate(scripts::REELS_HEIGHT).await.unwrap(), json!(540));

        machine.evaluate(scripts::SPIN).await.unwrap();
        for _ in 0..=SPIN_POLLS {
            assert_eq!(machine.evaluate(scripts::ACTION).await.unwrap(), json!("spin"));
        }
        assert_eq!(machine.evaluate(scripts::ACTION).await.unwrap(), json!("normal"));
        assert_eq!(machine.balance().await, Decimal::from(104));
        assert_eq!(machine.evaluate(scripts::WIN).await.unwrap(), json!("5"));
    }

    #[tokio::test]
    async fn test_dom_spin_needs_idle_page() {
        let machine = MockSlotMachine::new(Provider::Igt).with_loading_polls(0);
        machine.navigate("https://games.example/igt").await.unwrap();

        let spin = ControlRef::new(ids::SPIN);
        assert!(matches!(
            machine.click(&spin).await,
            Err(AutomationError::NotInteractable(_))
        ));

        let prompt = machine.find(&Locator::xpath(xpaths::SOUND_PROMPT)).await.unwrap();
        assert_eq!(prompt, Some(ControlRef::new(ids::SOUND_PROMPT)));
        machine.click(&ControlRef::new(ids::SOUND_NO)).await.unwrap();
        assert_eq!(machine.sound_choice().await, Some(false));

        machine.click(&spin).await.unwrap();
        assert!(!machine.is_visible(&spin).await.unwrap());
        assert_eq!(machine.triggers().await, 1);
    }

    #[tokio::test]
    async fn test_lost_window_rejects_calls() {
        let machine = MockSlotMachine::new(Provider::Aristocrat)
            .with_loading_polls(0)
            .lose_window_after(1);
        machine.navigate("about:blank").await.unwrap();
        machine.evaluate(scripts::REELS_HEIGHT).await.unwrap();
        machine.evaluate(scripts::SPIN).await.unwrap();
        for _ in 0..=SPIN_POLLS {
            machine.evaluate(scripts::ACTION).await.unwrap();
        }

        let err = machine.evaluate(scripts::ACTION).await.unwrap_err();
        assert!(err.is_window_lost());
    }

    #[test]
    fn test_memory_store_replaces_contents() {
        let store = MemoryLedgerStore::new();
        let record = OutcomeRecord::opening(crate::domain::models::now(), Decimal::from(100));

        store.persist(&[record.clone()]).unwrap();
        store.persist(&[record.clone(), record]).unwrap();

        assert_eq!(store.records().len(), 2);
        assert_eq!(store.flushes(), 2);
        assert!(MemoryLedgerStore::failing().persist(&[]).is_err());
    }
}
