//! Common test utilities for integration tests
//!
//! Fixtures that wire a slot session to the in-process mock machine.

use std::sync::Arc;

use rust_decimal::Decimal;
use spinlog::adapters::{MemoryLedgerStore, MockSlotMachine, StaticPageFetcher};
use spinlog::domain::models::{Catalog, GameTarget, OutcomeRecord, Provider, TimeoutConfig};
use spinlog::services::{SessionSettings, SlotSession, StopSignal};

/// Outer page of the test Aristocrat game.
pub const DRAGONS_PAGE: &str = "https://casino.example/slots/dragons";

/// Frame address [`DRAGONS_PAGE`] embeds.
pub const DRAGONS_FRAME: &str = "https://casino.example/play/dragons.html?mode=demo";

/// Settings with tight bounds and a 1ms poll interval.
pub fn fast_settings() -> SessionSettings {
    SessionSettings {
        timeouts: TimeoutConfig {
            load_secs: 5,
            sound_prompt_secs: 5,
            resolve_secs: 5,
            poll_interval_ms: 1,
        },
        ..Default::default()
    }
}

pub fn igt_target() -> GameTarget {
    Catalog::default()
        .resolve("siberian_storm", Provider::Igt)
        .expect("built-in game")
}

pub fn aristocrat_target() -> GameTarget {
    GameTarget {
        name: "dragons".to_string(),
        provider: Provider::Aristocrat,
        address: DRAGONS_PAGE.to_string(),
    }
}

pub fn frame_fetcher() -> StaticPageFetcher {
    StaticPageFetcher::new().with_page(
        DRAGONS_PAGE,
        r#"<html><body><iframe id="game" src="/play/dragons.html?mode=demo"></iframe></body></html>"#,
    )
}

/// Session over `machine` writing to `store`.
pub fn session(
    machine: &Arc<MockSlotMachine>,
    store: &Arc<MemoryLedgerStore>,
    settings: SessionSettings,
) -> SlotSession {
    session_with_signal(machine, store, settings, StopSignal::never())
}

#[allow(dead_code)]
pub fn session_with_signal(
    machine: &Arc<MockSlotMachine>,
    store: &Arc<MemoryLedgerStore>,
    settings: SessionSettings,
    signal: StopSignal,
) -> SlotSession {
    let provider = machine.provider();
    let target = match provider {
        Provider::Igt => igt_target(),
        Provider::Aristocrat => aristocrat_target(),
    };

    let mut builder = SlotSession::builder(target, machine.clone(), store.clone())
        .settings(settings)
        .stop_signal(signal);
    if provider == Provider::Aristocrat {
        builder = builder.fetcher(Arc::new(frame_fetcher()));
    }
    builder.build().expect("session builds")
}

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Every played round moves the balance by exactly `win - wager`.
///
/// Opening rows start a fresh balance and are not checked against their predecessor.
#[allow(dead_code)]
pub fn assert_ledger_consistent(records: &[OutcomeRecord]) {
    assert!(records.first().is_some_and(OutcomeRecord::is_opening), "ledger starts with an opening row");
    for pair in records.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.is_opening() {
            continue;
        }
        assert!(
            current.follows(previous),
            "{previous:?} -> {current:?} breaks the balance equation"
        );
    }
}
