//! Fund exhaustion and fatal fault handling.

mod common;

use std::sync::Arc;

use common::{assert_ledger_consistent, dec, fast_settings, session};
use spinlog::adapters::{MemoryLedgerStore, MockRound, MockSlotMachine};
use spinlog::domain::models::{Provider, SpinPhase, TimeoutConfig};
use spinlog::services::SessionSettings;
use spinlog::SessionError;

fn settings_with(adjust: impl FnOnce(&mut SessionSettings)) -> SessionSettings {
    let mut settings = fast_settings();
    adjust(&mut settings);
    settings
}

#[tokio::test]
async fn test_exhausted_balance_is_restored_by_reload() {
    let machine = Arc::new(MockSlotMachine::new(Provider::Igt).with_balance(dec(2)));
    let store = Arc::new(MemoryLedgerStore::new());
    let mut session = session(&machine, &store, fast_settings());

    session.load().await.unwrap();
    let summary = session.spin(Some(4)).await.unwrap();

    assert_eq!(summary.completed, 4);
    assert_eq!(machine.navigations().await, 2);

    let records = session.records();
    assert_eq!(records.len(), 6, "two openings and four rounds");
    assert!(records[3].is_opening());
    assert_eq!(records[3].balance, dec(2));
    assert_eq!(records[5].balance, dec(0));
    assert_ledger_consistent(records);
}

#[tokio::test]
async fn test_exhausted_balance_without_restore_is_fatal() {
    let machine = Arc::new(MockSlotMachine::new(Provider::Igt).with_balance(dec(2)));
    let store = Arc::new(MemoryLedgerStore::new());
    let settings = settings_with(|s| s.restore_balance = false);
    let mut session = session(&machine, &store, settings);

    session.load().await.unwrap();
    let err = session.spin(Some(5)).await.unwrap_err();

    assert!(matches!(err, SessionError::Aborted { .. }));
    assert!(matches!(
        err.root(),
        SessionError::InsufficientFunds { wager, balance } if *wager == dec(1) && *balance == dec(0)
    ));
    assert_eq!(session.phase(), SpinPhase::Error);
    assert!(session.is_closed());
    assert!(machine.is_closed().await);

    // the ledger up to the fault is flushed on the way out
    assert_eq!(store.records().len(), 3);
    assert_eq!(store.flushes(), 1);
}

#[tokio::test]
async fn test_stalled_round_times_out_and_flushes() {
    let machine = Arc::new(MockSlotMachine::new(Provider::Igt).with_rounds(vec![
        MockRound::lose(),
        MockRound::stall(),
    ]));
    let store = Arc::new(MemoryLedgerStore::new());
    let settings = settings_with(|s| {
        s.timeouts = TimeoutConfig {
            resolve_secs: 1,
            ..s.timeouts.clone()
        }
    });
    let mut session = session(&machine, &store, settings);

    session.load().await.unwrap();
    let err = session.spin(None).await.unwrap_err();

    assert!(err.is_timeout());
    assert!(!err.is_cancellation());
    assert!(err.to_string().contains("browser closed"));
    assert!(machine.is_closed().await);
    assert_eq!(store.records().len(), 2);
    assert_eq!(store.flushes(), 1);
}

#[tokio::test]
async fn test_game_that_never_loads() {
    let machine = Arc::new(MockSlotMachine::new(Provider::Igt).never_ready());
    let store = Arc::new(MemoryLedgerStore::new());
    let settings = settings_with(|s| {
        s.timeouts = TimeoutConfig {
            sound_prompt_secs: 1,
            ..s.timeouts.clone()
        }
    });
    let mut session = session(&machine, &store, settings);

    let err = session.load().await.unwrap_err();

    assert!(err.is_timeout());
    assert!(machine.is_closed().await);
    assert!(session.records().is_empty());
    assert_eq!(store.flushes(), 0);
}

#[tokio::test]
async fn test_flush_failure_keeps_original_fault() {
    let machine = Arc::new(MockSlotMachine::new(Provider::Aristocrat).with_rounds(vec![MockRound::stall()]));
    let store = Arc::new(MemoryLedgerStore::failing());
    let settings = settings_with(|s| {
        s.timeouts = TimeoutConfig {
            resolve_secs: 1,
            ..s.timeouts.clone()
        }
    });
    let mut session = session(&machine, &store, settings);

    session.load().await.unwrap();
    let err = session.spin_once().await.unwrap_err();

    assert!(matches!(err.root(), SessionError::TimedOut { .. }));
    assert!(machine.is_closed().await);
}
