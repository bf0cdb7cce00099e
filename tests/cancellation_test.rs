//! Stop requests and lost windows end a session without an error.

mod common;

use std::sync::Arc;

use common::{assert_ledger_consistent, fast_settings, session, session_with_signal};
use spinlog::adapters::{MemoryLedgerStore, MockSlotMachine};
use spinlog::domain::models::Provider;
use spinlog::services::stop_channel;
use spinlog::SessionError;

#[tokio::test]
async fn test_stop_ends_unbounded_loop() {
    let (handle, signal) = stop_channel();
    let machine = Arc::new(MockSlotMachine::new(Provider::Aristocrat).stop_after(2, handle));
    let store = Arc::new(MemoryLedgerStore::new());
    let mut session = session_with_signal(&machine, &store, fast_settings(), signal);

    session.load().await.unwrap();
    let summary = session.spin(None).await.unwrap();

    assert_eq!(summary.completed, 2);
    assert!(summary.cancelled);
    assert_eq!(session.records().len(), 3);
    assert_ledger_consistent(session.records());
    assert!(!machine.is_closed().await, "a stop leaves teardown to the caller");

    session.save().unwrap();
    session.close().await.unwrap();
    assert_eq!(store.records().len(), 3);
    assert!(machine.is_closed().await);
}

#[tokio::test]
async fn test_closed_window_ends_loop_gracefully() {
    let machine = Arc::new(MockSlotMachine::new(Provider::Igt).lose_window_after(3));
    let store = Arc::new(MemoryLedgerStore::new());
    let mut session = session(&machine, &store, fast_settings());

    session.load().await.unwrap();
    let summary = session.spin(Some(10)).await.unwrap();

    // the third round was still settling when the window went away
    assert_eq!(summary.completed, 2);
    assert!(summary.cancelled);
    assert_eq!(store.flushes(), 0);

    session.close().await.unwrap();
    assert!(session.is_closed());
}

#[tokio::test]
async fn test_stop_before_spinning() {
    let (handle, signal) = stop_channel();
    let machine = Arc::new(MockSlotMachine::new(Provider::Igt));
    let store = Arc::new(MemoryLedgerStore::new());
    let mut session = session_with_signal(&machine, &store, fast_settings(), signal);

    session.load().await.unwrap();
    handle.stop();
    let summary = session.spin(Some(3)).await.unwrap();

    assert_eq!(summary.completed, 0);
    assert!(summary.cancelled);
    assert_eq!(machine.triggers().await, 0);
}

#[tokio::test]
async fn test_stop_during_load() {
    let (handle, signal) = stop_channel();
    handle.stop();
    let machine = Arc::new(MockSlotMachine::new(Provider::Igt));
    let store = Arc::new(MemoryLedgerStore::new());
    let mut session = session_with_signal(&machine, &store, fast_settings(), signal);

    let err = session.load().await.unwrap_err();

    assert!(matches!(err, SessionError::Cancelled));
    assert!(err.is_cancellation());
    assert!(!machine.is_closed().await);
    assert!(!session.is_closed());
    assert!(session.records().is_empty());
}
