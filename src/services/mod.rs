pub mod cancellation;
pub mod reconciliation;
pub mod slot_session;
pub mod statistics;
pub mod wait_condition;

pub use cancellation::{stop_channel, StopHandle, StopSignal};
pub use reconciliation::{reconcile, Reconciliation, WinCheck};
pub use slot_session::{SessionBuilder, SessionSettings, SlotSession, SpinSummary};
pub use statistics::{Bucket, LedgerStats};
pub use wait_condition::{DismissSet, WaitCondition, Waiter};
