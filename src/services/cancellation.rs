//! Cooperative stop signal.
//!
//! A stop is only observed at poll ticks and between rounds; an in-flight
//! automation call always runs to completion first.

use std::sync::Arc;

use tokio::sync::watch;

/// Raises the stop flag for every associated [`StopSignal`].
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Read side of the stop flag.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// A signal that is never raised.
    pub fn never() -> Self {
        let (_handle, signal) = stop_channel();
        signal
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::never()
    }
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reaches_every_clone() {
        let (handle, signal) = stop_channel();
        let other = signal.clone();
        assert!(!signal.is_stopped());

        handle.clone().stop();
        assert!(signal.is_stopped());
        assert!(other.is_stopped());
    }

    #[test]
    fn test_never_signal_stays_clear() {
        assert!(!StopSignal::never().is_stopped());
    }
}
