//! Wait-condition engine.
//!
//! A [`WaitCondition`] is re-evaluated on every poll tick by a [`Waiter`]
//! until it holds, the stop signal is raised, or the timeout elapses. There
//! are two families of predicates: queries against the game engine's script
//! state, and element visibility on the page.

use std::time::Duration;

use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::domain::errors::{SessionError, SessionResult};
use crate::domain::ports::{Automation, AutomationResult, ControlRef, Locator};

use super::cancellation::StopSignal;

/// Controls that are clicked away whenever they show up during a wait.
///
/// This is how interstitial dialogs ("skip big win", "start bonus") get
/// dismissed. A control whose check or click fails is dropped for good.
#[derive(Debug, Clone, Default)]
pub struct DismissSet {
    controls: Vec<ControlRef>,
}

impl DismissSet {
    pub const fn new(controls: Vec<ControlRef>) -> Self {
        Self { controls }
    }

    pub fn controls(&self) -> &[ControlRef] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Click the first visible control. Failing controls are removed after the pass.
    pub async fn sweep(&mut self, driver: &dyn Automation) -> AutomationResult<Option<ControlRef>> {
        let mut failed = Vec::new();
        let mut clicked = None;

        for (index, control) in self.controls.iter().enumerate() {
            let outcome = match driver.is_displayed(control).await {
                Ok(true) => driver.click(control).await.map(|()| true),
                other => other,
            };

            match outcome {
                Ok(true) => {
                    debug!(control = %control, "dismissed interstitial control");
                    clicked = Some(control.clone());
                    break;
                }
                Ok(false) => {}
                Err(err) if err.is_window_lost() => return Err(err),
                Err(err) => {
                    debug!(control = %control, error = %err, "dropping unresponsive control");
                    failed.push(index);
                }
            }
        }

        for index in failed.into_iter().rev() {
            self.controls.remove(index);
        }

        Ok(clicked)
    }
}

/// A predicate over the current page state.
#[derive(Debug)]
pub enum WaitCondition<'a> {
    /// The engine value returned by `query` is one of `accepted`.
    EngineState {
        query: &'a str,
        accepted: &'a [&'a str],
    },

    /// The engine value returned by `query` is numeric.
    EngineNumeric { query: &'a str },

    /// An element matching `locator` exists, and is displayed when `displayed` is set.
    Present { locator: &'a Locator, displayed: bool },

    /// `control` reaches the wanted visibility.
    ///
    /// While waiting, visible controls in `dismiss` are clicked away, and the
    /// wait also ends as soon as `end_state` matches an element.
    Visibility {
        control: &'a ControlRef,
        visible: bool,
        dismiss: Option<&'a mut DismissSet>,
        end_state: Option<&'a Locator>,
    },
}

impl WaitCondition<'_> {
    pub fn describe(&self) -> String {
        match self {
            Self::EngineState { query, accepted } => {
                format!("`{query}` to be one of {accepted:?}")
            }
            Self::EngineNumeric { query } => format!("`{query}` to be numeric"),
            Self::Present { locator, displayed: true } => format!("{locator} to be displayed"),
            Self::Present { locator, .. } => format!("{locator} to be present"),
            Self::Visibility { control, visible, .. } => {
                let state = if *visible { "visible" } else { "hidden" };
                format!("control {control} to become {state}")
            }
        }
    }

    /// Evaluate the predicate once.
    pub async fn poll(&mut self, driver: &dyn Automation) -> AutomationResult<bool> {
        match self {
            Self::EngineState { query, accepted } => {
                let value = driver.evaluate(*query).await?;
                Ok(value.as_str().is_some_and(|state| accepted.contains(&state)))
            }
            Self::EngineNumeric { query } => {
                let value = driver.evaluate(*query).await?;
                Ok(is_numeric(&value))
            }
            Self::Present { locator, displayed } => match driver.find(locator).await? {
                Some(control) if *displayed => driver.is_displayed(&control).await,
                Some(_) => Ok(true),
                None => Ok(false),
            },
            Self::Visibility {
                control,
                visible,
                dismiss,
                end_state,
            } => {
                if driver.is_displayed(control).await? == *visible {
                    return Ok(true);
                }
                if let Some(dismiss) = dismiss.as_deref_mut() {
                    dismiss.sweep(driver).await?;
                }
                if let Some(locator) = end_state {
                    if driver.find(locator).await?.is_some() {
                        debug!(%locator, "end-state dialog is showing");
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

/// Polls wait conditions at a fixed interval.
#[derive(Debug, Clone)]
pub struct Waiter {
    poll_interval: Duration,
    stop: StopSignal,
}

impl Waiter {
    pub const fn new(poll_interval: Duration, stop: StopSignal) -> Self {
        Self {
            poll_interval,
            stop,
        }
    }

    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub const fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Poll `condition` until it holds or `timeout` elapses.
    ///
    /// Stale element references count as "not yet". A raised stop signal
    /// ends the wait with [`SessionError::Cancelled`].
    pub async fn until(
        &self,
        driver: &dyn Automation,
        condition: &mut WaitCondition<'_>,
        timeout: Duration,
    ) -> SessionResult<()> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.stop.is_stopped() {
                return Err(SessionError::Cancelled);
            }

            match condition.poll(driver).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(err) if err.is_stale() => {
                    trace!(error = %err, "stale reference while polling, retrying");
                }
                Err(err) => return Err(err.into()),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::TimedOut {
                    waiting_for: condition.describe(),
                    timeout,
                });
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockSlotMachine;
    use crate::domain::models::Provider;
    use crate::services::cancellation::stop_channel;
    use crate::services::slot_session::engine_surface::scripts;

    fn waiter() -> Waiter {
        Waiter::new(Duration::from_millis(5), StopSignal::never())
    }

    #[tokio::test]
    async fn test_engine_condition_holds_after_loading() {
        let machine = MockSlotMachine::new(Provider::Aristocrat).with_loading_polls(3);
        machine.navigate("https://games.example/frame").await.unwrap();

        let mut ready = WaitCondition::EngineNumeric {
            query: scripts::REELS_HEIGHT,
        };
        waiter()
            .until(&machine, &mut ready, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_timeout_names_condition() {
        let machine = MockSlotMachine::new(Provider::Igt);
        let locator = Locator::xpath("//div[@id='never']");
        let mut missing = WaitCondition::Present {
            locator: &locator,
            displayed: false,
        };

        let err = waiter()
            .until(&machine, &mut missing, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("//div[@id='never']"));
    }

    #[tokio::test]
    async fn test_stale_reference_is_not_yet() {
        let machine = MockSlotMachine::new(Provider::Igt);
        let ghost = ControlRef::new("ghost");
        let mut visible = WaitCondition::Visibility {
            control: &ghost,
            visible: true,
            dismiss: None,
            end_state: None,
        };

        // stale on every poll: the wait runs out instead of failing fast
        let err = waiter()
            .until(&machine, &mut visible, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_stop_signal_cancels_wait() {
        let machine = MockSlotMachine::new(Provider::Igt);
        let (handle, signal) = stop_channel();
        handle.stop();

        let locator = Locator::xpath("//div[@id='never']");
        let mut missing = WaitCondition::Present {
            locator: &locator,
            displayed: false,
        };
        let err = Waiter::new(Duration::from_millis(5), signal)
            .until(&machine, &mut missing, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Cancelled));
    }

    #[tokio::test]
    async fn test_closed_window_ends_wait() {
        let machine = MockSlotMachine::new(Provider::Aristocrat);
        machine.close().await.unwrap();

        let mut idle = WaitCondition::EngineState {
            query: scripts::ACTION,
            accepted: &["normal"],
        };
        let err = waiter()
            .until(&machine, &mut idle, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_end_state_ends_visibility_wait() {
        let machine = MockSlotMachine::new(Provider::Igt);
        machine.set_insufficient_funds(true).await;

        let hidden = ControlRef::new("bonus");
        let dialog = Locator::xpath(
            crate::services::slot_session::dom_surface::xpaths::INSUFFICIENT_FUNDS,
        );
        let mut settled = WaitCondition::Visibility {
            control: &hidden,
            visible: true,
            dismiss: None,
            end_state: Some(&dialog),
        };
        waiter()
            .until(&machine, &mut settled, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failing_controls_are_pruned() {
        let machine = MockSlotMachine::new(Provider::Igt);
        let mut dismiss = DismissSet::new(vec![
            ControlRef::new("broken"),
            ControlRef::new("skip"),
            ControlRef::new("bonus"),
        ]);

        let clicked = dismiss.sweep(&machine).await.unwrap();
        assert!(clicked.is_none());
        assert_eq!(
            dismiss.controls(),
            &[ControlRef::new("skip"), ControlRef::new("bonus")]
        );

        // a second pass keeps the healthy controls
        dismiss.sweep(&machine).await.unwrap();
        assert_eq!(dismiss.len(), 2);
    }
}
