//! Games driven through on-page controls.
//!
//! Amounts are read from the spans next to their labels. A round starts when
//! the spin button disappears and is over once it comes back, or once the
//! insufficient-funds dialog shows. Buttons sharing the spin button's level
//! (skip big win, start bonus) are clicked away while waiting.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::errors::{SessionError, SessionResult};
use crate::domain::models::{parse_amount, TimeoutConfig};
use crate::domain::ports::{Automation, ControlRef, Locator};
use crate::services::wait_condition::{DismissSet, WaitCondition};

use super::surface::GameSurface;

/// XPath expressions for the page's controls.
///
/// Labels are matched case-insensitively through `translate()`.
pub mod xpaths {
    pub const SOUND_PROMPT: &str = "//div[text()='Would you like sound?']";
    pub const SOUND_YES: &str = "//div[text()='Yes']/..";
    pub const SOUND_NO: &str = "//div[text()='No']/..";
    pub const TOTAL_BET_LABEL: &str =
        "//span[translate(text(), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz')='total bet']";
    pub const WAGER_DISPLAY: &str =
        "//span[translate(text(), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz')='total bet']/preceding-sibling::span";
    pub const BALANCE_DISPLAY: &str =
        "//span[translate(text(), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz')='balance']/preceding-sibling::span";
    pub const WIN_DISPLAY: &str =
        "//span[translate(text(), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz')='win']/preceding-sibling::span";
    /// First visible block inside the game container.
    pub const SPIN_BUTTON: &str = "//div[@id='game']//div[contains(@style,'visibility: inherit')]";
    pub const SPIN_PRECEDING: &str =
        "(//div[@id='game']//div[contains(@style,'visibility: inherit')])[1]/preceding-sibling::div";
    pub const SPIN_FOLLOWING: &str =
        "(//div[@id='game']//div[contains(@style,'visibility: inherit')])[1]/following-sibling::div";
    pub const INSUFFICIENT_FUNDS: &str =
        "//div[text()='Insufficient funds to spin.']/ancestor::div[contains(@style,'visibility: inherit')]";
}

const DISPLAY_PROPERTY: &str = "innerHTML";

#[derive(Debug, Clone)]
struct DomControls {
    wager: ControlRef,
    balance: ControlRef,
    win: ControlRef,
    spin: ControlRef,
    auxiliary: DismissSet,
}

#[derive(Debug, Clone)]
pub struct DomSurface {
    sound_prompt: Locator,
    total_bet_label: Locator,
    insufficient_funds: Locator,
    controls: Option<DomControls>,
}

impl Default for DomSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DomSurface {
    pub fn new() -> Self {
        Self {
            sound_prompt: Locator::xpath(xpaths::SOUND_PROMPT),
            total_bet_label: Locator::xpath(xpaths::TOTAL_BET_LABEL),
            insufficient_funds: Locator::xpath(xpaths::INSUFFICIENT_FUNDS),
            controls: None,
        }
    }

    /// Controls currently clicked away during resolution waits.
    pub fn auxiliary_controls(&self) -> &[ControlRef] {
        match &self.controls {
            Some(controls) => controls.auxiliary.controls(),
            None => &[],
        }
    }

    fn controls(&self) -> SessionResult<&DomControls> {
        self.controls.as_ref().ok_or_else(unbound)
    }

    async fn read_display(
        driver: &dyn Automation,
        control: &ControlRef,
    ) -> SessionResult<Option<String>> {
        Ok(driver.read_attribute(control, DISPLAY_PROPERTY).await?)
    }

    async fn read_required(
        driver: &dyn Automation,
        control: &ControlRef,
        field: &'static str,
    ) -> SessionResult<Decimal> {
        let raw = Self::read_display(driver, control).await?.unwrap_or_default();
        parse_amount(&raw).ok_or(SessionError::MalformedReading { field, raw })
    }
}

fn unbound() -> SessionError {
    SessionError::ControlNotFound("game controls are not bound; load the game first".to_string())
}

async fn locate(driver: &dyn Automation, xpath: &str) -> SessionResult<ControlRef> {
    driver
        .find(&Locator::xpath(xpath))
        .await?
        .ok_or_else(|| SessionError::ControlNotFound(xpath.to_string()))
}

#[async_trait]
impl GameSurface for DomSurface {
    fn ready_condition(&self) -> WaitCondition<'_> {
        WaitCondition::Present {
            locator: &self.sound_prompt,
            displayed: true,
        }
    }

    fn ready_timeout(&self, timeouts: &TimeoutConfig) -> Duration {
        timeouts.sound_prompt()
    }

    async fn answer_sound_prompt(&self, driver: &dyn Automation, sound: bool) -> SessionResult<()> {
        let answer = locate(driver, if sound { xpaths::SOUND_YES } else { xpaths::SOUND_NO }).await?;
        debug!(sound, "answering sound prompt");
        driver.click(&answer).await?;
        Ok(())
    }

    fn idle_condition(&self) -> WaitCondition<'_> {
        WaitCondition::Present {
            locator: &self.total_bet_label,
            displayed: false,
        }
    }

    async fn mute(&self, _driver: &dyn Automation, _sound: bool) -> SessionResult<()> {
        // audio was settled by the prompt
        Ok(())
    }

    async fn bind_controls(&mut self, driver: &dyn Automation) -> SessionResult<()> {
        let wager = locate(driver, xpaths::WAGER_DISPLAY).await?;
        let balance = locate(driver, xpaths::BALANCE_DISPLAY).await?;
        let win = locate(driver, xpaths::WIN_DISPLAY).await?;
        let spin = locate(driver, xpaths::SPIN_BUTTON).await?;

        let mut auxiliary = driver
            .find_all(&Locator::xpath(xpaths::SPIN_PRECEDING))
            .await?;
        auxiliary.extend(
            driver
                .find_all(&Locator::xpath(xpaths::SPIN_FOLLOWING))
                .await?,
        );
        debug!(auxiliary = auxiliary.len(), "bound game controls");

        self.controls = Some(DomControls {
            wager,
            balance,
            win,
            spin,
            auxiliary: DismissSet::new(auxiliary),
        });
        Ok(())
    }

    async fn read_wager(&self, driver: &dyn Automation) -> SessionResult<Decimal> {
        Self::read_required(driver, &self.controls()?.wager, "wager").await
    }

    async fn read_balance(&self, driver: &dyn Automation) -> SessionResult<Decimal> {
        Self::read_required(driver, &self.controls()?.balance, "balance").await
    }

    async fn read_win(&self, driver: &dyn Automation) -> SessionResult<Option<Decimal>> {
        let raw = Self::read_display(driver, &self.controls()?.win).await?;
        Ok(raw.as_deref().and_then(parse_amount))
    }

    async fn trigger_ready(&self, driver: &dyn Automation) -> SessionResult<bool> {
        Ok(driver.is_visible(&self.controls()?.spin).await?)
    }

    async fn trigger(&self, driver: &dyn Automation) -> SessionResult<()> {
        driver.click(&self.controls()?.spin).await?;
        Ok(())
    }

    fn started_condition(&self) -> SessionResult<WaitCondition<'_>> {
        Ok(WaitCondition::Visibility {
            control: &self.controls()?.spin,
            visible: false,
            dismiss: None,
            end_state: None,
        })
    }

    fn settled_condition(&mut self) -> SessionResult<WaitCondition<'_>> {
        let controls = self.controls.as_mut().ok_or_else(unbound)?;
        Ok(WaitCondition::Visibility {
            control: &controls.spin,
            visible: true,
            dismiss: Some(&mut controls.auxiliary),
            end_state: Some(&self.insufficient_funds),
        })
    }

    async fn free_round_pending(&self, _driver: &dyn Automation) -> SessionResult<bool> {
        // free rounds play out behind the bonus dialogs
        Ok(false)
    }
}
