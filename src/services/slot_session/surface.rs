//! How a session observes and drives one family of games.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::errors::{SessionError, SessionResult};
use crate::domain::models::{parse_amount, Provider, TimeoutConfig};
use crate::domain::ports::Automation;
use crate::services::wait_condition::WaitCondition;

use super::dom_surface::DomSurface;
use super::engine_surface::EngineSurface;

/// Game-family specific half of a slot session.
///
/// The spin cycle only talks to the game through this trait and the wait
/// conditions it hands out, so it stays the same for every provider.
#[async_trait]
pub trait GameSurface: Send + Sync {
    /// First sign of life after navigation.
    fn ready_condition(&self) -> WaitCondition<'_>;

    /// Bound for [`GameSurface::ready_condition`].
    fn ready_timeout(&self, timeouts: &TimeoutConfig) -> Duration;

    /// Answer the sound preference prompt, if the game shows one.
    async fn answer_sound_prompt(&self, driver: &dyn Automation, sound: bool) -> SessionResult<()>;

    /// The game accepts input.
    fn idle_condition(&self) -> WaitCondition<'_>;

    /// Turn audio off through the engine, unless `sound` is wanted.
    async fn mute(&self, driver: &dyn Automation, sound: bool) -> SessionResult<()>;

    /// Locate and cache the controls used during rounds.
    async fn bind_controls(&mut self, driver: &dyn Automation) -> SessionResult<()>;

    async fn read_wager(&self, driver: &dyn Automation) -> SessionResult<Decimal>;

    async fn read_balance(&self, driver: &dyn Automation) -> SessionResult<Decimal>;

    /// `None` when the win display is blank or not a number.
    async fn read_win(&self, driver: &dyn Automation) -> SessionResult<Option<Decimal>>;

    /// Whether the trigger can be used right now.
    async fn trigger_ready(&self, driver: &dyn Automation) -> SessionResult<bool>;

    /// Start a round.
    async fn trigger(&self, driver: &dyn Automation) -> SessionResult<()>;

    /// The round has visibly started.
    fn started_condition(&self) -> SessionResult<WaitCondition<'_>>;

    /// The round's outcome can be read.
    fn settled_condition(&mut self) -> SessionResult<WaitCondition<'_>>;

    /// Whether the engine reports a free round waiting to be played.
    async fn free_round_pending(&self, driver: &dyn Automation) -> SessionResult<bool>;
}

/// Surface matching how `provider` games are driven.
pub fn surface_for(provider: Provider) -> Box<dyn GameSurface> {
    match provider {
        Provider::Igt => Box::new(DomSurface::new()),
        Provider::Aristocrat => Box::new(EngineSurface),
    }
}

/// Amount from an engine value: a JSON number or a displayed string.
pub(super) fn amount_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => {
            let text = number.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(text) => parse_amount(text),
        _ => None,
    }
}

pub(super) fn require_amount(field: &'static str, value: &Value) -> SessionResult<Decimal> {
    amount_from_value(value).ok_or_else(|| SessionError::MalformedReading {
        field,
        raw: value.to_string(),
    })
}

/// JavaScript truthiness of an engine value.
pub(super) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_amount_from_value() {
        assert_eq!(amount_from_value(&json!(104.5)), Some(Decimal::new(1045, 1)));
        assert_eq!(amount_from_value(&json!(3)), Some(Decimal::from(3)));
        assert_eq!(amount_from_value(&json!("1,000.00")), Some(Decimal::from(1000)));
        assert_eq!(amount_from_value(&json!(null)), None);
        assert_eq!(amount_from_value(&json!({"cash": 1})), None);
    }

    #[test]
    fn test_require_amount_reports_raw_value() {
        let err = require_amount("balance", &json!("")).unwrap_err();
        assert!(matches!(err, SessionError::MalformedReading { field: "balance", .. }));
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(2)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
    }
}
