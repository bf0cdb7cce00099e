//! Automation port - interface for the browser driving a game page.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::errors::AutomationError;

pub type AutomationResult<T> = Result<T, AutomationError>;

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Locator strategy name as used by the WebDriver protocol.
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::XPath(_) => "xpath",
            Self::Css(_) => "css selector",
        }
    }

    pub fn expression(&self) -> &str {
        match self {
            Self::XPath(expr) | Self::Css(expr) => expr,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.expression())
    }
}

/// Handle to an element previously located on the page.
///
/// The handle may go stale when the page replaces the element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlRef(String);

impl ControlRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControlRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for page-automation backends.
///
/// Calls are synchronous round-trips from the session's point of view; a
/// session never issues two at once.
#[async_trait]
pub trait Automation: Send + Sync {
    /// Load `address` in the automated window.
    async fn navigate(&self, address: &str) -> AutomationResult<()>;

    /// Run `script` in the page and return its result.
    async fn evaluate(&self, script: &str) -> AutomationResult<Value>;

    /// First element matching `locator`, if any.
    async fn find(&self, locator: &Locator) -> AutomationResult<Option<ControlRef>>;

    /// Every element matching `locator`, in document order.
    async fn find_all(&self, locator: &Locator) -> AutomationResult<Vec<ControlRef>>;

    /// Whether the element is displayed.
    ///
    /// Fails with [`AutomationError::StaleReference`] once the page has
    /// replaced the element, so waits can tell "gone" from "hidden".
    async fn is_displayed(&self, control: &ControlRef) -> AutomationResult<bool>;

    /// Like [`Automation::is_displayed`], but a stale element reports `false`.
    async fn is_visible(&self, control: &ControlRef) -> AutomationResult<bool> {
        match self.is_displayed(control).await {
            Err(err) if err.is_stale() => Ok(false),
            other => other,
        }
    }

    async fn click(&self, control: &ControlRef) -> AutomationResult<()>;

    /// Read a property such as `innerHTML`; `None` when unset.
    async fn read_attribute(&self, control: &ControlRef, name: &str)
        -> AutomationResult<Option<String>>;

    /// Release the browser. Further calls fail.
    async fn close(&self) -> AutomationResult<()>;
}
