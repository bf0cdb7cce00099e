//! Domain errors for slot sessions.

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::models::Provider;

/// Failures reported by the page-automation layer.
#[derive(Debug, Error)]
pub enum AutomationError {
    /// The referenced element is no longer attached to the page.
    #[error("stale element reference: {0}")]
    StaleReference(String),

    /// The browser window under automation went away.
    #[error("automation window is gone: {0}")]
    NoSuchWindow(String),

    #[error("no element matches {0}")]
    NotFound(String),

    #[error("element cannot be interacted with: {0}")]
    NotInteractable(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("automation transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Any other error code returned by the automation endpoint.
    #[error("automation protocol error ({code}): {message}")]
    Protocol { code: String, message: String },
}

impl AutomationError {
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleReference(_))
    }

    pub const fn is_window_lost(&self) -> bool {
        matches!(self, Self::NoSuchWindow(_))
    }
}

/// Errors raised while driving a slot session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A wait predicate never became true within its bound.
    #[error("timed out after {timeout:?} waiting for {waiting_for}")]
    TimedOut {
        waiting_for: String,
        timeout: Duration,
    },

    #[error("insufficient funds: wager {wager} exceeds balance {balance}")]
    InsufficientFunds { wager: Decimal, balance: Decimal },

    #[error("unknown {provider} target: {name}")]
    UnknownTarget { name: String, provider: Provider },

    #[error("unreadable {field} reading: {raw:?}")]
    MalformedReading { field: &'static str, raw: String },

    #[error("required control not found: {0}")]
    ControlNotFound(String),

    #[error("could not resolve game address: {0}")]
    Resolution(String),

    #[error("failed to write ledger to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Explicit stop requested by the user or the environment.
    #[error("session cancelled")]
    Cancelled,

    #[error("session is closed")]
    Closed,

    #[error(transparent)]
    Automation(#[from] AutomationError),

    /// A fatal fault after the session was shut down, annotated with context.
    #[error("{context}")]
    Aborted {
        context: String,
        #[source]
        source: Box<SessionError>,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// The underlying fault with every shutdown annotation removed.
    pub fn root(&self) -> &Self {
        match self {
            Self::Aborted { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this fault is a graceful stop rather than an error.
    pub fn is_cancellation(&self) -> bool {
        match self.root() {
            Self::Cancelled => true,
            Self::Automation(err) => err.is_window_lost(),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::TimedOut { .. })
    }
}
