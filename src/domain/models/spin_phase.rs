//! Phases of a single round.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a round currently stands.
///
/// `Idle -> Triggering -> InProgress -> Resolving -> Resolved`, then back to
/// `Idle` for the next round. `Error` can be entered from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinPhase {
    #[default]
    Idle,
    Triggering,
    InProgress,
    Resolving,
    Resolved,
    Error,
}

impl SpinPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Triggering => "triggering",
            Self::InProgress => "in_progress",
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
            Self::Error => "error",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (*self, next),
            (_, Self::Error)
                | (Self::Idle | Self::Resolved | Self::Error, Self::Idle)
                | (Self::Idle, Self::Triggering)
                | (Self::Triggering, Self::InProgress)
                | (Self::InProgress, Self::Resolving)
                // a free round triggers again before anything is recorded
                | (Self::Resolving, Self::Triggering)
                | (Self::Resolving, Self::Resolved)
        )
    }
}

impl fmt::Display for SpinPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_phases() {
        let path = [
            SpinPhase::Idle,
            SpinPhase::Triggering,
            SpinPhase::InProgress,
            SpinPhase::Resolving,
            SpinPhase::Resolved,
            SpinPhase::Idle,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_error_reachable_from_any_phase() {
        for phase in [
            SpinPhase::Idle,
            SpinPhase::Triggering,
            SpinPhase::InProgress,
            SpinPhase::Resolving,
            SpinPhase::Resolved,
        ] {
            assert!(phase.can_transition_to(SpinPhase::Error));
        }
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!SpinPhase::Idle.can_transition_to(SpinPhase::Resolved));
        assert!(!SpinPhase::Triggering.can_transition_to(SpinPhase::Resolving));
        assert!(!SpinPhase::Resolved.can_transition_to(SpinPhase::InProgress));
    }
}
