//! Balance reconciliation.
//!
//! The win display is the least trustworthy reading: some games keep the
//! previous round's win in a hidden container. A win is only recorded when
//! `old_balance - wager + win == balance`; the wager is taken as displayed.

use rust_decimal::Decimal;
use tracing::debug;

/// How the win reading compared against the balance arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinCheck {
    /// The reading closes the balance equation.
    Consistent,
    /// The display was blank or not a number.
    Unreadable,
    /// The reading contradicts the balances and was discarded.
    Inconsistent { reported: Decimal },
}

/// Win amount to record, with the check that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub win: Decimal,
    pub check: WinCheck,
}

/// Validate `win` against the balances observed around a round.
pub fn reconcile(
    old_balance: Decimal,
    wager: Decimal,
    win: Option<Decimal>,
    balance: Decimal,
) -> Reconciliation {
    let Some(reported) = win else {
        return Reconciliation {
            win: Decimal::ZERO,
            check: WinCheck::Unreadable,
        };
    };

    if old_balance - wager + reported == balance {
        Reconciliation {
            win: reported,
            check: WinCheck::Consistent,
        }
    } else {
        debug!(
            %old_balance, %wager, %reported, %balance,
            "win reading does not match balance change, recording zero"
        );
        Reconciliation {
            win: Decimal::ZERO,
            check: WinCheck::Inconsistent { reported },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_consistent_win_is_kept() {
        let result = reconcile(Decimal::from(100), Decimal::ONE, Some(Decimal::from(5)), Decimal::from(104));
        assert_eq!(result.win, Decimal::from(5));
        assert_eq!(result.check, WinCheck::Consistent);
    }

    #[test]
    fn test_inconsistent_win_is_zeroed() {
        let result = reconcile(Decimal::from(100), Decimal::ONE, Some(Decimal::from(5)), Decimal::from(99));
        assert_eq!(result.win, Decimal::ZERO);
        assert_eq!(
            result.check,
            WinCheck::Inconsistent {
                reported: Decimal::from(5)
            }
        );
    }

    #[test]
    fn test_unreadable_win_is_zeroed() {
        let result = reconcile(Decimal::from(100), Decimal::ONE, None, Decimal::from(99));
        assert_eq!(result.win, Decimal::ZERO);
        assert_eq!(result.check, WinCheck::Unreadable);
    }

    #[test]
    fn test_stale_win_after_loss_is_zeroed() {
        // previous round's 2.50 still in the win box after a losing spin
        let result = reconcile(
            Decimal::new(10250, 2),
            Decimal::new(125, 2),
            Some(Decimal::new(250, 2)),
            Decimal::new(10125, 2),
        );
        assert_eq!(result.win, Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn prop_recorded_win_always_closes_the_equation(
            old_cents in 0i64..10_000_000,
            wager_cents in 1i64..10_000,
            win_cents in 0i64..1_000_000,
            actual_win_cents in 0i64..1_000_000,
        ) {
            let old_balance = Decimal::new(old_cents, 2);
            let wager = Decimal::new(wager_cents, 2);
            let balance = old_balance - wager + Decimal::new(actual_win_cents, 2);

            let result = reconcile(old_balance, wager, Some(Decimal::new(win_cents, 2)), balance);

            if result.check == WinCheck::Consistent {
                prop_assert_eq!(old_balance - wager + result.win, balance);
            } else {
                prop_assert_eq!(result.win, Decimal::ZERO);
                prop_assert_ne!(win_cents, actual_win_cents);
            }
        }
    }
}
