//! Exit leg sizing.

use serde::{Deserialize, Serialize};

/// Quantities for the exit legs of a freshly filled entry.
///
/// The partial leg takes `floor(filled / 2)` when a partial price was given
/// and at least two shares filled; the take-profit leg takes the remainder;
/// the stop covers the whole filled quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegPlan {
    /// Stop-loss quantity.
    pub stop_loss_qty: u64,
    /// Take-profit quantity (0 when no take-profit price was given).
    pub take_profit_qty: u64,
    /// Partial take-profit quantity (0 when the leg is skipped).
    pub partial_qty: u64,
}

impl LegPlan {
    /// Size the legs for `filled_qty` shares.
    #[must_use]
    pub const fn derive(filled_qty: u64, has_partial: bool, has_take_profit: bool) -> Self {
        let partial_qty = if has_partial && filled_qty >= 2 {
            filled_qty / 2
        } else {
            0
        };
        let take_profit_qty = if has_take_profit {
            filled_qty - partial_qty
        } else {
            0
        };

        Self {
            stop_loss_qty: filled_qty,
            take_profit_qty,
            partial_qty,
        }
    }

    /// Stop quantity once the partial leg has filled.
    #[must_use]
    pub const fn stop_after_partial(&self) -> u64 {
        self.stop_loss_qty - self.partial_qty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ten_shares_with_all_levels() {
        let plan = LegPlan::derive(10, true, true);
        assert_eq!(plan.stop_loss_qty, 10);
        assert_eq!(plan.partial_qty, 5);
        assert_eq!(plan.take_profit_qty, 5);
        assert_eq!(plan.stop_after_partial(), 5);
    }

    #[test]
    fn odd_fill_gives_remainder_to_take_profit() {
        let plan = LegPlan::derive(7, true, true);
        assert_eq!(plan.partial_qty, 3);
        assert_eq!(plan.take_profit_qty, 4);
    }

    #[test]
    fn single_share_skips_partial() {
        let plan = LegPlan::derive(1, true, true);
        assert_eq!(plan.partial_qty, 0);
        assert_eq!(plan.take_profit_qty, 1);
        assert_eq!(plan.stop_loss_qty, 1);
    }

    #[test]
    fn no_partial_price_means_full_take_profit() {
        let plan = LegPlan::derive(10, false, true);
        assert_eq!(plan.partial_qty, 0);
        assert_eq!(plan.take_profit_qty, 10);
    }

    #[test]
    fn no_take_profit_price() {
        let plan = LegPlan::derive(10, true, false);
        assert_eq!(plan.partial_qty, 5);
        assert_eq!(plan.take_profit_qty, 0);
        assert_eq!(plan.stop_loss_qty, 10);
    }

    proptest! {
        #[test]
        fn targets_never_exceed_fill(filled in 1u64..100_000, partial: bool, tp: bool) {
            let plan = LegPlan::derive(filled, partial, tp);
            prop_assert_eq!(plan.stop_loss_qty, filled);
            prop_assert!(plan.partial_qty + plan.take_profit_qty <= filled);
            if tp {
                prop_assert_eq!(plan.partial_qty + plan.take_profit_qty, filled);
            }
            prop_assert!(plan.partial_qty <= plan.stop_loss_qty / 2);
        }
    }
}
