//! Position aggregate root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::orders::OrderRequest;
use crate::domain::position_lifecycle::value_objects::{
    ChildOrder, ChildOrders, ChildSlot, Direction,
};
use crate::domain::shared::{DomainError, InstrumentKey, Symbol};

/// One open position per symbol, with its cluster of child orders.
///
/// # Invariants
///
/// - `filled_qty > 0` for every position held in the book.
/// - A present stop-loss is sized to [`Position::outstanding_qty`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Symbol key.
    pub symbol: Symbol,
    /// Broker instrument the symbol resolved to at open.
    pub instrument: InstrumentKey,
    /// Long or short.
    pub direction: Direction,
    /// Quantity asked for by the signal.
    pub requested_qty: u64,
    /// Quantity the entry actually filled.
    pub filled_qty: u64,
    /// Child-order slots.
    #[serde(default)]
    pub child_orders: ChildOrders,
    /// Whether the partial take-profit leg has filled.
    #[serde(default)]
    pub partial_filled: bool,
    /// Quantity exited by a take-profit that filled while the partial leg
    /// was still working.
    #[serde(default)]
    pub target_filled_qty: u64,
    /// When the entry was confirmed filled.
    pub created_at: DateTime<Utc>,
}

impl Position {
    /// Open a position from a confirmed entry fill.
    ///
    /// # Errors
    ///
    /// Returns error if nothing was filled.
    pub fn open(
        entry: ChildOrder,
        direction: Direction,
        requested_qty: u64,
        filled_qty: u64,
    ) -> Result<Self, DomainError> {
        if filled_qty == 0 {
            return Err(DomainError::InvariantViolation {
                aggregate: "Position".to_string(),
                invariant: "filled_qty > 0".to_string(),
                state: format!("symbol={} filled_qty=0", entry.request.symbol),
            });
        }

        Ok(Self {
            symbol: entry.request.symbol.clone(),
            instrument: entry.request.instrument.clone(),
            direction,
            requested_qty,
            filled_qty,
            child_orders: ChildOrders {
                entry: Some(entry),
                ..ChildOrders::default()
            },
            partial_filled: false,
            target_filled_qty: 0,
            created_at: Utc::now(),
        })
    }

    /// Child order in `slot`.
    #[must_use]
    pub const fn child(&self, slot: ChildSlot) -> Option<&ChildOrder> {
        self.child_orders.get(slot)
    }

    /// Quantity of the partial take-profit leg (0 when absent).
    #[must_use]
    pub fn partial_qty(&self) -> u64 {
        self.child(ChildSlot::PartialTakeProfit)
            .map_or(0, |child| child.request.quantity)
    }

    /// Shares still held: filled minus whatever the target legs already exited.
    #[must_use]
    pub fn outstanding_qty(&self) -> u64 {
        let partial = if self.partial_filled {
            self.partial_qty()
        } else {
            0
        };
        self.filled_qty
            .saturating_sub(partial)
            .saturating_sub(self.target_filled_qty)
    }

    /// Quantity left after the resting take-profit fills.
    ///
    /// Non-zero when the take-profit only covers part of the outstanding
    /// quantity, e.g. while the partial leg is still working.
    #[must_use]
    pub fn residual_after_target(&self) -> u64 {
        let target = self
            .child(ChildSlot::TakeProfit)
            .map_or(0, |child| child.request.quantity);
        self.outstanding_qty().saturating_sub(target)
    }

    /// Book a filled take-profit that left `residual_after_target` shares open.
    pub fn record_target_fill(&mut self) {
        if let Some(target) = self.child_orders.clear(ChildSlot::TakeProfit) {
            self.target_filled_qty += target.request.quantity;
        }
    }

    /// Outstanding quantity signed the way broker holdings report it.
    #[must_use]
    pub fn signed_outstanding(&self) -> i64 {
        self.direction.sign() * self.outstanding_qty() as i64
    }

    /// Exit orders that may still be working at the broker.
    ///
    /// A partial leg that already filled is excluded.
    #[must_use]
    pub fn resting_exits(&self) -> Vec<(ChildSlot, &ChildOrder)> {
        ChildSlot::EXITS
            .into_iter()
            .filter(|slot| !(*slot == ChildSlot::PartialTakeProfit && self.partial_filled))
            .filter_map(|slot| self.child(slot).map(|child| (slot, child)))
            .collect()
    }

    /// Market order that flattens `quantity` shares of this position.
    #[must_use]
    pub fn exit_request(&self, quantity: u64) -> OrderRequest {
        OrderRequest::market(
            self.symbol.clone(),
            self.instrument.clone(),
            self.direction.exit_side(),
            quantity,
        )
    }

    /// Check aggregate invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), DomainError> {
        if self.filled_qty == 0 {
            return Err(self.violation("filled_qty > 0", "filled_qty=0".to_string()));
        }

        if let Some(stop) = self.child(ChildSlot::StopLoss)
            && stop.request.quantity != self.outstanding_qty()
        {
            return Err(self.violation(
                "stop_loss quantity == outstanding quantity",
                format!(
                    "stop_loss={} outstanding={}",
                    stop.request.quantity,
                    self.outstanding_qty()
                ),
            ));
        }

        Ok(())
    }

    fn violation(&self, invariant: &str, state: String) -> DomainError {
        DomainError::InvariantViolation {
            aggregate: "Position".to_string(),
            invariant: invariant.to_string(),
            state: format!("symbol={} {state}", self.symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orders::{OrderSide, OrderType};
    use crate::domain::shared::BrokerOrderId;
    use rust_decimal_macros::dec;

    fn entry(side: OrderSide, qty: u64) -> ChildOrder {
        ChildOrder::new(
            BrokerOrderId::new("entry-1"),
            OrderRequest::market(
                Symbol::new("RELIANCE"),
                InstrumentKey::new("NSE_EQ|INE002A01018"),
                side,
                qty,
            ),
        )
    }

    fn long_ten() -> Position {
        let mut position = Position::open(entry(OrderSide::Buy, 10), Direction::Long, 10, 10).unwrap();
        let stop = OrderRequest::stop_market(
            position.symbol.clone(),
            position.instrument.clone(),
            OrderSide::Sell,
            10,
            dec!(95),
        );
        let partial = OrderRequest::limit(
            position.symbol.clone(),
            position.instrument.clone(),
            OrderSide::Sell,
            5,
            dec!(105),
        );
        position
            .child_orders
            .set(ChildSlot::StopLoss, ChildOrder::new(BrokerOrderId::new("sl-1"), stop));
        position.child_orders.set(
            ChildSlot::PartialTakeProfit,
            ChildOrder::new(BrokerOrderId::new("ptp-1"), partial),
        );
        position
    }

    #[test]
    fn open_requires_fill() {
        assert!(Position::open(entry(OrderSide::Buy, 10), Direction::Long, 10, 0).is_err());
    }

    #[test]
    fn outstanding_drops_after_partial() {
        let mut position = long_ten();
        assert_eq!(position.outstanding_qty(), 10);

        position.partial_filled = true;
        assert_eq!(position.outstanding_qty(), 5);
    }

    #[test]
    fn target_fill_ahead_of_partial_leaves_partial_quantity() {
        let mut position = long_ten();
        let target = OrderRequest::limit(
            position.symbol.clone(),
            position.instrument.clone(),
            OrderSide::Sell,
            5,
            dec!(110),
        );
        position
            .child_orders
            .set(ChildSlot::TakeProfit, ChildOrder::new(BrokerOrderId::new("tp-1"), target));
        assert_eq!(position.residual_after_target(), 5);

        position.record_target_fill();
        assert_eq!(position.target_filled_qty, 5);
        assert_eq!(position.outstanding_qty(), 5);
        assert!(position.child(ChildSlot::TakeProfit).is_none());

        position.partial_filled = true;
        assert_eq!(position.outstanding_qty(), 0);
    }

    #[test]
    fn target_covering_everything_leaves_no_residual() {
        let mut position = long_ten();
        position.partial_filled = true;
        let target = OrderRequest::limit(
            position.symbol.clone(),
            position.instrument.clone(),
            OrderSide::Sell,
            5,
            dec!(110),
        );
        position
            .child_orders
            .set(ChildSlot::TakeProfit, ChildOrder::new(BrokerOrderId::new("tp-1"), target));
        assert_eq!(position.residual_after_target(), 0);
    }

    #[test]
    fn signed_outstanding_for_short() {
        let position = Position::open(entry(OrderSide::Sell, 4), Direction::Short, 4, 4).unwrap();
        assert_eq!(position.signed_outstanding(), -4);
    }

    #[test]
    fn resting_exits_skip_filled_partial() {
        let mut position = long_ten();
        assert_eq!(position.resting_exits().len(), 2);

        position.partial_filled = true;
        let slots: Vec<ChildSlot> = position.resting_exits().into_iter().map(|(s, _)| s).collect();
        assert_eq!(slots, vec![ChildSlot::StopLoss]);
    }

    #[test]
    fn stop_must_match_outstanding() {
        let mut position = long_ten();
        assert!(position.check_invariants().is_ok());

        position.partial_filled = true;
        assert!(position.check_invariants().is_err());
    }

    #[test]
    fn exit_request_is_opposite_market() {
        let position = long_ten();
        let exit = position.exit_request(10);
        assert_eq!(exit.side, OrderSide::Sell);
        assert_eq!(exit.order_type, OrderType::Market);
        assert_eq!(exit.quantity, 10);
    }

    #[test]
    fn serde_round_trip_keeps_snapshots() {
        let position = long_ten();
        let json = serde_json::to_string(&position).unwrap();
        let restored: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, position);
    }
}
