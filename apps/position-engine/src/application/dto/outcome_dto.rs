//! Outcome DTOs returned by orchestrator operations.

use serde::{Deserialize, Serialize};

use crate::domain::position_lifecycle::{ChildOrder, ChildOrders, CloseReason, Direction};

/// Final state of an `open_position` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenStatus {
    /// Entry filled and every requested exit order is resting.
    Open,
    /// Entry filled and the stop is resting, but a target leg failed.
    Degraded,
    /// Stop-loss could not be placed; the fill was closed at market.
    Flattened,
}

/// Broker ids of a position's child orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildOrderIds {
    /// Entry order id.
    pub entry: Option<String>,
    /// Stop-loss order id.
    pub stop_loss: Option<String>,
    /// Take-profit order id.
    pub take_profit: Option<String>,
    /// Partial take-profit order id.
    pub partial_take_profit: Option<String>,
}

impl From<&ChildOrders> for ChildOrderIds {
    fn from(children: &ChildOrders) -> Self {
        let id = |child: &Option<ChildOrder>| child.as_ref().map(|c| c.order_id.to_string());
        Self {
            entry: id(&children.entry),
            stop_loss: id(&children.stop_loss),
            take_profit: id(&children.take_profit),
            partial_take_profit: id(&children.partial_take_profit),
        }
    }
}

/// What happened to the position a signal reversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalSummary {
    /// Direction of the closed position.
    pub previous_direction: Direction,
    /// Quantity exited at market.
    pub exit_qty: u64,
    /// Market exit order id.
    pub exit_order_id: String,
}

/// Result of `open_position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPositionOutcome {
    /// Symbol.
    pub symbol: String,
    /// Final status.
    pub status: OpenStatus,
    /// Position direction.
    pub direction: Direction,
    /// Quantity the signal asked for.
    pub requested_qty: u64,
    /// Quantity the entry filled.
    pub filled_qty: u64,
    /// Child order ids (empty exits when flattened).
    pub child_order_ids: ChildOrderIds,
    /// Set when an existing position was reversed first.
    pub reversal: Option<ReversalSummary>,
    /// Non-fatal problems (failed target legs, cancel failures).
    pub warnings: Vec<String>,
}

/// Result of `adjust_on_partial_fill`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustOutcome {
    /// Symbol.
    pub symbol: String,
    /// Quantity the replacement stop covers.
    pub stop_loss_qty: u64,
    /// Replacement stop order id.
    pub stop_order_id: Option<String>,
    /// Whether nothing is held any more (remainder flattened or stopped out).
    pub closed: bool,
}

/// Result of `close_position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosePositionOutcome {
    /// Symbol.
    pub symbol: String,
    /// Why the position closed.
    pub reason: CloseReason,
    /// Quantity exited by our market order (0 when a resting exit filled).
    pub exit_qty: u64,
    /// Market exit order id, when one was placed.
    pub exit_order_id: Option<String>,
    /// Child orders cancelled.
    pub cancelled_orders: Vec<String>,
    /// Child orders whose cancellation failed for a non-benign reason.
    pub cancel_failures: Vec<String>,
}

/// A symbol `close_all` could not close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedClose {
    /// Symbol.
    pub symbol: String,
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

/// Result of `close_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseAllOutcome {
    /// Symbols flattened.
    pub closed_symbols: Vec<String>,
    /// Symbols that stay open.
    pub failed_symbols: Vec<FailedClose>,
}
