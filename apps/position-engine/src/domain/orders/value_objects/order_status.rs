//! Order status as reported by the broker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Collapsed broker order status.
///
/// Broker-specific states (open, trigger pending, modified, ...) all map to
/// `Pending`; only the three terminal outcomes are distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Working or not yet acknowledged.
    Pending,
    /// Completely filled.
    Filled,
    /// Rejected by broker or exchange.
    Rejected,
    /// Cancelled (by us, the broker or end-of-day expiry).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Filled => write!(f, "FILLED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Result of an order status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusReport {
    /// Current status.
    pub status: OrderStatus,
    /// Quantity filled so far.
    pub filled_qty: u64,
    /// Broker status message (rejection reason etc.).
    pub message: Option<String>,
}

impl OrderStatusReport {
    /// Report for an order that is still working.
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            status: OrderStatus::Pending,
            filled_qty: 0,
            message: None,
        }
    }

    /// Report for a completely filled order.
    #[must_use]
    pub const fn filled(filled_qty: u64) -> Self {
        Self {
            status: OrderStatus::Filled,
            filled_qty,
            message: None,
        }
    }

    /// Report for a terminal non-fill.
    #[must_use]
    pub fn closed(status: OrderStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            filled_qty: 0,
            message: Some(message.into()),
        }
    }
}
