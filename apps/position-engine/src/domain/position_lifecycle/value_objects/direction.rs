//! Position direction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::orders::OrderSide;

/// Direction of a position. Immutable once the position is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Bought, profits when price rises.
    Long,
    /// Sold short, profits when price falls.
    Short,
}

impl Direction {
    /// Side of the entry order.
    #[must_use]
    pub const fn entry_side(&self) -> OrderSide {
        match self {
            Self::Long => OrderSide::Buy,
            Self::Short => OrderSide::Sell,
        }
    }

    /// Side of every exit order (stop, targets, flattening market orders).
    #[must_use]
    pub const fn exit_side(&self) -> OrderSide {
        self.entry_side().opposite()
    }

    /// Sign of the holding this direction produces at the broker.
    #[must_use]
    pub const fn sign(&self) -> i64 {
        self.entry_side().sign()
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_for_long() {
        assert_eq!(Direction::Long.entry_side(), OrderSide::Buy);
        assert_eq!(Direction::Long.exit_side(), OrderSide::Sell);
        assert_eq!(Direction::Long.sign(), 1);
    }

    #[test]
    fn sides_for_short() {
        assert_eq!(Direction::Short.entry_side(), OrderSide::Sell);
        assert_eq!(Direction::Short.exit_side(), OrderSide::Buy);
        assert_eq!(Direction::Short.sign(), -1);
    }
}
