//! Order side (buy or sell).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a single order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Sign a filled quantity carries in net holdings.
    #[must_use]
    pub const fn sign(&self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }

    /// Wire label used by the broker API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OrderSide::Buy, OrderSide::Sell, 1, "\"BUY\"")]
    #[test_case(OrderSide::Sell, OrderSide::Buy, -1, "\"SELL\"")]
    fn side_properties(side: OrderSide, opposite: OrderSide, sign: i64, json: &str) {
        assert_eq!(side.opposite(), opposite);
        assert_eq!(side.sign(), sign);
        assert_eq!(serde_json::to_string(&side).unwrap(), json);
        assert_eq!(serde_json::from_str::<OrderSide>(json).unwrap(), side);
    }
}
