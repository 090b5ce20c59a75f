//! Order type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order types the engine submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Execute immediately at the best available price.
    Market,
    /// Rest at a limit price.
    Limit,
    /// Becomes a market order once the trigger price trades.
    StopMarket,
}

impl OrderType {
    /// Returns true if the order rests on the book until triggered.
    #[must_use]
    pub const fn is_resting(&self) -> bool {
        matches!(self, Self::Limit | Self::StopMarket)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
            Self::StopMarket => write!(f, "STOP_MARKET"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resting_types() {
        assert!(!OrderType::Market.is_resting());
        assert!(OrderType::Limit.is_resting());
        assert!(OrderType::StopMarket.is_resting());
    }

    #[test]
    fn order_type_serde() {
        let json = serde_json::to_string(&OrderType::StopMarket).unwrap();
        assert_eq!(json, "\"STOP_MARKET\"");
    }
}
