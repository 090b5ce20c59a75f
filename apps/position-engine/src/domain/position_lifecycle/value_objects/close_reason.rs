//! Why a position left the book.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Operator or signal requested the close.
    Manual,
    /// Take-profit leg filled.
    TakeProfitHit,
    /// Stop-loss filled.
    StopLossHit,
    /// Closed to make room for an opposite signal.
    Reversal,
    /// Flattened because protection could not be placed.
    Emergency,
}

impl CloseReason {
    /// Metric label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::TakeProfitHit => "take_profit_hit",
            Self::StopLossHit => "stop_loss_hit",
            Self::Reversal => "reversal",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::TakeProfitHit => write!(f, "take-profit hit"),
            Self::StopLossHit => write!(f, "stop-loss hit"),
            Self::Reversal => write!(f, "reversal"),
            Self::Emergency => write!(f, "emergency exit"),
        }
    }
}
