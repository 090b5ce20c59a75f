//! Error taxonomy for the position engine.
//!
//! Every failure surfaced by the orchestrator carries a stable [`ErrorCode`]
//! that maps to an HTTP status for the front door.
//!
//! | Code | HTTP | Meaning |
//! |------|------|---------|
//! | `INVALID_SIGNAL` | 400 | Malformed signal (bad quantity, symbol, levels) |
//! | `SESSION_CLOSED` | 409 | Trading not permitted now |
//! | `UNKNOWN_SYMBOL` | 422 | Symbol has no instrument mapping |
//! | `ENTRY_REJECTED` | 422 | Entry rejected or cancelled by broker |
//! | `ENTRY_FILL_TIMEOUT` | 504 | Entry fill not confirmed in time |
//! | `PROTECTION_PLACEMENT_FAILED` | 500 | Stop-loss could not be placed |
//! | `REVERSAL_EXIT_FAILED` | 502 | Could not flatten the position being reversed |
//! | `EXIT_ORDER_FAILED` | 502 | Could not place a closing market order |
//! | `POSITION_NOT_FOUND` | 404 | No open position for the symbol |
//! | `RECONCILIATION_DIVERGENCE` | 409 | Local book and broker disagree (informational) |
//! | `BROKER_UNAVAILABLE` | 503 | Broker call failed after retries |
//! | `STORE_FAILURE` | 500 | Position store failure |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::{BrokerError, StoreError};
use crate::domain::shared::DomainError;

/// Error codes for the position engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed signal.
    InvalidSignal,
    /// Market session closed.
    SessionClosed,
    /// Symbol not in the instrument map.
    UnknownSymbol,
    /// Entry order rejected or cancelled.
    EntryRejected,
    /// Entry fill not confirmed within the timeout.
    EntryFillTimeout,
    /// Stop-loss placement failed.
    ProtectionPlacementFailed,
    /// Exit of the reversed position failed.
    ReversalExitFailed,
    /// Closing market order failed.
    ExitOrderFailed,
    /// No position for the symbol.
    PositionNotFound,
    /// Local and broker state disagree.
    ReconciliationDivergence,
    /// Broker call failed after retries.
    BrokerUnavailable,
    /// Position store failure.
    StoreFailure,
}

impl ErrorCode {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidSignal => 400,
            Self::PositionNotFound => 404,
            Self::SessionClosed | Self::ReconciliationDivergence => 409,
            Self::UnknownSymbol | Self::EntryRejected => 422,
            Self::ProtectionPlacementFailed | Self::StoreFailure => 500,
            Self::ReversalExitFailed | Self::ExitOrderFailed => 502,
            Self::BrokerUnavailable => 503,
            Self::EntryFillTimeout => 504,
        }
    }

    /// Get the error reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidSignal => "INVALID_SIGNAL",
            Self::SessionClosed => "SESSION_CLOSED",
            Self::UnknownSymbol => "UNKNOWN_SYMBOL",
            Self::EntryRejected => "ENTRY_REJECTED",
            Self::EntryFillTimeout => "ENTRY_FILL_TIMEOUT",
            Self::ProtectionPlacementFailed => "PROTECTION_PLACEMENT_FAILED",
            Self::ReversalExitFailed => "REVERSAL_EXIT_FAILED",
            Self::ExitOrderFailed => "EXIT_ORDER_FAILED",
            Self::PositionNotFound => "POSITION_NOT_FOUND",
            Self::ReconciliationDivergence => "RECONCILIATION_DIVERGENCE",
            Self::BrokerUnavailable => "BROKER_UNAVAILABLE",
            Self::StoreFailure => "STORE_FAILURE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Errors returned by orchestrator operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Signal failed validation.
    #[error("invalid signal: {message}")]
    InvalidSignal {
        /// What was wrong.
        message: String,
    },

    /// Session is closed.
    #[error("market session is closed, rejected signal for {symbol}")]
    SessionClosed {
        /// Signal symbol.
        symbol: String,
    },

    /// Symbol does not resolve to an instrument.
    #[error("unknown symbol {symbol}")]
    UnknownSymbol {
        /// Signal symbol.
        symbol: String,
    },

    /// Entry order did not fill.
    #[error("entry for {symbol} was not filled: {reason}")]
    EntryRejected {
        /// Signal symbol.
        symbol: String,
        /// Broker reason.
        reason: String,
    },

    /// Entry fill not confirmed in time. The entry is left as-is.
    #[error("entry {order_id} for {symbol} not confirmed filled after {waited_ms}ms")]
    EntryFillTimeout {
        /// Signal symbol.
        symbol: String,
        /// Entry order id.
        order_id: String,
        /// How long verification polled.
        waited_ms: u64,
    },

    /// Stop-loss could not be placed and the emergency exit also failed.
    /// The position stays tracked without a stop.
    #[error("stop-loss for {symbol} could not be placed and the emergency exit failed: {reason}")]
    ProtectionPlacementFailed {
        /// Position symbol.
        symbol: String,
        /// Failure details.
        reason: String,
    },

    /// The position being reversed could not be flattened.
    #[error("could not exit {symbol} for reversal: {reason}")]
    ReversalExitFailed {
        /// Position symbol.
        symbol: String,
        /// Failure details.
        reason: String,
    },

    /// Closing market order failed. The position stays tracked.
    #[error("exit order for {symbol} failed: {reason}")]
    ExitOrderFailed {
        /// Position symbol.
        symbol: String,
        /// Failure details.
        reason: String,
    },

    /// No open position for the symbol.
    #[error("no open position for {symbol}")]
    PositionNotFound {
        /// Requested symbol.
        symbol: String,
    },

    /// Broker failure outside of the named lifecycle steps.
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Position store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrchestratorError {
    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidSignal { .. } => ErrorCode::InvalidSignal,
            Self::SessionClosed { .. } => ErrorCode::SessionClosed,
            Self::UnknownSymbol { .. } => ErrorCode::UnknownSymbol,
            Self::EntryRejected { .. } => ErrorCode::EntryRejected,
            Self::EntryFillTimeout { .. } => ErrorCode::EntryFillTimeout,
            Self::ProtectionPlacementFailed { .. } => ErrorCode::ProtectionPlacementFailed,
            Self::ReversalExitFailed { .. } => ErrorCode::ReversalExitFailed,
            Self::ExitOrderFailed { .. } => ErrorCode::ExitOrderFailed,
            Self::PositionNotFound { .. } => ErrorCode::PositionNotFound,
            Self::Broker(_) => ErrorCode::BrokerUnavailable,
            Self::Store(_) => ErrorCode::StoreFailure,
        }
    }

    /// Symbol the error concerns, when there is one.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::SessionClosed { symbol }
            | Self::UnknownSymbol { symbol }
            | Self::EntryRejected { symbol, .. }
            | Self::EntryFillTimeout { symbol, .. }
            | Self::ProtectionPlacementFailed { symbol, .. }
            | Self::ReversalExitFailed { symbol, .. }
            | Self::ExitOrderFailed { symbol, .. }
            | Self::PositionNotFound { symbol } => Some(symbol),
            Self::InvalidSignal { .. } | Self::Broker(_) | Self::Store(_) => None,
        }
    }

    /// Convert to an HTTP-compatible error response.
    #[must_use]
    pub fn to_http_response(&self) -> HttpErrorResponse {
        let mut details = HashMap::new();
        if let Some(symbol) = self.symbol() {
            details.insert("symbol".to_string(), symbol.to_string());
        }
        if let Self::EntryFillTimeout { order_id, .. } = self {
            details.insert("order_id".to_string(), order_id.clone());
        }

        HttpErrorResponse {
            code: self.code().reason().to_string(),
            message: self.to_string(),
            details,
        }
    }
}

impl From<DomainError> for OrchestratorError {
    fn from(err: DomainError) -> Self {
        Self::InvalidSignal {
            message: err.to_string(),
        }
    }
}

/// HTTP-compatible error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error code string.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Additional details.
    pub details: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_mapping() {
        assert_eq!(ErrorCode::InvalidSignal.http_status(), 400);
        assert_eq!(ErrorCode::SessionClosed.http_status(), 409);
        assert_eq!(ErrorCode::PositionNotFound.http_status(), 404);
        assert_eq!(ErrorCode::EntryFillTimeout.http_status(), 504);
        assert_eq!(ErrorCode::BrokerUnavailable.http_status(), 503);
    }

    #[test]
    fn test_error_code_serde() {
        let json = serde_json::to_string(&ErrorCode::ReversalExitFailed).unwrap();
        assert_eq!(json, "\"REVERSAL_EXIT_FAILED\"");
        assert_eq!(ErrorCode::ReversalExitFailed.reason(), "REVERSAL_EXIT_FAILED");
    }

    #[test]
    fn test_to_http_response() {
        let error = OrchestratorError::EntryFillTimeout {
            symbol: "RELIANCE".to_string(),
            order_id: "250101000001".to_string(),
            waited_ms: 30_000,
        };
        let response = error.to_http_response();

        assert_eq!(response.code, "ENTRY_FILL_TIMEOUT");
        assert_eq!(response.details.get("symbol").map(String::as_str), Some("RELIANCE"));
        assert!(response.details.contains_key("order_id"));
    }

    #[test]
    fn test_broker_error_maps_to_unavailable() {
        let error: OrchestratorError = BrokerError::RateLimited.into();
        assert_eq!(error.code(), ErrorCode::BrokerUnavailable);
        assert!(error.symbol().is_none());
    }

    #[test]
    fn test_domain_error_maps_to_invalid_signal() {
        let error: OrchestratorError = DomainError::invalid_value("quantity", "must be at least 1").into();
        assert_eq!(error.code(), ErrorCode::InvalidSignal);
        assert!(error.to_string().contains("quantity"));
    }
}
