//! Upstox-specific error types.

use thiserror::Error;

use crate::application::ports::BrokerError;

/// Errors from the Upstox adapter.
#[derive(Debug, Error, Clone)]
pub enum UpstoxError {
    /// Request never reached the server.
    #[error("Connection error: {0}")]
    Connection(String),

    /// No response within the HTTP timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server-side failure (408, 5xx).
    #[error("Upstox unavailable ({status}): {message}")]
    Unavailable {
        /// HTTP status.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The request may have reached Upstox but no usable answer came back.
    #[error("Upstox outcome unknown: {0}")]
    Indeterminate(String),

    /// API returned a non-retryable error.
    #[error("API error ({status}): {code} - {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Error code from the API.
        code: String,
        /// Error message from the API.
        message: String,
    },

    /// Order was rejected.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Order is already complete, cancelled or rejected.
    #[error("Order {order_id} is not open: {message}")]
    OrderNotOpen {
        /// The order ID.
        order_id: String,
        /// Error message from the API.
        message: String,
    },

    /// Order not found.
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// The order ID that was not found.
        order_id: String,
    },

    /// Token missing, invalid or expired.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),
}

impl From<UpstoxError> for BrokerError {
    fn from(err: UpstoxError) -> Self {
        match err {
            UpstoxError::Connection(message) => Self::ConnectionError { message },
            UpstoxError::Timeout(operation) => Self::Timeout { operation },
            UpstoxError::Unavailable { status, message } => Self::Unavailable {
                message: format!("{status}: {message}"),
            },
            UpstoxError::Indeterminate(message) | UpstoxError::JsonParse(message) => {
                Self::Unknown { message }
            }
            UpstoxError::Api { code, message, .. } => Self::Unknown {
                message: format!("{code}: {message}"),
            },
            UpstoxError::OrderRejected(reason) => Self::OrderRejected { reason },
            UpstoxError::OrderNotOpen { order_id, message } => Self::OrderNotOpen {
                order_id,
                reason: message,
            },
            UpstoxError::OrderNotFound { order_id } => Self::OrderNotFound { order_id },
            UpstoxError::AuthenticationFailed => Self::AuthenticationFailed,
            UpstoxError::RateLimited => Self::RateLimited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_error_maps_to_retryable() {
        let broker_err: BrokerError = UpstoxError::Connection("refused".to_string()).into();
        assert!(matches!(broker_err, BrokerError::ConnectionError { .. }));
    }

    #[test]
    fn not_open_maps_to_benign_cancel_failure() {
        let broker_err: BrokerError = UpstoxError::OrderNotOpen {
            order_id: "1".to_string(),
            message: "already complete".to_string(),
        }
        .into();
        assert!(broker_err.is_benign_cancel_failure());
    }

    #[test]
    fn unreadable_answer_is_not_retried_for_placement() {
        use crate::application::ports::BrokerOperation;

        let broker_err: BrokerError = UpstoxError::JsonParse("expected value".to_string()).into();
        assert!(!broker_err.is_retryable(BrokerOperation::PlaceOrder));

        let broker_err: BrokerError =
            UpstoxError::Indeterminate("connection reset mid-body".to_string()).into();
        assert!(!broker_err.is_retryable(BrokerOperation::PlaceOrder));
    }

    #[test]
    fn server_failure_is_retried_for_placement() {
        use crate::application::ports::BrokerOperation;

        let broker_err: BrokerError = UpstoxError::Unavailable {
            status: 503,
            message: "maintenance".to_string(),
        }
        .into();
        assert!(broker_err.is_retryable(BrokerOperation::PlaceOrder));
    }

    #[test]
    fn auth_maps_through() {
        let broker_err: BrokerError = UpstoxError::AuthenticationFailed.into();
        assert!(matches!(broker_err, BrokerError::AuthenticationFailed));
    }
}
