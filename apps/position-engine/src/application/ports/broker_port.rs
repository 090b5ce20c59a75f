//! Broker Port (Driven Port)
//!
//! Request/response interface to the brokerage. Implementations perform a
//! single attempt per call; bounded retry is layered on top by
//! [`crate::infrastructure::broker::RetryingBroker`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::orders::{OrderRequest, OrderStatusReport};
use crate::domain::shared::{BrokerOrderId, Symbol};

/// A non-zero holding reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Trading symbol.
    pub symbol: Symbol,
    /// Signed quantity (negative for shorts).
    pub quantity: i64,
}

/// Which gateway call failed, for retry classification and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerOperation {
    /// `place_order`.
    PlaceOrder,
    /// `cancel_order`.
    CancelOrder,
    /// `order_status`.
    OrderStatus,
    /// `list_holdings`.
    ListHoldings,
}

impl BrokerOperation {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PlaceOrder => "place_order",
            Self::CancelOrder => "cancel_order",
            Self::OrderStatus => "order_status",
            Self::ListHoldings => "list_holdings",
        }
    }
}

/// Broker port error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    /// Connection could not be established; the request never reached the broker.
    #[error("Broker connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },

    /// No response within the per-call timeout.
    #[error("Broker call timed out: {operation}")]
    Timeout {
        /// Operation that timed out.
        operation: String,
    },

    /// Broker temporarily unavailable (5xx, gateway errors).
    #[error("Broker unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Order rejected by broker.
    #[error("Order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason.
        reason: String,
    },

    /// Order not found.
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// The missing order ID.
        order_id: String,
    },

    /// Order is no longer open (already filled, cancelled or rejected).
    #[error("Order {order_id} is not open: {reason}")]
    OrderNotOpen {
        /// The order ID.
        order_id: String,
        /// Broker explanation.
        reason: String,
    },

    /// Credentials missing or expired.
    #[error("Broker authentication failed")]
    AuthenticationFailed,

    /// Rate limited.
    #[error("Rate limited by broker")]
    RateLimited,

    /// Unknown error.
    #[error("Broker error: {message}")]
    Unknown {
        /// Error details.
        message: String,
    },
}

impl BrokerError {
    /// Whether a failed `operation` may be attempted again.
    ///
    /// A broker that answered with a 5xx refused the request, so placement
    /// is retried on it just like connection failures and rate limits. A
    /// timed-out placement may still have created an order and is not
    /// retried.
    #[must_use]
    pub const fn is_retryable(&self, operation: BrokerOperation) -> bool {
        match self {
            Self::ConnectionError { .. } | Self::RateLimited | Self::Unavailable { .. } => true,
            Self::Timeout { .. } => !matches!(operation, BrokerOperation::PlaceOrder),
            _ => false,
        }
    }

    /// A cancel refused because the broker does not consider the order open.
    /// Not proof that the order stopped working: a modification in flight is
    /// refused the same way.
    #[must_use]
    pub const fn is_benign_cancel_failure(&self) -> bool {
        matches!(self, Self::OrderNotOpen { .. } | Self::OrderNotFound { .. })
    }
}

/// Port for broker interactions.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Submit an order. Returns the broker order id.
    async fn place_order(&self, request: &OrderRequest) -> Result<BrokerOrderId, BrokerError>;

    /// Cancel a working order.
    async fn cancel_order(&self, order_id: &BrokerOrderId) -> Result<(), BrokerError>;

    /// Current status and filled quantity of an order.
    async fn order_status(
        &self,
        order_id: &BrokerOrderId,
    ) -> Result<OrderStatusReport, BrokerError>;

    /// Non-zero holdings for the account.
    async fn list_holdings(&self) -> Result<Vec<Holding>, BrokerError>;
}
