//! Upstox API request and response types.
//!
//! These types map directly to the Upstox v2 REST format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::orders::{OrderRequest, OrderSide, OrderStatus, OrderStatusReport, OrderType};

// ============================================================================
// Envelope
// ============================================================================

/// Every Upstox response wraps its payload in `{status, data}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstoxEnvelope<T> {
    /// `success` or `error`.
    pub status: String,
    /// Payload.
    pub data: Option<T>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstoxErrorResponse {
    /// Error entries.
    #[serde(default)]
    pub errors: Vec<UpstoxErrorEntry>,
}

/// One error entry.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstoxErrorEntry {
    /// Error code (e.g. `UDAPI100010`).
    #[serde(rename = "errorCode", alias = "error_code", default)]
    pub error_code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

impl UpstoxErrorResponse {
    /// First error code and message, if any.
    #[must_use]
    pub fn first(&self) -> Option<(&str, &str)> {
        self.errors
            .first()
            .map(|e| (e.error_code.as_str(), e.message.as_str()))
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Body of `POST /v2/order/place`.
#[derive(Debug, Clone, Serialize)]
pub struct PlaceOrderBody {
    /// Quantity.
    pub quantity: u64,
    /// Product code.
    pub product: String,
    /// `DAY` or `IOC`.
    pub validity: String,
    /// Limit price (0 for market and stop-market).
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Order tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Instrument key (`NSE_EQ|ISIN`).
    pub instrument_token: String,
    /// `MARKET`, `LIMIT`, `SL`, `SL-M`.
    pub order_type: String,
    /// `BUY` or `SELL`.
    pub transaction_type: String,
    /// Disclosed quantity.
    pub disclosed_quantity: u64,
    /// Trigger price (0 unless stop).
    #[serde(with = "rust_decimal::serde::float")]
    pub trigger_price: Decimal,
    /// After-market order.
    pub is_amo: bool,
}

impl PlaceOrderBody {
    /// Build the body for `request`.
    #[must_use]
    pub fn from_request(request: &OrderRequest, product: &str, tag: Option<&str>) -> Self {
        let order_type = match request.order_type {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopMarket => "SL-M",
        };
        let transaction_type = match request.side {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        };

        Self {
            quantity: request.quantity,
            product: product.to_string(),
            validity: "DAY".to_string(),
            price: request.limit_price.unwrap_or(Decimal::ZERO),
            tag: tag.map(str::to_string),
            instrument_token: request.instrument.as_str().to_string(),
            order_type: order_type.to_string(),
            transaction_type: transaction_type.to_string(),
            disclosed_quantity: 0,
            trigger_price: request.trigger_price.unwrap_or(Decimal::ZERO),
            is_amo: false,
        }
    }
}

/// `data` of place and cancel responses.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderIdData {
    /// Broker order id.
    pub order_id: String,
}

/// `data` of `GET /v2/order/details`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDetails {
    /// Broker order id.
    pub order_id: String,
    /// Upstox status string (`open`, `complete`, `rejected`, ...).
    pub status: String,
    /// Filled quantity.
    #[serde(default)]
    pub filled_quantity: u64,
    /// Ordered quantity.
    #[serde(default)]
    pub quantity: u64,
    /// Exchange or RMS message.
    #[serde(default)]
    pub status_message: Option<String>,
}

impl OrderDetails {
    /// Map the Upstox status to the broker-agnostic report.
    #[must_use]
    pub fn to_report(&self) -> OrderStatusReport {
        let status = match self.status.to_ascii_lowercase().as_str() {
            "complete" => OrderStatus::Filled,
            "rejected" => OrderStatus::Rejected,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        };
        OrderStatusReport {
            status,
            filled_qty: self.filled_quantity,
            message: self.status_message.clone().filter(|m| !m.is_empty()),
        }
    }
}

// ============================================================================
// Positions
// ============================================================================

/// One entry of `GET /v2/portfolio/short-term-positions`.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionEntry {
    /// Trading symbol.
    #[serde(alias = "tradingsymbol")]
    pub trading_symbol: String,
    /// Instrument key.
    #[serde(default)]
    pub instrument_token: String,
    /// Net signed quantity.
    #[serde(default)]
    pub quantity: i64,
}
