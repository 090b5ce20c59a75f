//! Order request snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderSide, OrderType};
use crate::domain::shared::{DomainError, InstrumentKey, Symbol};

/// Everything needed to (re)submit an order to the broker.
///
/// Child orders keep the request they were placed with so they can be
/// recreated identically after a cancellation without recomputing levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Symbol the order belongs to.
    pub symbol: Symbol,
    /// Resolved broker instrument.
    pub instrument: InstrumentKey,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity in shares.
    pub quantity: u64,
    /// Limit price (limit orders only).
    pub limit_price: Option<Decimal>,
    /// Trigger price (stop orders only).
    pub trigger_price: Option<Decimal>,
}

impl OrderRequest {
    /// Create a market order request.
    #[must_use]
    pub const fn market(
        symbol: Symbol,
        instrument: InstrumentKey,
        side: OrderSide,
        quantity: u64,
    ) -> Self {
        Self {
            symbol,
            instrument,
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
            trigger_price: None,
        }
    }

    /// Create a limit order request.
    #[must_use]
    pub const fn limit(
        symbol: Symbol,
        instrument: InstrumentKey,
        side: OrderSide,
        quantity: u64,
        limit_price: Decimal,
    ) -> Self {
        Self {
            symbol,
            instrument,
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price: Some(limit_price),
            trigger_price: None,
        }
    }

    /// Create a stop-market order request.
    #[must_use]
    pub const fn stop_market(
        symbol: Symbol,
        instrument: InstrumentKey,
        side: OrderSide,
        quantity: u64,
        trigger_price: Decimal,
    ) -> Self {
        Self {
            symbol,
            instrument,
            side,
            order_type: OrderType::StopMarket,
            quantity,
            limit_price: None,
            trigger_price: Some(trigger_price),
        }
    }

    /// Same order for a different quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: u64) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }

    /// Check the request is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns error for zero quantity, missing prices for the order type,
    /// or non-positive prices.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::invalid_value("quantity", "must be at least 1"));
        }

        match self.order_type {
            OrderType::Market => {}
            OrderType::Limit => match self.limit_price {
                Some(price) if price > Decimal::ZERO => {}
                _ => {
                    return Err(DomainError::invalid_value(
                        "limit_price",
                        "limit orders need a positive limit price",
                    ));
                }
            },
            OrderType::StopMarket => match self.trigger_price {
                Some(price) if price > Decimal::ZERO => {}
                _ => {
                    return Err(DomainError::invalid_value(
                        "trigger_price",
                        "stop orders need a positive trigger price",
                    ));
                }
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn reliance() -> (Symbol, InstrumentKey) {
        (
            Symbol::new("RELIANCE"),
            InstrumentKey::new("NSE_EQ|INE002A01018"),
        )
    }

    #[test]
    fn market_request_has_no_prices() {
        let (symbol, key) = reliance();
        let request = OrderRequest::market(symbol, key, OrderSide::Buy, 10);

        assert_eq!(request.order_type, OrderType::Market);
        assert!(request.limit_price.is_none());
        assert!(request.trigger_price.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn stop_market_requires_trigger() {
        let (symbol, key) = reliance();
        let mut request = OrderRequest::stop_market(symbol, key, OrderSide::Sell, 10, dec!(95));
        assert!(request.validate().is_ok());

        request.trigger_price = None;
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let (symbol, key) = reliance();
        let request = OrderRequest::limit(symbol, key, OrderSide::Sell, 0, dec!(110));
        assert!(request.validate().is_err());
    }

    #[test]
    fn with_quantity_keeps_levels() {
        let (symbol, key) = reliance();
        let stop = OrderRequest::stop_market(symbol, key, OrderSide::Sell, 10, dec!(95));
        let reduced = stop.with_quantity(5);

        assert_eq!(reduced.quantity, 5);
        assert_eq!(reduced.trigger_price, Some(dec!(95)));
        assert_eq!(reduced.side, OrderSide::Sell);
    }
}
