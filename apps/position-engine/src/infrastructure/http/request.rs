//! HTTP request DTOs.
//!
//! Webhook payloads come from charting alerts and are parsed leniently:
//! numeric fields may be numbers or strings, and template placeholders that
//! were never rendered (`"{{close}}"`) count as absent.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer};

use crate::application::dto::OpenPositionCommand;
use crate::domain::position_lifecycle::{Direction, ProtectionLevels};
use crate::domain::shared::Symbol;
use crate::error::OrchestratorError;

/// Raw webhook body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookRequest {
    /// `BUY`, `SELL` or `CLOSE` (any case).
    #[serde(default)]
    pub action: String,
    /// Trading symbol.
    #[serde(default)]
    pub symbol: Option<String>,
    /// Quantity (default 1).
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub qty: Option<Decimal>,
    /// Reference price used to derive levels from `risk`.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    /// Stop-loss price.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub sl: Option<Decimal>,
    /// Take-profit price.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub tp: Option<Decimal>,
    /// Partial take-profit price.
    #[serde(default, alias = "tp1", deserialize_with = "lenient_decimal")]
    pub partial_tp: Option<Decimal>,
    /// Risk per share in price units.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub risk: Option<Decimal>,
    /// Reward-to-risk multiple (default 1).
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub rr: Option<Decimal>,
}

/// Parsed webhook intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookSignal {
    /// Open or reverse into a position.
    Open(OpenPositionCommand),
    /// Close the position for a symbol.
    Close(Symbol),
}

impl WebhookRequest {
    /// Interpret the payload.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignal` for a missing symbol, unknown action or a
    /// quantity that is not a positive whole number.
    pub fn into_signal(self) -> Result<WebhookSignal, OrchestratorError> {
        let symbol = self
            .symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.contains("{{"))
            .map(Symbol::new)
            .ok_or_else(|| invalid("symbol missing"))?;

        let direction = match self.action.trim().to_ascii_uppercase().as_str() {
            "BUY" => Direction::Long,
            "SELL" => Direction::Short,
            "CLOSE" => return Ok(WebhookSignal::Close(symbol)),
            other => return Err(invalid(format!("unknown action '{other}'"))),
        };

        let qty = self.qty.unwrap_or(Decimal::ONE);
        if qty.fract() != Decimal::ZERO {
            return Err(invalid(format!("quantity {qty} is not a whole number")));
        }
        let quantity = qty
            .to_u64()
            .filter(|q| *q > 0)
            .ok_or_else(|| invalid(format!("quantity {qty} must be at least 1")))?;

        let levels = self.levels(direction);
        Ok(WebhookSignal::Open(OpenPositionCommand {
            symbol,
            direction,
            quantity,
            levels,
        }))
    }

    /// Explicit levels, or levels derived from `price`, `risk` and `rr`.
    fn levels(&self, direction: Direction) -> ProtectionLevels {
        let explicit = |level: Option<Decimal>| level.filter(|p| !p.is_zero());
        let mut stop_loss = explicit(self.sl);
        let mut take_profit = explicit(self.tp);

        if let (Some(price), Some(risk)) = (self.price, self.risk)
            && price > Decimal::ZERO
            && risk > Decimal::ZERO
        {
            let rr = self.rr.filter(|r| *r > Decimal::ZERO).unwrap_or(Decimal::ONE);
            let sign = Decimal::from(direction.sign());
            stop_loss = stop_loss.or(Some(price - sign * risk));
            take_profit = take_profit.or(Some(price + sign * risk * rr));
        }

        ProtectionLevels {
            stop_loss,
            take_profit,
            partial_take_profit: explicit(self.partial_tp),
        }
    }
}

fn invalid(message: impl Into<String>) -> OrchestratorError {
    OrchestratorError::InvalidSignal {
        message: message.into(),
    }
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let text = match value {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.contains("{{") {
                return Ok(None);
            }
            trimmed.to_string()
        }
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a number, got {other}"
            )));
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|e| serde::de::Error::custom(format!("invalid number '{text}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<WebhookSignal, OrchestratorError> {
        serde_json::from_value::<WebhookRequest>(value)
            .unwrap()
            .into_signal()
    }

    fn open(value: serde_json::Value) -> OpenPositionCommand {
        match parse(value).unwrap() {
            WebhookSignal::Open(command) => command,
            WebhookSignal::Close(_) => panic!("expected open"),
        }
    }

    #[test]
    fn buy_with_string_numbers() {
        let command = open(json!({
            "action": "buy", "symbol": "reliance", "qty": "10",
            "sl": "2400.5", "tp": 2650, "partial_tp": "2500"
        }));

        assert_eq!(command.symbol.as_str(), "RELIANCE");
        assert_eq!(command.direction, Direction::Long);
        assert_eq!(command.quantity, 10);
        assert_eq!(command.levels.stop_loss, Some(dec!(2400.5)));
        assert_eq!(command.levels.take_profit, Some(dec!(2650)));
        assert_eq!(command.levels.partial_take_profit, Some(dec!(2500)));
    }

    #[test]
    fn unrendered_placeholders_are_absent() {
        let command = open(json!({
            "action": "SELL", "symbol": "SBIN", "qty": "{{strategy.order.contracts}}",
            "sl": "{{plot_0}}", "tp": ""
        }));

        assert_eq!(command.quantity, 1);
        assert_eq!(command.levels, ProtectionLevels::default());
    }

    #[test]
    fn long_levels_derived_from_risk() {
        let command = open(json!({
            "action": "BUY", "symbol": "RELIANCE", "price": 2450.5, "risk": 50, "rr": 4
        }));

        assert_eq!(command.levels.stop_loss, Some(dec!(2400.5)));
        assert_eq!(command.levels.take_profit, Some(dec!(2650.5)));
    }

    #[test]
    fn short_levels_derived_from_risk_keep_explicit_stop() {
        let command = open(json!({
            "action": "SELL", "symbol": "INFY", "price": "1500", "risk": "20", "sl": 1515
        }));

        assert_eq!(command.levels.stop_loss, Some(dec!(1515)));
        assert_eq!(command.levels.take_profit, Some(dec!(1480)));
    }

    #[test]
    fn close_action() {
        let signal = parse(json!({"action": "close", "symbol": "tcs"})).unwrap();
        assert_eq!(signal, WebhookSignal::Close(Symbol::new("TCS")));
    }

    #[test]
    fn rejects_missing_symbol_and_unknown_action() {
        assert!(matches!(
            parse(json!({"action": "BUY"})),
            Err(OrchestratorError::InvalidSignal { .. })
        ));
        assert!(matches!(
            parse(json!({"action": "HOLD", "symbol": "SBIN"})),
            Err(OrchestratorError::InvalidSignal { .. })
        ));
    }

    #[test]
    fn rejects_fractional_and_zero_quantity() {
        assert!(parse(json!({"action": "BUY", "symbol": "SBIN", "qty": 2.5})).is_err());
        assert!(parse(json!({"action": "BUY", "symbol": "SBIN", "qty": "0"})).is_err());
    }
}
