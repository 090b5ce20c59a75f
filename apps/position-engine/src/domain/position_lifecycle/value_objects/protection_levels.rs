//! Exit price levels carried by a signal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::DomainError;

/// Optional stop-loss and target prices for a new position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionLevels {
    /// Stop-loss trigger price.
    pub stop_loss: Option<Decimal>,
    /// Take-profit limit price.
    pub take_profit: Option<Decimal>,
    /// Partial take-profit limit price.
    pub partial_take_profit: Option<Decimal>,
}

impl ProtectionLevels {
    /// Check every present level is a positive price.
    ///
    /// # Errors
    ///
    /// Returns the first non-positive level.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, level) in [
            ("stop_loss", self.stop_loss),
            ("take_profit", self.take_profit),
            ("partial_take_profit", self.partial_take_profit),
        ] {
            if let Some(price) = level
                && price <= Decimal::ZERO
            {
                return Err(DomainError::invalid_value(field, "price must be positive"));
            }
        }
        Ok(())
    }
}
