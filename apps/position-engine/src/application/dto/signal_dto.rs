//! Signal DTOs

use serde::{Deserialize, Serialize};

use crate::domain::position_lifecycle::{Direction, ProtectionLevels};
use crate::domain::shared::{DomainError, Symbol};

/// Command to open (or reverse into) a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPositionCommand {
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Long or short.
    pub direction: Direction,
    /// Requested quantity (at least 1).
    pub quantity: u64,
    /// Stop-loss and target prices.
    #[serde(default)]
    pub levels: ProtectionLevels,
}

impl OpenPositionCommand {
    /// Check the command before anything is sent to the broker.
    ///
    /// # Errors
    ///
    /// Returns error for an invalid symbol, zero quantity or a non-positive level.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.symbol.validate()?;
        if self.quantity == 0 {
            return Err(DomainError::invalid_value("quantity", "must be at least 1"));
        }
        self.levels.validate()
    }
}
