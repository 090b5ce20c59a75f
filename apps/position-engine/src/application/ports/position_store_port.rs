//! Position Store Port (Driven Port)
//!
//! Durable symbol → position mapping. Each call is atomic with respect to a
//! crash: after a restart the store holds either the old or the new value.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::position_lifecycle::Position;
use crate::domain::shared::Symbol;

/// Position store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("position store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("position store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Port for position persistence.
#[async_trait]
pub trait PositionStorePort: Send + Sync {
    /// Every persisted position.
    async fn load(&self) -> Result<Vec<Position>, StoreError>;

    /// Insert or replace the position for its symbol.
    async fn save(&self, position: &Position) -> Result<(), StoreError>;

    /// Remove the position for `symbol`. Removing a missing symbol is not an error.
    async fn delete(&self, symbol: &Symbol) -> Result<(), StoreError>;
}
