//! In-memory position store for testing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{PositionStorePort, StoreError};
use crate::domain::position_lifecycle::Position;
use crate::domain::shared::Symbol;

/// In-memory implementation of `PositionStorePort`.
///
/// Suitable for testing and paper runs. Not durable.
#[derive(Debug, Default)]
pub struct InMemoryPositionStore {
    positions: RwLock<HashMap<Symbol, Position>>,
    fail_writes: RwLock<bool>,
}

impl InMemoryPositionStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.read().len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.read().is_empty()
    }

    /// Stored position for `symbol`.
    #[must_use]
    pub fn get(&self, symbol: &Symbol) -> Option<Position> {
        self.positions.read().get(symbol).cloned()
    }

    /// Seed a position (for test setup).
    pub fn add(&self, position: Position) {
        self.positions
            .write()
            .insert(position.symbol.clone(), position);
    }

    /// Make subsequent saves and deletes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write() = fail;
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if *self.fail_writes.read() {
            return Err(StoreError::Io(std::io::Error::other("simulated write failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl PositionStorePort for InMemoryPositionStore {
    async fn load(&self) -> Result<Vec<Position>, StoreError> {
        let mut positions: Vec<Position> = self.positions.read().values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    async fn save(&self, position: &Position) -> Result<(), StoreError> {
        self.check_writable()?;
        self.positions
            .write()
            .insert(position.symbol.clone(), position.clone());
        Ok(())
    }

    async fn delete(&self, symbol: &Symbol) -> Result<(), StoreError> {
        self.check_writable()?;
        self.positions.write().remove(symbol);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::orders::{OrderRequest, OrderSide};
    use crate::domain::position_lifecycle::{ChildOrder, Direction};
    use crate::domain::shared::{BrokerOrderId, InstrumentKey};

    fn position() -> Position {
        let request = OrderRequest::market(
            Symbol::new("TCS"),
            InstrumentKey::new("NSE_EQ|INE467B01029"),
            OrderSide::Sell,
            4,
        );
        Position::open(
            ChildOrder::new(BrokerOrderId::new("E1"), request),
            Direction::Short,
            4,
            4,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_and_delete() {
        let store = InMemoryPositionStore::new();
        store.save(&position()).await.unwrap();
        assert_eq!(store.len(), 1);

        store.delete(&Symbol::new("TCS")).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn simulated_failure() {
        let store = InMemoryPositionStore::new();
        store.set_fail_writes(true);
        assert!(store.save(&position()).await.is_err());
        assert!(store.is_empty());
    }
}
