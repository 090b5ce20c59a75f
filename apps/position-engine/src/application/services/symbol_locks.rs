//! Per-symbol mutation locks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::shared::Symbol;

/// At most one in-flight mutation per symbol.
///
/// The registry mutex is held only long enough to look up the symbol's lock,
/// never across an await point.
#[derive(Debug, Default)]
pub struct SymbolLocks {
    locks: Mutex<HashMap<Symbol, Arc<AsyncMutex<()>>>>,
}

impl SymbolLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `symbol`.
    pub async fn acquire(&self, symbol: &Symbol) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(symbol.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Try to take `symbol` without waiting.
    #[must_use]
    pub fn try_acquire(&self, symbol: &Symbol) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(symbol.clone()).or_default())
        };
        lock.try_lock_owned().ok()
    }
}
