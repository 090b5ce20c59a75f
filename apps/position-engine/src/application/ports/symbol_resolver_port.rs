//! Symbol Resolver Port (Driven Port)
//!
//! Maps signal symbols to broker instrument keys.

use crate::domain::shared::{InstrumentKey, Symbol};

/// Port for symbol-to-instrument lookup.
pub trait SymbolResolverPort: Send + Sync {
    /// Instrument for `symbol`, or `None` when the symbol is not tradeable.
    fn resolve(&self, symbol: &Symbol) -> Option<InstrumentKey>;
}
