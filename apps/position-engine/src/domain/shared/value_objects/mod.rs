//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.

mod identifiers;
mod symbol;

pub use identifiers::{BrokerOrderId, InstrumentKey};
pub use symbol::Symbol;
