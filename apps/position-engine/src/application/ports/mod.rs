//! Application Ports (Driven)
//!
//! Ports define interfaces for the external systems the orchestrator drives:
//! the broker, the market calendar, the instrument map, the operator
//! notifier and the position store.

mod broker_port;
mod market_calendar_port;
mod notifier_port;
mod position_store_port;
mod symbol_resolver_port;

pub use broker_port::{BrokerError, BrokerOperation, BrokerPort, Holding};
pub use market_calendar_port::MarketCalendarPort;
pub use notifier_port::NotifierPort;
pub use position_store_port::{PositionStorePort, StoreError};
pub use symbol_resolver_port::SymbolResolverPort;
