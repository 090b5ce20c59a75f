//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer. Following
//! hexagonal architecture:
//!
//! - **Driven Adapters (Outbound)**
//!   - `broker/`: Upstox REST adapter, paper broker, retrying decorator
//!   - `calendar/`: Exchange session calendar
//!   - `resolver/`: Symbol to instrument map
//!   - `notifier/`: Telegram and log notifiers
//!   - `persistence/`: JSON file and in-memory position stores
//!
//! - **Driver Adapters (Inbound)**
//!   - `http/`: Signal webhook and operator endpoints

pub mod broker;
pub mod calendar;
pub mod http;
pub mod notifier;
pub mod persistence;
pub mod resolver;
