//! Upstox Broker Adapter
//!
//! Implementation of `BrokerPort` for the Upstox v2 REST API:
//! - Order place / cancel / details
//! - Short-term (intraday) positions as holdings
//! - Status-based error classification for the retry decorator

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::UpstoxBrokerAdapter;
pub use config::{DEFAULT_BASE_URL, UpstoxConfig};
pub use error::UpstoxError;
