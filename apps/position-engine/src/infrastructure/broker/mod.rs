//! Broker Adapters
//!
//! Implementations of `BrokerPort`: the Upstox REST adapter, an in-process
//! paper broker, and the retrying decorator applied to either.

mod paper;
mod retrying;
pub mod upstox;

pub use paper::{MarketFill, PaperBroker};
pub use retrying::RetryingBroker;
pub use upstox::{UpstoxBrokerAdapter, UpstoxConfig, UpstoxError};
