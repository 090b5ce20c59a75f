//! Orders Bounded Context
//!
//! Broker-agnostic order vocabulary shared by the orchestrator and the
//! broker adapters.

pub mod value_objects;

pub use value_objects::{OrderRequest, OrderSide, OrderStatus, OrderStatusReport, OrderType};
