//! HTTP/REST API adapter.
//!
//! Inbound adapter: the signal webhook and operator endpoints, delegating to
//! the position orchestrator.

mod controller;
mod request;
mod response;

pub use controller::{AppState, create_router};
pub use request::*;
pub use response::*;
