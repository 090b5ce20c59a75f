//! Application Layer
//!
//! The application layer orchestrates domain logic. It defines:
//!
//! - **Ports**: Interfaces for interacting with external systems
//! - **Services**: The position orchestrator and its background tasks
//! - **DTOs**: Commands and outcomes crossing the API boundary

pub mod dto;
pub mod ports;
pub mod services;

pub use dto::*;
pub use ports::*;
pub use services::*;
