//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//!
//! # Bounded Contexts
//!
//! - [`orders`]: Order requests, sides, types and broker status
//! - [`position_lifecycle`]: The per-symbol position and its child orders

pub mod orders;
pub mod position_lifecycle;
pub mod shared;
