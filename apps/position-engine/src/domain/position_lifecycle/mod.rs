//! Position Lifecycle Bounded Context
//!
//! The per-symbol position aggregate and the value objects describing its
//! cluster of child orders.
//!
//! A position is one entry order plus up to three resting exits:
//!
//! | Slot | Order type | Quantity |
//! |------|------------|----------|
//! | `stop_loss` | stop-market | outstanding quantity |
//! | `take_profit` | limit | filled minus partial leg |
//! | `partial_take_profit` | limit | `floor(filled / 2)` |

pub mod aggregate;
pub mod value_objects;

pub use aggregate::Position;
pub use value_objects::{
    ChildOrder, ChildOrders, ChildSlot, CloseReason, Direction, LegPlan, ProtectionLevels,
};
