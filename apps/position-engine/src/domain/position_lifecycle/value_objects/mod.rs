//! Position value objects.

mod child_order;
mod close_reason;
mod direction;
mod leg_plan;
mod protection_levels;

pub use child_order::{ChildOrder, ChildOrders, ChildSlot};
pub use close_reason::CloseReason;
pub use direction::Direction;
pub use leg_plan::LegPlan;
pub use protection_levels::ProtectionLevels;
