//! Position aggregate.

mod position;

pub use position::Position;
