//! Persistence Adapters
//!
//! Implementations of `PositionStorePort`.

mod in_memory;
mod json_file;

pub use in_memory::InMemoryPositionStore;
pub use json_file::JsonFilePositionStore;
