//! Symbol resolver adapters.

mod static_resolver;

pub use static_resolver::{ResolverError, StaticSymbolResolver};
