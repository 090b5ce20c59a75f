//! Notifier adapters.
//!
//! - [`TelegramNotifier`]: HTML messages through the Bot API
//! - [`LogNotifier`]: writes alerts to the log when no sink is configured
//! - [`InMemoryNotifier`]: collects messages for tests

mod log;
mod memory;
mod telegram;

pub use log::LogNotifier;
pub use memory::InMemoryNotifier;
pub use telegram::{TelegramConfig, TelegramNotifier};
