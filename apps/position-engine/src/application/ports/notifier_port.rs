//! Notifier Port (Driven Port)
//!
//! One-way operator alerts. Delivery failures never reach the caller.

use async_trait::async_trait;

/// Port for operator notifications.
#[async_trait]
pub trait NotifierPort: Send + Sync {
    /// Deliver `message`. Implementations swallow and log their own failures
    /// and bound their own latency.
    async fn notify(&self, message: &str);

    /// Wait until messages already handed to `notify` are delivered or
    /// dropped. Called once before the process exits.
    async fn flush(&self) {}
}
