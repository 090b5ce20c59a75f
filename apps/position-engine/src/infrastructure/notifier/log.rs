use async_trait::async_trait;

use crate::application::ports::NotifierPort;

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotifierPort for LogNotifier {
    async fn notify(&self, message: &str) {
        tracing::info!(target: "position_engine::alerts", %message, "Notification");
    }
}
