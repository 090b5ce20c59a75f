//! Operator notification configuration.

use serde::{Deserialize, Serialize};

use crate::infrastructure::notifier::TelegramConfig as AdapterConfig;

/// Notification configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Telegram sink.
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token.
    #[serde(default)]
    pub bot_token: String,
    /// Destination chat id.
    #[serde(default)]
    pub chat_id: String,
    /// API base URL override.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl TelegramConfig {
    /// Adapter configuration, when both token and chat are set.
    #[must_use]
    pub fn to_adapter_config(&self) -> Option<AdapterConfig> {
        if self.bot_token.trim().is_empty() || self.chat_id.trim().is_empty() {
            return None;
        }
        let config = AdapterConfig::new(self.bot_token.trim(), self.chat_id.trim());
        Some(match &self.base_url {
            Some(url) if !url.is_empty() => config.with_base_url(url.clone()),
            _ => config,
        })
    }
}
