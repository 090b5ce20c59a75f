//! Telegram Bot API notifier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio_util::task::TaskTracker;

use crate::application::ports::NotifierPort;

/// Default Bot API base URL.
pub const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

/// Telegram notifier configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token.
    pub bot_token: String,
    /// Destination chat.
    pub chat_id: String,
    /// API base URL.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl TelegramConfig {
    /// Create a config for the public Bot API.
    #[must_use]
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            base_url: DEFAULT_TELEGRAM_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

/// Sends HTML messages to one chat. Delivery failures are logged and dropped.
///
/// `notify` hands the message to a background task and returns at once;
/// `flush` waits for everything handed over so far.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    url: String,
    chat_id: String,
    in_flight: TaskTracker,
}

impl TelegramNotifier {
    /// Create a notifier.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &TelegramConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/bot{}/sendMessage", config.base_url, config.bot_token),
            chat_id: config.chat_id.clone(),
            in_flight: TaskTracker::new(),
        })
    }

    /// Post `message` and wait for the Bot API's answer.
    pub async fn deliver(&self, message: &str) {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        match self.client.post(&self.url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("Telegram message delivered");
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let detail = response.text().await.unwrap_or_default();
                tracing::warn!(status, %detail, "Telegram rejected message");
            }
            Err(e) => {
                // The URL carries the bot token.
                tracing::warn!(error = %e.without_url(), "Telegram delivery failed");
            }
        }
    }
}

#[async_trait]
impl NotifierPort for TelegramNotifier {
    async fn notify(&self, message: &str) {
        let notifier = self.clone();
        let message = message.to_string();
        self.in_flight.spawn(async move {
            notifier.deliver(&message).await;
        });
    }

    async fn flush(&self) {
        self.in_flight.close();
        self.in_flight.wait().await;
        self.in_flight.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_html_message_to_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_json(json!({
                "chat_id": "42",
                "text": "<b>hello</b>",
                "parse_mode": "HTML",
                "disable_web_page_preview": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let config = TelegramConfig::new("TOKEN", "42").with_base_url(server.uri());
        TelegramNotifier::new(&config)
            .unwrap()
            .deliver("<b>hello</b>")
            .await;
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let config = TelegramConfig::new("TOKEN", "42").with_base_url(server.uri());
        TelegramNotifier::new(&config).unwrap().deliver("text").await;
    }

    #[tokio::test]
    async fn notify_returns_before_slow_delivery_and_flush_waits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true}))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let config = TelegramConfig::new("TOKEN", "42").with_base_url(server.uri());
        let notifier = TelegramNotifier::new(&config).unwrap();

        let started = std::time::Instant::now();
        notifier.notify("first").await;
        notifier.notify("second").await;
        assert!(started.elapsed() < Duration::from_millis(150));

        notifier.flush().await;
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
