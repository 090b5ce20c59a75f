//! Broker gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::broker::BrokerRetryPolicy;
use crate::infrastructure::broker::upstox::DEFAULT_BASE_URL;

/// Which gateway to trade through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerMode {
    /// In-process simulated broker.
    #[default]
    Paper,
    /// Upstox REST API.
    Live,
}

impl BrokerMode {
    /// Upper-case label for logs and notifications.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paper => "PAPER",
            Self::Live => "LIVE",
        }
    }
}

/// Broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// `paper` or `live`.
    #[serde(default)]
    pub mode: BrokerMode,
    /// Upstox settings (used in live mode).
    #[serde(default)]
    pub upstox: UpstoxConfig,
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Retry policy for transient failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            mode: BrokerMode::default(),
            upstox: UpstoxConfig::default(),
            call_timeout_ms: default_call_timeout_ms(),
            retry: RetryConfig::default(),
        }
    }
}

impl BrokerConfig {
    /// Per-call timeout.
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Upstox API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstoxConfig {
    /// OAuth access token, obtained outside this service.
    #[serde(default)]
    pub access_token: String,
    /// API base URL.
    #[serde(default = "default_upstox_base_url")]
    pub base_url: String,
    /// Product code (`I` intraday, `D` delivery).
    #[serde(default = "default_product")]
    pub product: String,
    /// Tag attached to every order.
    #[serde(default)]
    pub tag: Option<String>,
}

impl Default for UpstoxConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: default_upstox_base_url(),
            product: default_product(),
            tag: None,
        }
    }
}

impl UpstoxConfig {
    /// Build the adapter configuration.
    #[must_use]
    pub fn to_adapter_config(&self, timeout: Duration) -> crate::infrastructure::broker::UpstoxConfig {
        let tag = self.tag.clone().filter(|t| !t.is_empty());
        crate::infrastructure::broker::UpstoxConfig::new(self.access_token.trim())
            .with_base_url(self.base_url.clone())
            .with_product(self.product.clone())
            .with_timeout(timeout)
            .with_tag(tag)
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff cap in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    /// Growth factor per attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Random spread as a fraction of the backoff.
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl RetryConfig {
    /// Convert to the gateway retry policy.
    #[must_use]
    pub const fn to_policy(&self) -> BrokerRetryPolicy {
        BrokerRetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            backoff_multiplier: self.backoff_multiplier,
            jitter_factor: self.jitter_factor,
        }
    }
}

const fn default_call_timeout_ms() -> u64 {
    10_000
}

fn default_upstox_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_product() -> String {
    "I".to_string()
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    250
}

const fn default_max_backoff_ms() -> u64 {
    2_000
}

const fn default_backoff_multiplier() -> f64 {
    2.0
}

const fn default_jitter_factor() -> f64 {
    0.2
}
