//! Upstox adapter configuration.

use std::time::Duration;

/// Production REST host.
pub const DEFAULT_BASE_URL: &str = "https://api.upstox.com";

/// Configuration for the Upstox broker adapter.
#[derive(Debug, Clone)]
pub struct UpstoxConfig {
    /// OAuth access token (acquired outside this service).
    pub access_token: String,
    /// REST host, without a trailing slash.
    pub base_url: String,
    /// Product code (`I` intraday, `D` delivery).
    pub product: String,
    /// Tag attached to every order.
    pub tag: Option<String>,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl UpstoxConfig {
    /// Create a configuration for the production host with intraday product.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            product: "I".to_string(),
            tag: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Point the adapter at another host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the product code.
    #[must_use]
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = product.into();
        self
    }

    /// Set the order tag.
    #[must_use]
    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_intraday_on_production_host() {
        let config = UpstoxConfig::new("token");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.product, "I");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = UpstoxConfig::new("token").with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }
}
