//! Configuration module for the position engine.
//!
//! YAML configuration with environment variable interpolation and
//! validation for every engine component.
//!
//! # Usage
//!
//! ```rust,ignore
//! use position_engine::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! println!("HTTP port: {}", config.server.http_port);
//! ```

mod broker;
mod notifications;
mod observability;
mod orchestrator;
mod persistence;
mod reconciliation;
mod server;
mod session;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use broker::{BrokerConfig, BrokerMode, RetryConfig, UpstoxConfig};
pub use notifications::{NotificationsConfig, TelegramConfig};
pub use observability::{LoggingConfig, MetricsConfig, ObservabilityConfig, TracingConfig};
pub use orchestrator::{MonitorConfig, OrchestratorConfig, ShutdownConfig};
pub use persistence::{PersistenceConfig, StoreBackend};
pub use reconciliation::ReconciliationConfig;
pub use server::ServerConfig;
pub use session::{InstrumentsConfig, SessionConfig};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "POSITION_ENGINE_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Broker gateway configuration.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Entry fill verification.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Fill monitor.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Periodic broker reconciliation.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
    /// Trading session window.
    #[serde(default)]
    pub session: SessionConfig,
    /// Symbol to instrument map.
    #[serde(default)]
    pub instruments: InstrumentsConfig,
    /// Position store.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Operator notifications.
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Shutdown sweep.
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.broker.mode == BrokerMode::Live && config.broker.upstox.access_token.trim().is_empty()
    {
        return Err(ConfigError::MissingEnvVar(
            "broker.upstox.access_token is required in live mode (UPSTOX_ACCESS_TOKEN)".to_string(),
        ));
    }

    let retry = &config.broker.retry;
    if retry.backoff_multiplier < 1.0 {
        return Err(ConfigError::ValidationError(
            "broker.retry.backoff_multiplier must be at least 1.0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&retry.jitter_factor) {
        return Err(ConfigError::ValidationError(
            "broker.retry.jitter_factor must be between 0.0 and 1.0".to_string(),
        ));
    }

    let intervals = [
        ("broker.call_timeout_ms", config.broker.call_timeout_ms),
        (
            "orchestrator.fill_poll_interval_ms",
            config.orchestrator.fill_poll_interval_ms,
        ),
        (
            "orchestrator.fill_timeout_secs",
            config.orchestrator.fill_timeout_secs,
        ),
        ("monitor.interval_secs", config.monitor.interval_secs),
        (
            "reconciliation.interval_secs",
            config.reconciliation.interval_secs,
        ),
        (
            "session.summary_check_interval_secs",
            config.session.summary_check_interval_secs,
        ),
        (
            "instruments.refresh_interval_secs",
            config.instruments.refresh_interval_secs,
        ),
        ("shutdown.timeout_secs", config.shutdown.timeout_secs),
    ];
    if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be greater than zero"
        )));
    }

    config.session.to_calendar()?;

    if config.observability.metrics.enabled
        && config.observability.metrics.to_exporter_config().is_err()
    {
        return Err(ConfigError::ValidationError(format!(
            "observability.metrics.endpoint '{}' is not a socket address",
            config.observability.metrics.endpoint
        )));
    }

    Ok(())
}

pub(crate) const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::application::ports::MarketCalendarPort;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.broker.mode, BrokerMode::Paper);
        assert_eq!(config.broker.retry.max_retries, 3);
        assert_eq!(config.orchestrator.fill_timeout_secs, 30);
        assert!(config.monitor.enabled);
        assert!(config.monitor.rearm_cancelled_orders);
        assert_eq!(config.reconciliation.grace_period_secs, 60);
        assert_eq!(config.session.open, "09:15");
        assert_eq!(config.persistence.backend, StoreBackend::File);
        assert!(!config.observability.tracing.enabled);
    }

    #[test]
    fn test_load_empty_config() {
        let config = match load_config_from_string("{}") {
            Ok(c) => c,
            Err(e) => panic!("should load empty config: {e}"),
        };
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.shutdown.timeout_secs, 10);
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "mode: ${POSITION_ENGINE_TEST_NONEXISTENT_VAR:-paper}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "mode: paper");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);

        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "access_token: ${POSITION_ENGINE_TEST_UNLIKELY_TO_EXIST}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "access_token: ");
    }

    #[test]
    fn test_live_mode_requires_token() {
        let yaml = r"
broker:
  mode: live
  upstox:
    access_token: ${POSITION_ENGINE_TEST_UNLIKELY_TO_EXIST}
";

        let result = load_config_from_string(yaml);
        let Err(err) = result else {
            panic!("expected error for missing access token");
        };
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
        assert!(err.to_string().contains("access_token"));
    }

    #[test]
    fn test_validation_zero_interval() {
        let yaml = r"
monitor:
  interval_secs: 0
";

        let result = load_config_from_string(yaml);
        let Err(err) = result else {
            panic!("expected error for zero interval");
        };
        assert!(err.to_string().contains("monitor.interval_secs"));
    }

    #[test]
    fn test_validation_bad_session_time() {
        let yaml = r#"
session:
  open: "9am"
"#;

        let result = load_config_from_string(yaml);
        let Err(err) = result else {
            panic!("expected error for bad session time");
        };
        assert!(err.to_string().contains("session.open"));
    }

    #[test]
    fn test_validation_inverted_session() {
        let yaml = r#"
session:
  open: "15:30"
  close: "09:15"
"#;

        let result = load_config_from_string(yaml);
        let Err(err) = result else {
            panic!("expected error for inverted session");
        };
        assert!(err.to_string().contains("before"));
    }

    #[test]
    fn test_validation_jitter_out_of_range() {
        let yaml = r"
broker:
  retry:
    jitter_factor: 1.5
";

        let result = load_config_from_string(yaml);
        let Err(err) = result else {
            panic!("expected error for jitter factor");
        };
        assert!(err.to_string().contains("jitter_factor"));
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
server:
  http_port: 9000
  bind_address: "127.0.0.1"

broker:
  mode: live
  call_timeout_ms: 5000
  upstox:
    access_token: "token-123"
    base_url: "https://api-sandbox.upstox.com"
    product: "D"
    tag: "engine"
  retry:
    max_retries: 5
    initial_backoff_ms: 100

orchestrator:
  fill_poll_interval_ms: 500
  fill_timeout_secs: 15

monitor:
  interval_secs: 5
  rearm_cancelled_orders: false

reconciliation:
  enabled: false
  grace_period_secs: 120

session:
  open: "09:15"
  close: "15:30"
  holidays: ["2026-01-26"]

instruments:
  map:
    RELIANCE: "NSE_EQ|INE002A01018"
  file: "instruments.json"

persistence:
  backend: memory

notifications:
  telegram:
    bot_token: "bot"
    chat_id: "42"

observability:
  logging:
    level: "debug"
  metrics:
    endpoint: "127.0.0.1:9100"
"#;

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load full config: {e}"),
        };

        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.broker.mode, BrokerMode::Live);
        assert_eq!(config.broker.call_timeout().as_millis(), 5000);

        let upstox = config.broker.upstox.to_adapter_config(config.broker.call_timeout());
        assert_eq!(upstox.base_url, "https://api-sandbox.upstox.com");
        assert_eq!(upstox.product, "D");
        assert_eq!(upstox.tag.as_deref(), Some("engine"));

        let policy = config.broker.retry.to_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_backoff.as_millis(), 100);

        assert_eq!(
            config.orchestrator.to_service_config().fill_timeout.as_secs(),
            15
        );
        assert!(!config.monitor.to_service_config().rearm_cancelled_orders);
        assert!(!config.reconciliation.enabled);
        assert_eq!(
            config.reconciliation.to_service_config().grace_period.as_secs(),
            120
        );
        assert_eq!(
            config.instruments.map.get("RELIANCE").map(String::as_str),
            Some("NSE_EQ|INE002A01018")
        );
        assert_eq!(config.persistence.backend, StoreBackend::Memory);
        assert!(config.notifications.telegram.to_adapter_config().is_some());
        assert_eq!(config.observability.logging.level, "debug");

        let calendar = match config.session.to_calendar() {
            Ok(c) => c,
            Err(e) => panic!("calendar should build: {e}"),
        };
        // Republic Day 2026 at 10:00 IST.
        let holiday = Utc.with_ymd_and_hms(2026, 1, 26, 4, 30, 0).unwrap();
        assert!(!calendar.is_session_open(holiday));
        assert_eq!(
            calendar.session_date(holiday),
            NaiveDate::from_ymd_opt(2026, 1, 26).unwrap()
        );
    }

    #[test]
    fn test_telegram_requires_token_and_chat() {
        let config = TelegramConfig {
            bot_token: "bot".to_string(),
            chat_id: String::new(),
            base_url: None,
        };
        assert!(config.to_adapter_config().is_none());
    }

    #[test]
    fn test_example_config_loads() {
        let yaml = include_str!("../../config.example.yaml");

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("example config should load: {e}"),
        };

        assert_eq!(config.instruments.map.len(), 3);
        assert_eq!(config.session.holidays.len(), 3);
        assert_eq!(config.shutdown.timeout().as_secs(), 10);
        assert!(config.session.to_calendar().is_ok());
    }
}
