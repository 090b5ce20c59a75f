//! Orchestrator and background task configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::services::{FillMonitorConfig, OrchestratorConfig as ServiceConfig};

use super::default_true;

/// Entry fill verification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Interval between entry status polls in milliseconds.
    #[serde(default = "default_fill_poll_interval_ms")]
    pub fill_poll_interval_ms: u64,
    /// How long to wait for an entry fill, in seconds.
    #[serde(default = "default_fill_timeout_secs")]
    pub fill_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fill_poll_interval_ms: default_fill_poll_interval_ms(),
            fill_timeout_secs: default_fill_timeout_secs(),
        }
    }
}

impl OrchestratorConfig {
    /// Convert to the service configuration.
    #[must_use]
    pub const fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            fill_poll_interval: Duration::from_millis(self.fill_poll_interval_ms),
            fill_timeout: Duration::from_secs(self.fill_timeout_secs),
        }
    }
}

/// Fill monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Run the fill monitor.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Scan interval in seconds.
    #[serde(default = "default_monitor_interval_secs")]
    pub interval_secs: u64,
    /// Recreate exits the broker reports cancelled or rejected.
    #[serde(default = "default_true")]
    pub rearm_cancelled_orders: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_monitor_interval_secs(),
            rearm_cancelled_orders: true,
        }
    }
}

impl MonitorConfig {
    /// Convert to the service configuration.
    #[must_use]
    pub const fn to_service_config(&self) -> FillMonitorConfig {
        FillMonitorConfig {
            interval: Duration::from_secs(self.interval_secs),
            rearm_cancelled_orders: self.rearm_cancelled_orders,
        }
    }
}

/// Shutdown settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Upper bound on the cancel sweep, in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ShutdownConfig {
    /// Sweep timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

const fn default_fill_poll_interval_ms() -> u64 {
    1_000
}

const fn default_fill_timeout_secs() -> u64 {
    30
}

const fn default_monitor_interval_secs() -> u64 {
    10
}

const fn default_shutdown_timeout_secs() -> u64 {
    10
}
