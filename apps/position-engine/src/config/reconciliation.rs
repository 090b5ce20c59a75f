//! Reconciliation configuration for periodic broker state sync.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::services::ReconcilerConfig;

use super::default_true;

/// Reconciliation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// Enable periodic reconciliation.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Reconciliation interval in seconds.
    #[serde(default = "default_reconciliation_interval")]
    pub interval_secs: u64,
    /// Positions younger than this are not compared, in seconds.
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_reconciliation_interval(),
            grace_period_secs: default_grace_period(),
        }
    }
}

impl ReconciliationConfig {
    /// Convert to the service configuration.
    #[must_use]
    pub const fn to_service_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            interval: Duration::from_secs(self.interval_secs),
            grace_period: Duration::from_secs(self.grace_period_secs),
        }
    }
}

const fn default_reconciliation_interval() -> u64 {
    300
}

const fn default_grace_period() -> u64 {
    60
}
