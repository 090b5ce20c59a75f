//! Position store configuration.

use serde::{Deserialize, Serialize};

/// Where positions are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file per symbol.
    #[default]
    File,
    /// Process memory only.
    Memory,
}

/// Position store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// `file` or `memory`.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Directory for the file backend.
    #[serde(default = "default_positions_dir")]
    pub dir: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            dir: default_positions_dir(),
        }
    }
}

fn default_positions_dir() -> String {
    "./data/positions".to_string()
}
