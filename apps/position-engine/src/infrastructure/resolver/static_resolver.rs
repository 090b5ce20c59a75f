//! Static instrument map.
//!
//! Symbols resolve through a map built from configured entries and an
//! optional JSON file (`{"RELIANCE": "NSE_EQ|INE002A01018", ...}`). The file
//! is re-read on an interval; configured entries win over file entries. A
//! failed reload keeps the previous map.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::SymbolResolverPort;
use crate::domain::shared::{InstrumentKey, Symbol};

/// Instrument file errors.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// File could not be read.
    #[error("instrument file {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Cause.
        source: std::io::Error,
    },

    /// File is not a JSON object of strings.
    #[error("instrument file {path} is malformed: {source}")]
    Json {
        /// File path.
        path: String,
        /// Cause.
        source: serde_json::Error,
    },
}

/// Resolver over a periodically refreshed map.
#[derive(Debug)]
pub struct StaticSymbolResolver {
    configured: HashMap<Symbol, InstrumentKey>,
    file: Option<PathBuf>,
    map: RwLock<HashMap<Symbol, InstrumentKey>>,
}

impl StaticSymbolResolver {
    /// Create a resolver from configured entries and an optional file.
    ///
    /// The file is not read until [`refresh`](Self::refresh).
    #[must_use]
    pub fn new<I, K, V>(configured: I, file: Option<PathBuf>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let configured: HashMap<Symbol, InstrumentKey> = configured
            .into_iter()
            .map(|(symbol, key)| (Symbol::new(symbol), InstrumentKey::new(key)))
            .collect();
        Self {
            map: RwLock::new(configured.clone()),
            configured,
            file,
        }
    }

    /// Number of resolvable symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// Whether no symbol resolves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Rebuild the map from the file and configured entries.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed; the current map is
    /// kept.
    pub async fn refresh(&self) -> Result<usize, ResolverError> {
        let mut next = HashMap::new();

        if let Some(path) = &self.file {
            let display = path.display().to_string();
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ResolverError::Io {
                    path: display.clone(),
                    source,
                })?;
            let entries: HashMap<String, String> =
                serde_json::from_str(&text).map_err(|source| ResolverError::Json {
                    path: display,
                    source,
                })?;
            next.extend(
                entries
                    .into_iter()
                    .map(|(symbol, key)| (Symbol::new(symbol), InstrumentKey::new(key))),
            );
        }

        next.extend(
            self.configured
                .iter()
                .map(|(symbol, key)| (symbol.clone(), key.clone())),
        );

        let count = next.len();
        *self.map.write() = next;
        tracing::debug!(instruments = count, "Instrument map refreshed");
        Ok(count)
    }

    /// Reload on `interval` until `token` is cancelled.
    pub fn spawn_refresh(
        self: Arc<Self>,
        interval: Duration,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; startup already loaded.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.refresh().await {
                            tracing::warn!(error = %e, "Instrument map refresh failed, keeping previous map");
                        }
                    }
                }
            }
        })
    }
}

impl SymbolResolverPort for StaticSymbolResolver {
    fn resolve(&self, symbol: &Symbol) -> Option<InstrumentKey> {
        self.map.read().get(symbol).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn configured_entries_resolve_case_insensitively() {
        let resolver = StaticSymbolResolver::new([("reliance", "NSE_EQ|INE002A01018")], None);

        let key = resolver.resolve(&Symbol::new("RELIANCE")).unwrap();
        assert_eq!(key.as_str(), "NSE_EQ|INE002A01018");
        assert!(resolver.resolve(&Symbol::new("TCS")).is_none());
    }

    #[tokio::test]
    async fn refresh_merges_file_under_configured_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"SBIN": "NSE_EQ|INE062A01020", "RELIANCE": "NSE_EQ|OLD"}}"#
        )
        .unwrap();

        let resolver = StaticSymbolResolver::new(
            [("RELIANCE", "NSE_EQ|INE002A01018")],
            Some(file.path().to_path_buf()),
        );
        assert_eq!(resolver.refresh().await.unwrap(), 2);

        assert_eq!(
            resolver.resolve(&Symbol::new("SBIN")).unwrap().as_str(),
            "NSE_EQ|INE062A01020"
        );
        assert_eq!(
            resolver.resolve(&Symbol::new("RELIANCE")).unwrap().as_str(),
            "NSE_EQ|INE002A01018"
        );
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_map() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"SBIN": "NSE_EQ|INE062A01020"}}"#).unwrap();
        let resolver = StaticSymbolResolver::new(
            std::iter::empty::<(String, String)>(),
            Some(file.path().to_path_buf()),
        );
        resolver.refresh().await.unwrap();

        std::fs::write(file.path(), "not json").unwrap();
        assert!(matches!(
            resolver.refresh().await,
            Err(ResolverError::Json { .. })
        ));
        assert!(resolver.resolve(&Symbol::new("SBIN")).is_some());
    }
}
