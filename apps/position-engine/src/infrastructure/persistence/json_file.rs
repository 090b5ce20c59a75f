//! File-backed position store.
//!
//! One JSON document per symbol under a directory. Saves write a temporary
//! file, sync it, then rename it over the target and sync the directory, so a
//! crash leaves either the old or the new document.
//!
//! File names keep `[A-Za-z0-9_&-]` and percent-encode every other byte, so
//! distinct symbols never share a file.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{PositionStorePort, StoreError};
use crate::domain::position_lifecycle::Position;
use crate::domain::shared::Symbol;

const EXTENSION: &str = "json";

/// Directory of per-symbol JSON documents.
#[derive(Debug, Clone)]
pub struct JsonFilePositionStore {
    dir: PathBuf,
}

impl JsonFilePositionStore {
    /// Open a store rooted at `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, symbol: &Symbol) -> PathBuf {
        let mut name = String::with_capacity(symbol.as_str().len());
        for byte in symbol.as_str().bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'&') {
                name.push(char::from(byte));
            } else {
                let _ = write!(name, "%{byte:02X}");
            }
        }
        self.dir.join(format!("{name}.{EXTENSION}"))
    }

    #[cfg(unix)]
    async fn sync_dir(&self) -> Result<(), StoreError> {
        tokio::fs::File::open(&self.dir).await?.sync_all().await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn sync_dir(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Move a document written under an older file name to its current one.
    async fn migrate(&self, from: &Path, position: &Position) -> Result<(), StoreError> {
        self.save(position).await?;
        tokio::fs::remove_file(from).await?;
        self.sync_dir().await?;
        tracing::info!(symbol = %position.symbol, from = %from.display(), "Position file renamed");
        Ok(())
    }
}

#[async_trait]
impl PositionStorePort for JsonFilePositionStore {
    async fn load(&self) -> Result<Vec<Position>, StoreError> {
        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                paths.push(path);
            }
        }

        let mut positions = Vec::new();
        for path in paths {
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Position>(&bytes) {
                Ok(position) => {
                    if path != self.path_for(&position.symbol)
                        && let Err(e) = self.migrate(&path, &position).await
                    {
                        tracing::warn!(path = %path.display(), error = %e, "Could not rename position file");
                    }
                    positions.push(position);
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Skipping unreadable position file");
                }
            }
        }

        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }

    async fn save(&self, position: &Position) -> Result<(), StoreError> {
        let target = self.path_for(&position.symbol);
        let tmp = target.with_extension(format!("{EXTENSION}.tmp"));
        let bytes = serde_json::to_vec_pretty(position)?;

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &target).await?;
        self.sync_dir().await?;
        tracing::debug!(symbol = %position.symbol, path = %target.display(), "Position saved");
        Ok(())
    }

    async fn delete(&self, symbol: &Symbol) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(symbol)).await {
            Ok(()) => self.sync_dir().await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
