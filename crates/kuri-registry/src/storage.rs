//! Durable storage backends for registry snapshots.

use crate::error::{RegistryError, RegistryResult};
use crate::record::UserRecord;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Sink and source for full registry snapshots.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the stored snapshot. `None` means nothing has been stored yet.
    async fn read(&self) -> RegistryResult<Option<Vec<UserRecord>>>;

    /// Replace the stored snapshot with `records`.
    async fn write(&self, records: &[UserRecord]) -> RegistryResult<()>;
}

/// JSON file store.
///
/// File format: a JSON array of `{user_id, token, delivery_address}` objects.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Storage for JsonFileStore {
    async fn read(&self) -> RegistryResult<Option<Vec<UserRecord>>> {
        if !fs::try_exists(&self.path).await? {
            info!("Registry file not found at {:?}", self.path);
            return Ok(None);
        }

        let data = fs::read(&self.path).await?;
        let records: Vec<UserRecord> = serde_json::from_slice(&data).map_err(|e| {
            RegistryError::CorruptData(format!("{}: {}", self.path.display(), e))
        })?;

        debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(Some(records))
    }

    async fn write(&self, records: &[UserRecord]) -> RegistryResult<()> {
        let data = serde_json::to_vec_pretty(records)
            .map_err(|e| RegistryError::Io(std::io::Error::other(e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file + rename
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(
            "Wrote registry ({} records, {} bytes) to {:?}",
            records.len(),
            data.len(),
            self.path
        );
        Ok(())
    }
}

/// In-memory store. Keeps the last written snapshot; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<Vec<UserRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last written snapshot.
    pub async fn snapshot(&self) -> Option<Vec<UserRecord>> {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn read(&self) -> RegistryResult<Option<Vec<UserRecord>>> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn write(&self, records: &[UserRecord]) -> RegistryResult<()> {
        *self.snapshot.write().await = Some(records.to_vec());
        debug!("Memory store: kept {} records", records.len());
        Ok(())
    }
}

/// Storage backend selected at startup.
pub enum Store {
    /// JSON file on disk
    Json(JsonFileStore),
    /// In-memory only (no persistence)
    Memory(MemoryStore),
}

impl Store {
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Store::Json(JsonFileStore::new(path))
    }

    pub fn memory() -> Self {
        Store::Memory(MemoryStore::new())
    }
}

#[async_trait]
impl Storage for Store {
    async fn read(&self) -> RegistryResult<Option<Vec<UserRecord>>> {
        match self {
            Store::Json(s) => s.read().await,
            Store::Memory(s) => s.read().await,
        }
    }

    async fn write(&self, records: &[UserRecord]) -> RegistryResult<()> {
        match self {
            Store::Json(s) => s.write(records).await,
            Store::Memory(s) => s.write(records).await,
        }
    }
}
