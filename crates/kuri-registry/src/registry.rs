//! Dual-index user registry.

use crate::error::{RegistryError, RegistryResult};
use crate::record::UserRecord;
use crate::storage::Storage;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Both indices plus dirty tracking, always updated together.
#[derive(Debug, Default)]
struct Indices {
    /// Records by user id
    by_user: HashMap<String, UserRecord>,
    /// Token -> user id
    by_token: HashMap<String, String>,
    /// Bumped on every mutation
    revision: u64,
    /// Revision covered by the last successful flush
    persisted: u64,
}

impl Indices {
    fn insert(&mut self, record: UserRecord) {
        self.by_token
            .insert(record.token.clone(), record.user_id.clone());
        self.by_user.insert(record.user_id.clone(), record);
    }

    fn by_token(&self, token: &str) -> Option<&UserRecord> {
        self.by_token
            .get(token)
            .and_then(|user_id| self.by_user.get(user_id))
    }

    fn snapshot(&self) -> Vec<UserRecord> {
        let mut records: Vec<UserRecord> = self.by_user.values().cloned().collect();
        records.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        records
    }
}

/// Thread-safe registry of users, their tokens and delivery addresses.
///
/// Reads and writes of the two indices go through one `RwLock`. A second,
/// coarser mutex serializes the whole check-then-insert of [`Registry::register`]
/// so two callers can never both pass the duplicate checks. No I/O ever
/// happens while either lock is held.
#[derive(Debug, Default)]
pub struct Registry {
    indices: RwLock<Indices>,
    register_lock: Mutex<()>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a clean registry from a list of records.
    ///
    /// Fails with `CorruptData` on an invalid record or on any user id or
    /// token collision.
    pub fn from_records(records: Vec<UserRecord>) -> RegistryResult<Self> {
        let mut indices = Indices::default();

        for (i, record) in records.into_iter().enumerate() {
            record
                .validate()
                .map_err(|e| RegistryError::CorruptData(format!("record {}: {}", i, e)))?;
            if indices.by_user.contains_key(&record.user_id) {
                return Err(RegistryError::CorruptData(format!(
                    "record {}: duplicate user {}",
                    i, record.user_id
                )));
            }
            if indices.by_token.contains_key(&record.token) {
                return Err(RegistryError::CorruptData(format!(
                    "record {}: duplicate token",
                    i
                )));
            }
            indices.insert(record);
        }

        Ok(Self {
            indices: RwLock::new(indices),
            register_lock: Mutex::new(()),
        })
    }

    /// Load a registry from storage. An empty store yields an empty registry.
    pub async fn load_from(source: &dyn Storage) -> RegistryResult<Self> {
        match source.read().await? {
            Some(records) => {
                let registry = Self::from_records(records)?;
                info!("Loaded registry with {} records", registry.count());
                Ok(registry)
            }
            None => {
                info!("No stored registry, starting empty");
                Ok(Self::new())
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Indices> {
        self.indices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Indices> {
        self.indices.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check whether a user id and/or token is registered.
    ///
    /// With both selectors, true only if they belong to the same record.
    pub fn is_registered(
        &self,
        user_id: Option<&str>,
        token: Option<&str>,
    ) -> RegistryResult<bool> {
        let indices = self.read();
        match (user_id, token) {
            (Some(user_id), Some(token)) => Ok(indices
                .by_user
                .get(user_id)
                .is_some_and(|r| r.token == token)),
            (Some(user_id), None) => Ok(indices.by_user.contains_key(user_id)),
            (None, Some(token)) => Ok(indices.by_token.contains_key(token)),
            (None, None) => Err(RegistryError::InvalidArgument(
                "either user_id or token must be present",
            )),
        }
    }

    /// Register a new user. Returns a copy of the stored record.
    pub fn register(
        &self,
        user_id: &str,
        token: &str,
        delivery_address: &str,
    ) -> RegistryResult<UserRecord> {
        let record = UserRecord::new(user_id, token, delivery_address)?;

        let _guard = self
            .register_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.is_registered(Some(user_id), None)? {
            return Err(RegistryError::DuplicateUser(user_id.to_string()));
        }
        if self.is_registered(None, Some(token))? {
            return Err(RegistryError::DuplicateToken);
        }

        let mut indices = self.write();
        indices.insert(record.clone());
        indices.revision += 1;
        drop(indices);

        debug!(user_id = %user_id, "Registered user");
        Ok(record)
    }

    /// Look up a record by exactly one selector.
    pub fn resolve(
        &self,
        user_id: Option<&str>,
        token: Option<&str>,
    ) -> RegistryResult<Option<UserRecord>> {
        let indices = self.read();
        match (user_id, token) {
            (Some(user_id), None) => Ok(indices.by_user.get(user_id).cloned()),
            (None, Some(token)) => Ok(indices.by_token(token).cloned()),
            (None, None) => Err(RegistryError::InvalidArgument(
                "either user_id or token must be provided",
            )),
            (Some(_), Some(_)) => Err(RegistryError::InvalidArgument(
                "only one of user_id or token may be provided",
            )),
        }
    }

    /// Look up a record by user id.
    pub fn get_by_user(&self, user_id: &str) -> Option<UserRecord> {
        self.read().by_user.get(user_id).cloned()
    }

    /// Look up a record by token.
    pub fn get_by_token(&self, token: &str) -> Option<UserRecord> {
        self.read().by_token(token).cloned()
    }

    /// Point-in-time copy of every record, ordered by user id.
    pub fn list_all(&self) -> Vec<UserRecord> {
        self.read().snapshot()
    }

    /// Every token currently in use.
    pub fn tokens(&self) -> HashSet<String> {
        self.read().by_token.keys().cloned().collect()
    }

    /// Number of registered users.
    pub fn count(&self) -> usize {
        self.read().by_user.len()
    }

    /// Whether there are changes not yet covered by a successful flush.
    pub fn is_dirty(&self) -> bool {
        let indices = self.read();
        indices.revision != indices.persisted
    }

    /// Write a snapshot to `sink` and clear the dirty flag on success.
    ///
    /// The snapshot is taken under the read lock; the write itself runs
    /// unlocked. Registrations that land while the write is in flight keep
    /// the registry dirty. Returns the number of records written.
    pub async fn flush_to(&self, sink: &dyn Storage) -> RegistryResult<usize> {
        let (records, revision) = {
            let indices = self.read();
            (indices.snapshot(), indices.revision)
        };

        sink.write(&records).await?;

        let mut indices = self.write();
        indices.persisted = indices.persisted.max(revision);
        Ok(records.len())
    }
}
