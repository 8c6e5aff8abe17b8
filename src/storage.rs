pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use tracing::{debug, error, warn};

use crate::{error::Result, utils::local_now};

/// Key-value persistence adapter. Every state holder reads and writes
/// through this, never through a backend directly.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Envelope written under each key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<T> {
    pub revision: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
    pub data: T,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored<T> {
    Snapshot(Snapshot<T>),
    // written without an envelope by older clients
    Bare(T),
}

/// In-memory authoritative copy of one stored value.
///
/// Saves rewrite the whole snapshot. The revision only moves forward, so a
/// refresh never adopts an older snapshot than the one held locally.
#[derive(Debug, Clone)]
pub struct Persisted<T> {
    key: String,
    revision: u64,
    data: T,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Load the value under `key`, falling back to `T::default()` when the
    /// key is missing, unreadable or corrupt.
    pub fn load(storage: &dyn Storage, key: impl Into<String>) -> Self {
        let key = key.into();
        let (revision, data) = read_snapshot(storage, &key).unwrap_or_default();
        Self {
            key,
            revision,
            data,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self) -> &T {
        &self.data
    }

    /// Mutate the local copy and write it back.
    pub fn update<R>(&mut self, storage: &dyn Storage, f: impl FnOnce(&mut T) -> R) -> R {
        let r = f(&mut self.data);
        self.save(storage);
        r
    }

    /// Write the full local copy. Failures are logged and the session keeps
    /// running on the in-memory copy.
    pub fn save(&mut self, storage: &dyn Storage) {
        let stored = read_snapshot_revision(storage, &self.key);
        let revision = self.revision.max(stored) + 1;
        let snapshot = Snapshot {
            revision,
            saved_at: local_now(),
            data: &self.data,
        };
        let value = match serde_json::to_string(&snapshot) {
            Ok(value) => value,
            Err(e) => {
                error!("serialize {} failed: {}", self.key, e);
                return;
            }
        };
        match storage.set(&self.key, &value) {
            Ok(()) => {
                debug!("saved {} at revision {}", self.key, revision);
                self.revision = revision;
            }
            Err(e) => error!("persist {} failed, keeping in-memory state: {}", self.key, e),
        }
    }

    /// Adopt the stored value if it is strictly newer than the local copy.
    /// Returns whether anything changed.
    pub fn refresh(&mut self, storage: &dyn Storage) -> bool {
        match read_snapshot(storage, &self.key) {
            Some((revision, data)) if revision > self.revision => {
                debug!(
                    "refresh {} from revision {} to {}",
                    self.key, self.revision, revision
                );
                self.revision = revision;
                self.data = data;
                true
            }
            _ => false,
        }
    }
}

fn read_snapshot<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<(u64, T)> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            error!("read {} failed, using default state: {}", key, e);
            return None;
        }
    };
    match serde_json::from_str::<Stored<T>>(&raw) {
        Ok(Stored::Snapshot(snapshot)) => Some((snapshot.revision, snapshot.data)),
        Ok(Stored::Bare(data)) => Some((0, data)),
        Err(e) => {
            warn!("corrupt value under {}, using default state: {}", key, e);
            None
        }
    }
}

fn read_snapshot_revision(storage: &dyn Storage, key: &str) -> u64 {
    #[derive(Deserialize)]
    struct Revision {
        revision: u64,
    }
    storage
        .get(key)
        .ok()
        .flatten()
        .and_then(|raw| serde_json::from_str::<Revision>(&raw).ok())
        .map_or(0, |r| r.revision)
}
