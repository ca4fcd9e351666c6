use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::codec;

/// StorageError
///
/// Faults a storage backend can report. These never leave the `SecureStore`:
/// it logs them and degrades to `None` / no-op.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {used} of {limit} bytes")]
    QuotaExceeded { used: usize, limit: usize },
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// 1. StorageBackend Contract
/// StorageBackend
///
/// Abstract contract for a flat string key/value namespace, modelled on the
/// browser's `localStorage`/`sessionStorage`. Implementations are swapped
/// between the file-backed store (persistent across restarts) and the
/// in-memory store (session-scoped data and tests) without touching callers.
///
/// Reads are synchronous; each backend serializes access internally.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    /// Wipes the entire namespace.
    fn clear(&self) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// StorageState
///
/// The concrete type used to share a backend across the application.
pub type StorageState = Arc<dyn StorageBackend>;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
}

// 2. In-Memory Implementation
/// MemoryStorage
///
/// Process-local backend. Used for session-scoped storage and in tests.
/// Optionally enforces a byte quota (keys + values), and can be put into a
/// failing mode that rejects every operation to simulate disabled storage.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::default()
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Unavailable(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        Ok(())
    }
}

fn usage(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        let mut entries = lock(&self.entries)?;

        if let Some(limit) = self.quota {
            let current = entries.get(key).map_or(0, |old| key.len() + old.len());
            let used = usage(&entries) - current + key.len() + value.len();
            if used > limit {
                return Err(StorageError::QuotaExceeded { used, limit });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.check()?;
        lock(&self.entries)?.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check()?;
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }
}

// 3. File-Backed Implementation
/// FileStorage
///
/// Persistent backend: the whole namespace is a JSON object on disk.
/// Every mutation rewrites the file through a temporary sibling and a rename,
/// so a crash mid-write leaves either the old or the new map, never a torn one.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// open
    ///
    /// Loads the namespace from `path`, starting empty if the file does not exist.
    /// A file that exists but is not a JSON string map is reported as an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Applies `mutate` to a copy of the map and only commits it in memory
    /// once the copy is on disk.
    fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = lock(&self.entries)?;
        let mut next = entries.clone();
        mutate(&mut next);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.update(|entries| entries.clear())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(lock(&self.entries)?.keys().cloned().collect())
    }
}

// 4. The Secure Store Facade
/// SecureStore
///
/// Obfuscating façade over a `StorageBackend`. Values are passed through
/// `codec::encode` on the way in and `codec::decode` on the way out, so legacy
/// plaintext entries stay readable.
///
/// No operation ever fails from the caller's point of view: backend faults are
/// logged at `warn` and turned into `None` (reads) or a no-op (writes).
#[derive(Clone)]
pub struct SecureStore {
    backend: StorageState,
    namespace: &'static str,
}

impl SecureStore {
    /// `namespace` only labels log lines (e.g. "persistent", "session").
    pub fn new(backend: StorageState, namespace: &'static str) -> Self {
        Self { backend, namespace }
    }

    pub fn set_item(&self, key: &str, value: &str) {
        if let Err(e) = self.backend.set(key, &codec::encode(value)) {
            tracing::warn!(store = self.namespace, key, error = %e, "failed to write storage item");
        }
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.try_get_item(key).ok().flatten()
    }

    /// try_get_item
    ///
    /// Like `get_item`, but reports whether the backend faulted so the session
    /// can treat an unreadable record as corrupted. The fault is still logged.
    pub fn try_get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get(key).map(|stored| stored.map(|s| codec::decode(&s))).map_err(|e| {
            tracing::warn!(store = self.namespace, key, error = %e, "failed to read storage item");
            e
        })
    }

    pub fn remove_item(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            tracing::warn!(store = self.namespace, key, error = %e, "failed to remove storage item");
        }
    }

    /// clear
    ///
    /// Removes EVERY key in the backend namespace, not only the session keys.
    pub fn clear(&self) {
        if let Err(e) = self.backend.clear() {
            tracing::warn!(store = self.namespace, error = %e, "failed to clear storage");
        }
    }

    /// Keys currently present, or an empty list if the backend cannot answer.
    pub fn keys(&self) -> Vec<String> {
        self.backend.keys().unwrap_or_else(|e| {
            tracing::warn!(store = self.namespace, error = %e, "failed to list storage keys");
            Vec::new()
        })
    }

    /// write_all
    ///
    /// Transactional multi-key write: every pair is written, then every pair is
    /// read back and compared. If any write or verification fails, all keys of
    /// the batch are removed so no partial record is left behind.
    ///
    /// Returns whether the whole batch is now persisted.
    pub fn write_all(&self, items: &[(&str, String)]) -> bool {
        let mut failed = None;

        for (key, value) in items {
            if let Err(e) = self.backend.set(key, &codec::encode(value)) {
                failed = Some(format!("write of '{key}' failed: {e}"));
                break;
            }
        }

        if failed.is_none() {
            failed = items.iter().find_map(|(key, value)| {
                match self.backend.get(key) {
                    Ok(Some(stored)) if codec::decode(&stored) == *value => None,
                    Ok(_) => Some(format!("verification of '{key}' failed")),
                    Err(e) => Some(format!("verification of '{key}' failed: {e}")),
                }
            });
        }

        match failed {
            None => true,
            Some(reason) => {
                tracing::warn!(store = self.namespace, %reason, "rolling back partial write");
                for (key, _) in items {
                    self.remove_item(key);
                }
                false
            }
        }
    }
}
