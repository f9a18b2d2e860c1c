//! # store::kv
//!
//! The key → blob persistence abstraction every store sits on.
//!
//! * [`FileStore`]: one file per key under a data directory.
//! * [`MemoryStore`]: process-local map; the fallback when the data directory
//!   is unusable, and the backend every unit test runs against.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::store::StoreError;

/// Synchronous key-value blob storage.
///
/// Calls are whole: a `set` either replaces the blob or fails, so a reader
/// never observes a half-written value.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Read and decode a JSON blob; `Ok(None)` when the key was never written.
pub fn load_json<T: DeserializeOwned>(
    backend: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match backend.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { key: key.to_string(), source }),
        None => Ok(None),
    }
}

/// Encode and write a JSON blob.
pub fn save_json<T: Serialize + ?Sized>(
    backend: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)
        .map_err(|source| StoreError::Corrupt { key: key.to_string(), source })?;
    backend.set(key, &raw)
}

// ─── FileStore ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { key: key.to_string(), source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // Write-then-rename keeps the previous blob intact if the write dies midway.
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.tmp"));
        let io_err = |source: std::io::Error| StoreError::Io { key: key.to_string(), source };

        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &target).map_err(io_err)?;

        debug!(key, bytes = value.len(), "Blob persisted");
        Ok(())
    }
}

// ─── MemoryStore ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs:  Mutex<HashMap<String, String>>,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        blobs.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
