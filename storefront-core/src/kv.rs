//! Local key-value storage for client-side settings and preferences.
//!
//! Values are JSON. [`FileKv`] keeps every key in a single JSON object file:
//! ```text
//! <DATA_DIR>/
//!   local_storage.json
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// File name used by [`FileKv`] inside its data directory.
pub const FILE_NAME: &str = "local_storage.json";

/// Errors that can occur while reading or writing local storage.
#[derive(Error, Debug)]
pub enum KvError {
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in local storage: {0}")]
    Json(#[from] serde_json::Error),
}

/// Get/set/remove by string key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, KvError>;

    fn set(&self, key: &str, value: Value) -> Result<(), KvError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), KvError>;

    fn contains(&self, key: &str) -> Result<bool, KvError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Reads and decodes a value.
pub fn get_as<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, KvError> {
    match kv.get(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encodes and stores a value.
pub fn set_as<T: Serialize + ?Sized>(
    kv: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), KvError> {
    kv.set(key, serde_json::to_value(value)?)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store. Values are kept as serialized strings, as a browser would.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw string, which need not be valid JSON.
    pub fn set_raw(&self, key: &str, raw: impl Into<String>) {
        lock(&self.entries).insert(key.to_string(), raw.into());
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.entries).keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<Value>, KvError> {
        match lock(&self.entries).get(key) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), KvError> {
        let raw = serde_json::to_string(&value)?;
        lock(&self.entries).insert(key.to_string(), raw);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// File-backed store persisting all keys to one JSON object.
#[derive(Debug)]
pub struct FileKv {
    data_dir: PathBuf,
    // Serializes read-modify-write cycles within the process
    guard: Mutex<()>,
}

impl FileKv {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            guard: Mutex::new(()),
        }
    }

    /// Returns the full path of the storage file.
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(FILE_NAME)
    }

    fn load(&self) -> Result<Map<String, Value>, KvError> {
        let path = self.path();
        match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Map::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Map::new()),
            Err(source) => Err(KvError::Io { path, source }),
        }
    }

    fn save(&self, entries: &Map<String, Value>) -> Result<(), KvError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| KvError::Io {
            path: self.data_dir.clone(),
            source,
        })?;

        let path = self.path();
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&path, contents).map_err(|source| KvError::Io { path, source })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<Value>, KvError> {
        let _guard = lock(&self.guard);
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), KvError> {
        let _guard = lock(&self.guard);
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), KvError> {
        let _guard = lock(&self.guard);
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}
