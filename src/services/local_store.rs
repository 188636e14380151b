// DevPulse page-scoped local storage
// String key/value pairs that survive a reload. The in-memory store backs
// tests and embedders; the file store keeps the map as a JSON object on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::errors::StoreError;

/// Trait defining page-scoped key/value storage.
pub trait LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Volatile store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store persisted as a JSON object, written through on every change.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`.
    ///
    /// A missing file is an empty store. A malformed file is a serialization error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| StoreError::Io(format!("Failed to read store file: {}", e)))?;
            serde_json::from_str(&content).map_err(|e| {
                StoreError::Serialization(format!("Failed to parse store file: {}", e))
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!("Failed to create store directory: {}", e))
            })?;
        }
        let json = serde_json::to_string_pretty(&self.values).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize store: {}", e))
        })?;
        fs::write(&self.path, json)
            .map_err(|e| StoreError::Io(format!("Failed to write store file: {}", e)))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}
