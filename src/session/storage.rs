//! Persisted client state: a flat string key/value map.
//!
//! The file store keeps everything in one JSON object and rewrites it on
//! every change. Missing or empty files read as an empty map; a corrupt
//! file fails reads but is replaced by the next write.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Key/value storage for session data
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// JSON file on disk
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {:?}", self.path))?;
        Ok(Some(content).filter(|c| !c.trim().is_empty()))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match self.read_raw()? {
            Some(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse state file: {:?}", self.path)),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Current values for a write, and whether the file has to be rewritten.
    /// An unparseable file is discarded so the write replaces it.
    fn read_for_update(&self) -> Result<(BTreeMap<String, String>, bool)> {
        let Some(content) = self.read_raw()? else {
            return Ok((BTreeMap::new(), false));
        };
        match serde_json::from_str(&content) {
            Ok(values) => Ok((values, false)),
            Err(e) => {
                warn!("Discarding unreadable state file {:?}: {}", self.path, e);
                Ok((BTreeMap::new(), true))
            }
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create state directory: {:?}", parent)
                })?;
            }
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write state file: {:?}", self.path))
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let (mut values, _) = self.read_for_update()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let (mut values, discarded) = self.read_for_update()?;
        if values.remove(key).is_some() || discarded {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

/// In-memory store, used in tests and when no state file is wanted
#[derive(Default)]
pub struct MemoryStateStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("state store lock poisoned"))
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("session.json"));
        assert_eq!(store.get("fuelpoa_jwt").unwrap(), None);
        // removing from a missing file is a no-op
        store.remove("fuelpoa_jwt").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = FileStateStore::new(&path);

        store.set("fuelpoa_jwt", "token-1").unwrap();
        store.set("other", "value").unwrap();
        assert!(path.exists());
        assert_eq!(store.get("fuelpoa_jwt").unwrap().as_deref(), Some("token-1"));

        // a second handle sees the same data
        let reopened = FileStateStore::new(&path);
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("value"));

        store.remove("fuelpoa_jwt").unwrap();
        assert_eq!(store.get("fuelpoa_jwt").unwrap(), None);
        assert_eq!(store.get("other").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStateStore::new(&path);
        assert!(store.get("fuelpoa_jwt").is_err());
    }

    #[test]
    fn test_file_store_writes_replace_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{truncated").unwrap();

        let store = FileStateStore::new(&path);
        store.remove("fuelpoa_jwt").unwrap();
        assert_eq!(store.get("fuelpoa_jwt").unwrap(), None);

        std::fs::write(&path, "{truncated").unwrap();
        store.set("fuelpoa_jwt", "fresh").unwrap();
        assert_eq!(store.get("fuelpoa_jwt").unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStateStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
