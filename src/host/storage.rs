// Durable key/value storage
// `FileStorage` keeps every key in one JSON object on disk

use super::Storage;
use crate::error::{HostError, MetronomeError};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "mymusic-metronome";
const STORAGE_FILE: &str = "storage.json";

/// Per-user directory holding storage and settings
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

/// In-memory store; nothing survives the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HostError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON-file store, rewritten on every `set`
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`
    /// A corrupt file is logged and treated as empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MetronomeError> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(values) => values,
                Err(e) => {
                    log::warn!("Ignoring malformed storage file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    /// Open the store in the per-user config directory
    pub fn open_default() -> Result<Self, MetronomeError> {
        let dir = app_config_dir().ok_or_else(|| {
            MetronomeError::Storage(HostError::Unsupported("per-user config directory"))
        })?;
        Self::open(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), MetronomeError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HostError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
            .map_err(|e| HostError::Failed(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("metronomeTheme"), None);
        storage.set("metronomeTheme", "light").unwrap();
        assert_eq!(storage.get("metronomeTheme").as_deref(), Some("light"));
    }

    #[test]
    fn test_file_storage_persists_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.set("metronomePresets", "[60,120]").unwrap();
        storage.set("metronomeTheme", "dark").unwrap();

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("metronomePresets").as_deref(), Some("[60,120]"));
        assert_eq!(reopened.get("metronomeTheme").as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_storage_ignores_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("metronomeTheme"), None);
    }
}
