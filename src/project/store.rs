// Key-value storage backends for the persisted document

use crate::project::ProjectError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Minimal string key-value store, the shape of a browser's local storage
pub trait KeyValueStore {
    /// Returns `Ok(None)` when the key has never been written
    fn get(&self, key: &str) -> Result<Option<String>, ProjectError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), ProjectError>;

    fn remove(&mut self, key: &str) -> Result<(), ProjectError>;
}

/// Stores each key as `<key>.json` inside one directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ProjectError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(ProjectError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProjectError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            ProjectError::FileSystemError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ProjectError> {
        let path = self.path_for(key)?;

        std::fs::create_dir_all(&self.root).map_err(|e| {
            ProjectError::FileSystemError(format!("Failed to create storage directory: {}", e))
        })?;

        // Write to a sibling file first so a crash never leaves a truncated record
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, value).map_err(|e| {
            ProjectError::FileSystemError(format!("Failed to write {}: {}", temp_path.display(), e))
        })?;
        std::fs::rename(&temp_path, &path)?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ProjectError> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// In-memory store, used by tests and by sessions that opt out of persistence
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProjectError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ProjectError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ProjectError> {
        self.entries.remove(key);
        Ok(())
    }
}
