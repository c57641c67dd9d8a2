// Key-value storage for serialized projects

use crate::project::{ProjectError, ProjectResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Opaque string store keyed by name
pub trait ProjectStorage {
    fn get(&self, key: &str) -> ProjectResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> ProjectResult<()>;
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> ProjectResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ProjectError::Storage(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl ProjectStorage for FileStorage {
    fn get(&self, key: &str) -> ProjectResult<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> ProjectResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        // Write-then-rename: readers never see a partial file
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory storage; counts writes
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut storage = Self::default();
        storage.entries.insert(key.to_string(), value.to_string());
        storage
    }

    /// Number of `set` calls so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ProjectStorage for MemoryStorage {
    fn get(&self, key: &str) -> ProjectResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> ProjectResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("projects"));

        assert_eq!(storage.get("sinesth-project").unwrap(), None);

        storage.set("sinesth-project", "{\"a\":1}").unwrap();
        assert_eq!(
            storage.get("sinesth-project").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(dir.path().join("projects/sinesth-project.json").exists());
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path());

        assert!(matches!(
            storage.set("../escape", "x"),
            Err(ProjectError::Storage(_))
        ));
        assert!(storage.get("").is_err());
    }

    #[test]
    fn test_memory_storage_counts_writes() {
        let mut storage = MemoryStorage::new();
        storage.set("k", "1").unwrap();
        storage.set("k", "2").unwrap();

        assert_eq!(storage.get("k").unwrap().as_deref(), Some("2"));
        assert_eq!(storage.writes(), 2);
    }
}
