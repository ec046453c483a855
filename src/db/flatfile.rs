//! Flat-file JSON array storage for the lead-capture and navigation
//! endpoints.
//!
//! Each named file under the data directory holds one JSON array and is
//! rewritten wholesale on every write (read, mutate in memory, write back).
//! Concurrent writers can lose updates; that is an accepted limitation of
//! this slice, kept behind this store type so call sites would survive a
//! swap to transactional storage unchanged.

use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlatFileError {
    #[error("flat file io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("flat file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct FlatFileStore {
    dir: PathBuf,
}

impl FlatFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at `DATA_DIR`, defaulting to `data/`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Read the array in `name`. A missing file reads as an empty array; a
    /// present but malformed file is an error.
    pub fn read_array(&self, name: &str) -> Result<Vec<Value>, FlatFileError> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn write_array(&self, name: &str, items: &[Value]) -> Result<(), FlatFileError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(items)?;
        fs::write(self.path(name), content)?;
        Ok(())
    }

    /// Whole-file read-modify-write append.
    pub fn append(&self, name: &str, item: Value) -> Result<(), FlatFileError> {
        let mut items = self.read_array(name)?;
        items.push(item);
        self.write_array(name, &items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_file_reads_as_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlatFileStore::new(dir.path());
        assert!(store.read_array("leads.json").unwrap().is_empty());
    }

    #[test]
    fn test_append_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FlatFileStore::new(dir.path());

        store
            .append("leads.json", json!({"name": "A", "email": "a@x.com"}))
            .unwrap();
        store
            .append("leads.json", json!({"name": "B", "email": "b@x.com"}))
            .unwrap();

        let items = store.read_array("leads.json").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "A");
        assert_eq!(items[1]["email"], "b@x.com");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("navigation.json"), "{ not json").unwrap();
        let store = FlatFileStore::new(dir.path());
        assert!(store.read_array("navigation.json").is_err());
    }

    #[test]
    fn test_write_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data");
        let store = FlatFileStore::new(&nested);
        store.write_array("navigation.json", &[json!({"label": "Home"})]).unwrap();
        assert!(nested.join("navigation.json").exists());
    }
}
