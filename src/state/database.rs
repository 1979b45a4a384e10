//! JSON-based metadata store for recordings
//!
//! Stores one entry per recording file in `<data-dir>/records.json`, keyed by
//! the file's absolute path:
//!
//! ```json
//! { "/home/me/.local/share/murmur/records/1700000000000":
//!     { "name": "1700000000000", "duration": 4200, "dateTimeMillis": 1700000000000 } }
//! ```

use crate::error::{AppError, AppResult};
use crate::models::RecordMetadata;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Durable key-value mirror of recording metadata
pub trait MetadataStore {
    fn put(&mut self, key: &str, metadata: &RecordMetadata) -> AppResult<()>;

    /// Look up an entry; a present but unparseable entry is `MetadataCorrupt`
    fn get(&self, key: &str) -> AppResult<Option<RecordMetadata>>;

    /// Remove an entry; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> AppResult<()>;

    fn keys(&self) -> Vec<String>;
}

/// Metadata store backed by a single JSON object file
pub struct JsonMetadataStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl JsonMetadataStore {
    /// Open the store, treating a missing file as empty
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Map::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    /// Write all entries, replacing the previous file atomically
    fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl MetadataStore for JsonMetadataStore {
    fn put(&mut self, key: &str, metadata: &RecordMetadata) -> AppResult<()> {
        let previous = self
            .entries
            .insert(key.to_string(), serde_json::to_value(metadata)?);
        if let Err(e) = self.save() {
            match previous {
                Some(value) => self.entries.insert(key.to_string(), value),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, key: &str) -> AppResult<Option<RecordMetadata>> {
        let Some(value) = self.entries.get(key) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| AppError::MetadataCorrupt {
                key: key.to_string(),
                source,
            })
    }

    fn remove(&mut self, key: &str) -> AppResult<()> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.save() {
            self.entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn metadata(name: &str, duration_millis: u64) -> RecordMetadata {
        RecordMetadata {
            name: name.to_string(),
            duration_millis,
            date_time_millis: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonMetadataStore::open(dir.path().join("records.json")).unwrap();
        assert!(store.keys().is_empty());
        assert!(store.get("/nowhere").unwrap().is_none());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.json");

        let mut store = JsonMetadataStore::open(&path).unwrap();
        store.put("/r/1", &metadata("first", 1000)).unwrap();
        store.put("/r/2", &metadata("second", 2000)).unwrap();
        store.remove("/r/1").unwrap();

        let store = JsonMetadataStore::open(&path).unwrap();
        assert_eq!(store.keys(), vec!["/r/2".to_string()]);
        assert_eq!(store.get("/r/2").unwrap(), Some(metadata("second", 2000)));
        assert!(store.get("/r/1").unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let dir = tempdir().unwrap();
        let mut store = JsonMetadataStore::open(dir.path().join("records.json")).unwrap();
        store.put("/r/1", &metadata("old", 1)).unwrap();
        store.put("/r/1", &metadata("new", 2)).unwrap();
        assert_eq!(store.get("/r/1").unwrap(), Some(metadata("new", 2)));
        assert_eq!(store.keys().len(), 1);
    }

    #[test]
    fn test_corrupt_entry_is_reported_per_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(
            &path,
            r#"{ "/r/bad": { "name": 3 },
                 "/r/good": { "name": "ok", "duration": 5, "dateTimeMillis": 7 } }"#,
        )
        .unwrap();

        let store = JsonMetadataStore::open(&path).unwrap();
        assert!(matches!(
            store.get("/r/bad"),
            Err(AppError::MetadataCorrupt { ref key, .. }) if key == "/r/bad"
        ));
        assert_eq!(store.get("/r/good").unwrap().map(|m| m.duration_millis), Some(5));
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            JsonMetadataStore::open(&path),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn test_failed_save_keeps_previous_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.json");
        let mut store = JsonMetadataStore::open(&path).unwrap();
        store.put("/r/1", &metadata("first", 1000)).unwrap();
        fs::create_dir(dir.path().join("records.json.tmp")).unwrap();

        assert!(store.put("/r/2", &metadata("second", 2000)).is_err());
        assert!(store.put("/r/1", &metadata("changed", 1)).is_err());
        assert!(store.remove("/r/1").is_err());
        assert_eq!(store.keys(), vec!["/r/1".to_string()]);
        assert_eq!(store.get("/r/1").unwrap(), Some(metadata("first", 1000)));
        assert!(store.get("/r/2").unwrap().is_none());

        fs::remove_dir(dir.path().join("records.json.tmp")).unwrap();
        store.put("/r/3", &metadata("third", 3)).unwrap();
        let reopened = JsonMetadataStore::open(&path).unwrap();
        let mut keys = reopened.keys();
        keys.sort();
        assert_eq!(keys, vec!["/r/1".to_string(), "/r/3".to_string()]);
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.json");
        let mut store = JsonMetadataStore::open(&path).unwrap();
        store.remove("/r/none").unwrap();
        assert!(!path.exists());
    }
}
