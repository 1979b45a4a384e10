use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted fields of a recording, keyed in the metadata store by file path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub name: String,
    #[serde(rename = "duration")]
    pub duration_millis: u64,
    pub date_time_millis: i64,
}

/// One captured audio clip
///
/// Passed by value between the list and the player; the file path is the
/// identity and never changes once the recording exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub file_path: PathBuf,
    pub name: String,
    pub duration_millis: u64,
    pub created_at_millis: i64,
}

impl Recording {
    /// A recording in progress, named after its file
    pub fn new(file_path: PathBuf, created_at_millis: i64) -> Self {
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| created_at_millis.to_string());
        Self {
            file_path,
            name,
            duration_millis: 0,
            created_at_millis,
        }
    }

    pub fn from_metadata(file_path: PathBuf, metadata: RecordMetadata) -> Self {
        Self {
            file_path,
            name: metadata.name,
            duration_millis: metadata.duration_millis,
            created_at_millis: metadata.date_time_millis,
        }
    }

    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            name: self.name.clone(),
            duration_millis: self.duration_millis,
            date_time_millis: self.created_at_millis,
        }
    }

    /// Metadata store key for this recording
    pub fn key(&self) -> String {
        path_key(&self.file_path)
    }
}

/// Metadata store key for a recording file
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
