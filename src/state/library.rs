//! The set of persisted recordings
//!
//! A recording is persisted only when its audio file exists in the records
//! directory *and* the metadata store has an entry keyed by that file's
//! path. Loading reconciles the two and purges whichever half is orphaned.

use super::database::MetadataStore;
use super::pending_deletes::PendingDeletes;
use super::recording_list::RecordingList;
use crate::error::{AppError, AppResult};
use crate::models::{path_key, Recording};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Library {
    records_dir: PathBuf,
    store: Box<dyn MetadataStore>,
    list: RecordingList,
    pending: PendingDeletes,
}

impl Library {
    /// Load recordings from `records_dir`, purging orphans
    pub fn load(records_dir: impl AsRef<Path>, mut store: Box<dyn MetadataStore>) -> AppResult<Self> {
        fs::create_dir_all(records_dir.as_ref())?;
        let records_dir = fs::canonicalize(records_dir.as_ref())?;
        let mut pending = PendingDeletes::new();

        let mut files: Vec<PathBuf> = fs::read_dir(&records_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect();
        files.sort();

        let mut recordings = Vec::with_capacity(files.len());
        let mut seen = HashSet::new();
        for path in files {
            let key = path_key(&path);
            match store.get(&key) {
                Ok(Some(metadata)) => {
                    seen.insert(key);
                    recordings.push(Recording::from_metadata(path, metadata));
                }
                Ok(None) => {
                    info!("Removing orphaned recording file {:?}", path);
                    pending.remove_file(&path);
                }
                Err(e) => {
                    warn!("{}; removing {:?}", e, path);
                    pending.remove_file(&path);
                    if let Err(e) = store.remove(&key) {
                        warn!("Failed to drop corrupt metadata for {}: {}", key, e);
                    }
                }
            }
        }

        // Entries whose file vanished are orphans too
        for key in store.keys() {
            let in_records_dir = Path::new(&key).parent() == Some(records_dir.as_path());
            if in_records_dir && !seen.contains(&key) {
                info!("Removing metadata for missing file {}", key);
                if let Err(e) = store.remove(&key) {
                    warn!("Failed to remove stale metadata for {}: {}", key, e);
                }
            }
        }

        recordings.sort_by_key(|r| r.created_at_millis);
        debug!("Loaded {} recordings from {:?}", recordings.len(), records_dir);

        Ok(Self {
            records_dir,
            store,
            list: RecordingList::from(recordings),
            pending,
        })
    }

    /// Get the canonical records directory
    pub fn records_dir(&self) -> &Path {
        &self.records_dir
    }

    pub fn list(&self) -> &RecordingList {
        &self.list
    }

    pub fn store(&self) -> &dyn MetadataStore {
        self.store.as_ref()
    }

    /// Persist a finished recording and append it to the list
    pub fn commit(&mut self, recording: Recording) -> AppResult<()> {
        self.store.put(&recording.key(), &recording.metadata())?;
        self.list.add_item(recording);
        Ok(())
    }

    /// Remove a partially written file that never became a recording
    pub fn discard_file(&mut self, path: &Path) {
        self.pending.remove_file(path);
    }

    /// Delete a recording's file, metadata and list entry
    pub fn delete(&mut self, recording: &Recording) {
        self.pending.remove_file(&recording.file_path);
        if let Err(e) = self.store.remove(&recording.key()) {
            warn!("Failed to remove metadata for {:?}: {}", recording.file_path, e);
        }
        self.list.remove_item(recording);
        info!("Deleted recording {:?}", recording.file_path);
    }

    /// Change a recording's display name
    pub fn rename(&mut self, path: &Path, name: &str) -> AppResult<Recording> {
        let recording = self
            .list
            .get(path)
            .ok_or_else(|| AppError::UnknownRecording(path_key(path)))?;

        let mut renamed = recording.clone();
        renamed.name = name.to_string();
        self.store.put(&renamed.key(), &renamed.metadata())?;

        if let Some(entry) = self.list.get_mut(path) {
            entry.name = renamed.name.clone();
        }
        Ok(renamed)
    }

    /// Retry deferred deletions; returns how many are still pending
    pub fn flush_pending(&mut self) -> usize {
        self.pending.flush()
    }
}
