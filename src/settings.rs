//! Application settings persistence using dconf
//!
//! Settings are stored in dconf under `/com/murmur/voice-memos/`

use log::error;
use std::path::{Path, PathBuf};

const DCONF_PATH: &str = "/com/murmur/voice-memos/";

/// Keys for dconf settings
mod keys {
    pub const DATA_DIR: &str = "data-dir";
    pub const CONFIRM_ON_DELETE: &str = "confirm-on-delete";
    pub const MICROPHONE_ENABLED: &str = "microphone-enabled";
}

fn key(name: &str) -> String {
    format!("{}{}", DCONF_PATH, name)
}

/// Get the data directory override from dconf
pub fn get_data_dir() -> Option<PathBuf> {
    dconf_rs::get_string(&key(keys::DATA_DIR))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Set the data directory override in dconf
pub fn set_data_dir(dir: &Path) {
    if let Err(e) = dconf_rs::set_string(&key(keys::DATA_DIR), &dir.to_string_lossy()) {
        error!("Failed to save data directory to dconf: {}", e);
    }
}

/// Get the confirm on delete setting from dconf (defaults to true)
pub fn get_confirm_on_delete() -> bool {
    dconf_rs::get_boolean(&key(keys::CONFIRM_ON_DELETE)).unwrap_or(true)
}

/// Set the confirm on delete setting in dconf
pub fn set_confirm_on_delete(confirm: bool) {
    if let Err(e) = dconf_rs::set_boolean(&key(keys::CONFIRM_ON_DELETE), confirm) {
        error!("Failed to save confirm on delete setting to dconf: {}", e);
    }
}

/// Get whether recording from the microphone is allowed (defaults to true)
pub fn get_microphone_enabled() -> bool {
    dconf_rs::get_boolean(&key(keys::MICROPHONE_ENABLED)).unwrap_or(true)
}

/// Set whether recording from the microphone is allowed
pub fn set_microphone_enabled(enabled: bool) {
    if let Err(e) = dconf_rs::set_boolean(&key(keys::MICROPHONE_ENABLED), enabled) {
        error!("Failed to save microphone setting to dconf: {}", e);
    }
}

/// On-disk locations for recordings and their metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub records_dir: PathBuf,
    pub metadata_file: PathBuf,
}

impl DataPaths {
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            records_dir: data_dir.join("records"),
            metadata_file: data_dir.join("records.json"),
        }
    }

    /// Resolve from an explicit directory, then dconf, then the XDG data dir
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let data_dir = explicit
            .map(Path::to_path_buf)
            .or_else(get_data_dir)
            .unwrap_or_else(default_data_dir);
        Self::in_dir(data_dir)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("murmur")
}
