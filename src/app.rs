//! Main application component for Murmur
//!
//! Owns the library and both session controllers. Only one session runs at a
//! time, and dropping the app stops whichever one is active.

use crate::audio::{self, MicrophonePermission, SettingsPermission};
use crate::error::{AppError, AppResult};
use crate::models::Recording;
use crate::session::{ElapsedDisplay, PlaybackController, RecordingController};
use crate::settings::DataPaths;
use crate::state::{JsonMetadataStore, Library};
use log::{debug, warn};

pub struct Murmur {
    library: Library,
    recorder: RecordingController,
    player: PlaybackController,
}

impl Murmur {
    pub fn new(library: Library, recorder: RecordingController, player: PlaybackController) -> Self {
        Self {
            library,
            recorder,
            player,
        }
    }

    /// Open the library at `paths` with this build's audio backends
    pub fn open(paths: &DataPaths) -> AppResult<Self> {
        let store = JsonMetadataStore::open(&paths.metadata_file)?;
        let library = Library::load(&paths.records_dir, Box::new(store))?;
        let permission: Box<dyn MicrophonePermission> = Box::new(SettingsPermission);
        let recorder =
            RecordingController::new(library.records_dir(), audio::system_encoders(), permission);
        let player = PlaybackController::new(audio::system_decoders());
        Ok(Self::new(library, recorder, player))
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    pub fn recorder_display(&self) -> ElapsedDisplay {
        self.recorder.display()
    }

    pub fn player_display(&self) -> ElapsedDisplay {
        self.player.display()
    }

    /// Start recording; refused while something is playing
    pub fn start_recording(&mut self) -> AppResult<()> {
        if self.player.is_playing() {
            warn!("Not recording while playback is active");
            return Ok(());
        }
        self.recorder.start()
    }

    pub fn stop_recording(&mut self) -> Option<Recording> {
        self.recorder.stop(&mut self.library)
    }

    /// Start playback; refused while recording
    pub fn play(&mut self, recording: &Recording) {
        if self.recorder.is_recording() {
            warn!("Not playing while a recording is in progress");
            return;
        }
        self.player.play(recording);
    }

    pub fn stop_playback(&mut self) {
        self.player.stop();
    }

    /// Handle a pending end of playback; true if playback just finished
    pub fn poll_playback(&mut self) -> bool {
        self.player.poll()
    }

    pub fn delete(&mut self, recording: &Recording) {
        if self.player.current() == Some(recording) {
            self.player.stop();
        }
        self.library.delete(recording);
    }

    pub fn rename(&mut self, recording: &Recording, name: &str) -> AppResult<Recording> {
        self.library.rename(&recording.file_path, name)
    }

    /// Find a recording by display index (1 = newest), name or path
    pub fn find(&self, target: &str) -> AppResult<Recording> {
        let list = self.library.list();
        let by_index = target
            .parse::<usize>()
            .ok()
            .filter(|&i| i >= 1)
            .and_then(|i| list.newest_first().nth(i - 1));

        by_index
            .or_else(|| list.newest_first().find(|r| r.name == target))
            .or_else(|| list.iter().find(|r| r.file_path.as_os_str() == target))
            .cloned()
            .ok_or_else(|| AppError::UnknownRecording(target.to_string()))
    }

    /// Stop any active session and retry deferred deletions
    pub fn shutdown(&mut self) {
        self.player.stop();
        self.recorder.stop(&mut self.library);
        let left = self.library.flush_pending();
        if left > 0 {
            warn!("{} recording file(s) could not be deleted", left);
        }
        debug!("Shutdown complete");
    }
}

impl Drop for Murmur {
    fn drop(&mut self) {
        self.shutdown();
    }
}
