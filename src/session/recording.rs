//! Microphone recording lifecycle
//!
//! `Idle -> Recording -> Idle`. At most one capture session exists at a time;
//! a successful stop hands the finished file to the [`Library`].

use super::ticker::{ElapsedDisplay, Ticker, TICK_INTERVAL};
use crate::audio::{AudioFormat, Encoder, EncoderFactory, MicrophonePermission, RECORDING_FORMAT};
use crate::error::{AppError, AppResult};
use crate::format::format_duration;
use crate::models::Recording;
use crate::state::Library;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

struct ActiveRecording {
    recording: Recording,
    encoder: Box<dyn Encoder>,
    ticker: Ticker,
}

pub struct RecordingController {
    records_dir: PathBuf,
    format: AudioFormat,
    tick_interval: Duration,
    encoders: Box<dyn EncoderFactory>,
    permission: Box<dyn MicrophonePermission>,
    display: ElapsedDisplay,
    active: Option<ActiveRecording>,
}

impl RecordingController {
    pub fn new(
        records_dir: impl AsRef<Path>,
        encoders: Box<dyn EncoderFactory>,
        permission: Box<dyn MicrophonePermission>,
    ) -> Self {
        Self {
            records_dir: records_dir.as_ref().to_path_buf(),
            format: RECORDING_FORMAT,
            tick_interval: TICK_INTERVAL,
            encoders,
            permission,
            display: ElapsedDisplay::new(Some(format_duration(0))),
            active: None,
        }
    }

    /// Set the tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Elapsed-time display, `00:00:00` while idle
    pub fn display(&self) -> ElapsedDisplay {
        self.display.clone()
    }

    /// The recording being captured
    pub fn current(&self) -> Option<&Recording> {
        self.active.as_ref().map(|a| &a.recording)
    }

    /// Begin capturing into a new file; no-op while already recording
    pub fn start(&mut self) -> AppResult<()> {
        if self.active.is_some() {
            return Ok(());
        }
        if !self.permission.is_granted() {
            return Err(AppError::PermissionDenied);
        }

        fs::create_dir_all(&self.records_dir)
            .map_err(|e| AppError::EncoderInit(format!("Failed to create records directory: {}", e)))?;
        let (output, created_at_millis) = allocate_output(&self.records_dir, now_millis());

        let mut encoder = match self.encoders.open(&output, self.format) {
            Ok(encoder) => encoder,
            Err(e) => {
                remove_partial(&output);
                return Err(e);
            }
        };
        if let Err(e) = encoder.start() {
            drop(encoder);
            remove_partial(&output);
            return Err(e);
        }

        let token = self.display.begin_session(Some(format_duration(0)));
        let ticker = Ticker::start(self.tick_interval, move || {
            let elapsed = (now_millis() - created_at_millis).max(0) as u64;
            token.publish(format_duration(elapsed))
        });

        info!("Recording started: {:?}", output);
        self.active = Some(ActiveRecording {
            recording: Recording::new(output, created_at_millis),
            encoder,
            ticker,
        });
        Ok(())
    }

    /// Finish the capture session; no-op while idle
    ///
    /// Returns the recording added to the library, or `None` if nothing was
    /// recording or finalization failed (the partial file is then removed).
    pub fn stop(&mut self, library: &mut Library) -> Option<Recording> {
        let ActiveRecording {
            mut recording,
            mut encoder,
            mut ticker,
        } = self.active.take()?;

        ticker.cancel();
        self.display.end_session(Some(format_duration(0)));

        let finalized = encoder.stop();
        drop(encoder);

        let committed = finalized.and_then(|()| {
            recording.duration_millis = (now_millis() - recording.created_at_millis).max(0) as u64;
            library.commit(recording.clone())
        });

        match committed {
            Ok(()) => {
                info!(
                    "Recording saved: {:?} ({})",
                    recording.file_path,
                    format_duration(recording.duration_millis)
                );
                Some(recording)
            }
            Err(e) => {
                warn!("Failed to finish recording {:?}: {}", recording.file_path, e);
                library.discard_file(&recording.file_path);
                None
            }
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Pick an unused `<millis>` file name, bumping the timestamp on collision
fn allocate_output(dir: &Path, mut millis: i64) -> (PathBuf, i64) {
    loop {
        let path = dir.join(millis.to_string());
        if !path.exists() {
            return (path, millis);
        }
        debug!("{:?} exists, trying next timestamp", path);
        millis += 1;
    }
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove partial recording {:?}: {}", path, e);
        }
    }
}
