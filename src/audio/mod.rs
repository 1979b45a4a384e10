//! Audio capture and playback backends
//!
//! This module provides:
//! - Encoder/decoder handle traits the session controllers drive
//! - WAV file writing and reading via hound
//! - PipeWire microphone capture and playback (`pipewire` feature)

#[cfg(feature = "pipewire")]
mod capture;
#[cfg(feature = "pipewire")]
mod playback;
#[cfg(test)]
pub mod testing;
#[cfg_attr(not(feature = "pipewire"), allow(dead_code))]
mod wav;

use crate::error::{AppError, AppResult};
use std::path::Path;
use std::sync::mpsc::Sender;

#[cfg(feature = "pipewire")]
pub use capture::PipeWireEncoderFactory;
#[cfg(feature = "pipewire")]
pub use playback::PipeWireDecoderFactory;

/// Fixed audio parameters of a recording
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate: u32,
}

/// Format every new recording is captured in
pub const RECORDING_FORMAT: AudioFormat = AudioFormat {
    channels: 1,
    sample_rate: 44_100,
};

/// Notifies a playback session that the decoder reached end of media
pub type CompletionSender = Sender<()>;

/// An open capture session writing to one output file
///
/// Dropping the encoder releases it.
pub trait Encoder: Send {
    fn start(&mut self) -> AppResult<()>;

    /// Stop capturing and finalize the output file
    fn stop(&mut self) -> AppResult<()>;
}

pub trait EncoderFactory {
    /// Configure an encoder for `output`; nothing is captured until `start`
    fn open(&self, output: &Path, format: AudioFormat) -> AppResult<Box<dyn Encoder>>;
}

/// An open playback session for one input file
///
/// Dropping the decoder releases it.
pub trait Decoder: Send {
    fn start(&mut self) -> AppResult<()>;

    fn stop(&mut self);
}

pub trait DecoderFactory {
    /// Open and prepare `input`; `on_complete` fires once at natural end
    fn open(&self, input: &Path, on_complete: CompletionSender) -> AppResult<Box<dyn Decoder>>;
}

/// Whether the microphone may be used
pub trait MicrophonePermission {
    fn is_granted(&self) -> bool;
}

/// Permission backed by the `microphone-enabled` setting
pub struct SettingsPermission;

impl MicrophonePermission for SettingsPermission {
    fn is_granted(&self) -> bool {
        crate::settings::get_microphone_enabled()
    }
}

/// Backend used when no audio system is compiled in
#[cfg(any(test, not(feature = "pipewire")))]
pub struct NoBackend;

#[cfg(any(test, not(feature = "pipewire")))]
const NO_BACKEND: &str = "built without an audio backend (enable the `pipewire` feature)";

#[cfg(any(test, not(feature = "pipewire")))]
impl EncoderFactory for NoBackend {
    fn open(&self, _output: &Path, _format: AudioFormat) -> AppResult<Box<dyn Encoder>> {
        Err(AppError::EncoderInit(NO_BACKEND.to_string()))
    }
}

#[cfg(any(test, not(feature = "pipewire")))]
impl DecoderFactory for NoBackend {
    fn open(&self, _input: &Path, _on_complete: CompletionSender) -> AppResult<Box<dyn Decoder>> {
        Err(AppError::DecoderInit(NO_BACKEND.to_string()))
    }
}

/// Encoder factory for this build
pub fn system_encoders() -> Box<dyn EncoderFactory> {
    #[cfg(feature = "pipewire")]
    {
        Box::new(PipeWireEncoderFactory)
    }
    #[cfg(not(feature = "pipewire"))]
    {
        Box::new(NoBackend)
    }
}

/// Decoder factory for this build
pub fn system_decoders() -> Box<dyn DecoderFactory> {
    #[cfg(feature = "pipewire")]
    {
        Box::new(PipeWireDecoderFactory)
    }
    #[cfg(not(feature = "pipewire"))]
    {
        Box::new(NoBackend)
    }
}
