//! Recording and playback session controllers

mod playback;
mod recording;
mod ticker;

pub use playback::PlaybackController;
pub use recording::RecordingController;
pub use ticker::ElapsedDisplay;
