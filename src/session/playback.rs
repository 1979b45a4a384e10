//! Recording playback lifecycle
//!
//! `Idle -> Playing -> Idle`, returning to idle on an explicit stop or when
//! the decoder reports end of media. The display shows wall-clock time since
//! `play` was called, not the decoder position.
//!
//! Switching recordings requires a `stop` first; `play` while playing is
//! ignored.

use super::ticker::{ElapsedDisplay, Ticker, TICK_INTERVAL};
use crate::audio::{Decoder, DecoderFactory};
use crate::format::format_duration;
use crate::models::Recording;
use log::{debug, info, warn};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
}

struct ActivePlayback {
    recording: Recording,
    decoder: Box<dyn Decoder>,
    ticker: Ticker,
    completion: Receiver<()>,
}

pub struct PlaybackController {
    decoders: Box<dyn DecoderFactory>,
    tick_interval: Duration,
    display: ElapsedDisplay,
    active: Option<ActivePlayback>,
}

impl PlaybackController {
    pub fn new(decoders: Box<dyn DecoderFactory>) -> Self {
        Self {
            decoders,
            tick_interval: TICK_INTERVAL,
            display: ElapsedDisplay::new(None),
            active: None,
        }
    }

    /// Set the tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn state(&self) -> PlayerState {
        if self.active.is_some() {
            PlayerState::Playing
        } else {
            PlayerState::Idle
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    /// Elapsed-time display, empty while idle
    pub fn display(&self) -> ElapsedDisplay {
        self.display.clone()
    }

    /// The recording being played
    pub fn current(&self) -> Option<&Recording> {
        self.active.as_ref().map(|a| &a.recording)
    }

    /// Start playing `recording`
    ///
    /// Failures are logged and leave the player idle; check `is_playing`.
    pub fn play(&mut self, recording: &Recording) {
        if let Some(active) = &self.active {
            warn!(
                "Ignoring play of {:?}: {:?} is still playing",
                recording.file_path, active.recording.file_path
            );
            return;
        }

        let (on_complete, completion) = channel();
        let mut decoder = match self.decoders.open(&recording.file_path, on_complete) {
            Ok(decoder) => decoder,
            Err(e) => {
                warn!("Failed to play {:?}: {}", recording.file_path, e);
                return;
            }
        };
        if let Err(e) = decoder.start() {
            warn!("Failed to play {:?}: {}", recording.file_path, e);
            decoder.stop();
            return;
        }

        let started = Instant::now();
        let token = self.display.begin_session(None);
        let ticker = Ticker::start(self.tick_interval, move || {
            token.publish(format_duration(started.elapsed().as_millis() as u64))
        });

        info!("Playing {:?}", recording.file_path);
        self.active = Some(ActivePlayback {
            recording: recording.clone(),
            decoder,
            ticker,
            completion,
        });
    }

    /// Stop playback and release the decoder; no-op while idle
    pub fn stop(&mut self) {
        let Some(ActivePlayback {
            recording,
            mut decoder,
            mut ticker,
            ..
        }) = self.active.take()
        else {
            return;
        };

        ticker.cancel();
        self.display.end_session(None);
        decoder.stop();
        debug!("Playback of {:?} stopped", recording.file_path);
    }

    /// Handle a pending end-of-media notification
    ///
    /// Returns true if playback just finished.
    pub fn poll(&mut self) -> bool {
        let finished = match &self.active {
            Some(active) => !matches!(active.completion.try_recv(), Err(TryRecvError::Empty)),
            None => false,
        };
        if finished {
            self.stop();
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::FakeDecoders;
    use std::fs;
    use std::path::PathBuf;
    use std::thread::sleep;
    use tempfile::tempdir;

    fn player(decoders: &FakeDecoders) -> PlaybackController {
        PlaybackController::new(Box::new(decoders.clone())).with_tick_interval(Duration::from_millis(5))
    }

    fn recording_in(dir: &std::path::Path) -> Recording {
        let path = dir.join("1700000000000");
        fs::write(&path, b"audio").unwrap();
        Recording::new(path, 1_700_000_000_000)
    }

    #[test]
    fn test_play_shows_elapsed_time() {
        let dir = tempdir().unwrap();
        let decoders = FakeDecoders::default();
        let mut player = player(&decoders);
        let recording = recording_in(dir.path());

        player.play(&recording);
        assert_eq!(player.state(), PlayerState::Playing);
        assert_eq!(player.current(), Some(&recording));
        sleep(Duration::from_millis(30));
        assert_eq!(player.display().text().as_deref(), Some("00:00:00"));

        player.stop();
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.display().text(), None);
        assert_eq!(decoders.stopped(), 1);
    }

    #[test]
    fn test_completion_returns_to_idle() {
        let dir = tempdir().unwrap();
        let decoders = FakeDecoders::default();
        let mut player = player(&decoders);

        player.play(&recording_in(dir.path()));
        assert!(!player.poll());
        decoders.finish();
        assert!(player.poll());
        assert!(!player.is_playing());
        assert_eq!(player.display().text(), None);
        assert!(!player.poll());
    }

    #[test]
    fn test_poll_sees_completion() {
        let dir = tempdir().unwrap();
        let decoders = FakeDecoders::default();
        let mut player = player(&decoders);

        player.play(&recording_in(dir.path()));
        decoders.finish();
        assert!(player.poll());
        assert_eq!(player.state(), PlayerState::Idle);
    }

    #[test]
    fn test_decoder_failure_stays_idle() {
        let decoders = FakeDecoders::default();
        let mut player = player(&decoders);
        let missing = Recording::new(PathBuf::from("/nonexistent/murmur/1"), 1);

        player.play(&missing);
        assert_eq!(player.state(), PlayerState::Idle);
        assert_eq!(player.display().text(), None);
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let decoders = FakeDecoders::default();
        let mut player = player(&decoders);
        player.stop();
        assert_eq!(decoders.stopped(), 0);
        assert!(!player.poll());
    }

    #[test]
    fn test_play_while_playing_is_ignored() {
        let dir = tempdir().unwrap();
        let decoders = FakeDecoders::default();
        let mut player = player(&decoders);
        let first = recording_in(dir.path());
        let other_path = dir.path().join("1700000000001");
        fs::write(&other_path, b"audio").unwrap();
        let second = Recording::new(other_path, 1_700_000_000_001);

        player.play(&first);
        player.play(&second);
        assert_eq!(player.current(), Some(&first));
        player.stop();
    }

    #[test]
    fn test_no_tick_lands_after_stop() {
        let dir = tempdir().unwrap();
        let decoders = FakeDecoders::default();
        let mut player = player(&decoders);
        let display = player.display();

        player.play(&recording_in(dir.path()));
        sleep(Duration::from_millis(30));
        player.stop();
        let updates = display.updates();

        sleep(Duration::from_millis(50));
        assert_eq!(display.updates(), updates);
        assert_eq!(display.text(), None);
    }
}
