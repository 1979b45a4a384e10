//! In-process encoder and decoder doubles for controller tests

use super::wav::write_wav;
use super::{AudioFormat, CompletionSender, Decoder, DecoderFactory, Encoder, EncoderFactory};
use crate::error::{AppError, AppResult};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Encoder factory that writes a short silent WAV on stop
#[derive(Clone, Default)]
pub struct FakeEncoders {
    fail_open: bool,
    fail_stop: bool,
    opened: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl FakeEncoders {
    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::default()
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

struct FakeEncoder {
    output: PathBuf,
    format: AudioFormat,
    fail_stop: bool,
    stopped: Arc<AtomicUsize>,
}

impl EncoderFactory for FakeEncoders {
    fn open(&self, output: &Path, format: AudioFormat) -> AppResult<Box<dyn Encoder>> {
        if self.fail_open {
            return Err(AppError::EncoderInit("fake open failure".to_string()));
        }
        File::create(output)?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeEncoder {
            output: output.to_path_buf(),
            format,
            fail_stop: self.fail_stop,
            stopped: self.stopped.clone(),
        }))
    }
}

impl Encoder for FakeEncoder {
    fn start(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn stop(&mut self) -> AppResult<()> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(AppError::EncoderFinalize("fake stop failure".to_string()));
        }
        write_wav(&self.output, self.format, &[0.0; 64])
    }
}

/// Decoder factory whose sessions end when the test says so
#[derive(Clone, Default)]
pub struct FakeDecoders {
    completion: Arc<Mutex<Option<CompletionSender>>>,
    stopped: Arc<AtomicUsize>,
}

impl FakeDecoders {
    /// Simulate the most recent decoder reaching end of media
    pub fn finish(&self) {
        if let Some(sender) = self.completion.lock().unwrap().take() {
            let _ = sender.send(());
        }
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

struct FakeDecoder {
    // Held so the completion channel stays connected while playing
    _on_complete: CompletionSender,
    stopped: Arc<AtomicUsize>,
}

impl DecoderFactory for FakeDecoders {
    fn open(&self, input: &Path, on_complete: CompletionSender) -> AppResult<Box<dyn Decoder>> {
        if !input.is_file() {
            return Err(AppError::DecoderInit(format!("{:?} is not a file", input)));
        }
        *self.completion.lock().unwrap() = Some(on_complete.clone());
        Ok(Box::new(FakeDecoder {
            _on_complete: on_complete,
            stopped: self.stopped.clone(),
        }))
    }
}

impl Decoder for FakeDecoder {
    fn start(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}
