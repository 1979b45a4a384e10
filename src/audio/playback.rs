//! Audio playback using PipeWire

use super::capture::format_pod;
use super::wav::{duration_millis, read_wav};
use super::{AudioFormat, CompletionSender, Decoder, DecoderFactory};
use crate::error::{AppError, AppResult};
use log::{debug, warn};
use pipewire as pw;
use pw::spa;
use pw::spa::pod::Pod;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

enum PlaybackCommand {
    Stop,
}

/// Opens PipeWire decoders for recorded WAV files
pub struct PipeWireDecoderFactory;

impl DecoderFactory for PipeWireDecoderFactory {
    fn open(&self, input: &Path, on_complete: CompletionSender) -> AppResult<Box<dyn Decoder>> {
        let (samples, format) = read_wav(input)?;
        if format.channels == 0 || format.sample_rate == 0 {
            return Err(AppError::DecoderInit(format!("Unsupported format in {:?}", input)));
        }
        debug!(
            "Prepared {:?} ({} ms, {} Hz, {} ch)",
            input,
            duration_millis(samples.len(), format),
            format.sample_rate,
            format.channels
        );

        Ok(Box::new(PipeWireDecoder {
            samples: Arc::new(samples),
            format,
            on_complete: Some(on_complete),
            thread_handle: None,
            sender: None,
        }))
    }
}

struct PipeWireDecoder {
    samples: Arc<Vec<f32>>,
    format: AudioFormat,
    on_complete: Option<CompletionSender>,
    thread_handle: Option<JoinHandle<()>>,
    sender: Option<pw::channel::Sender<PlaybackCommand>>,
}

impl Decoder for PipeWireDecoder {
    fn start(&mut self) -> AppResult<()> {
        let Some(on_complete) = self.on_complete.take() else {
            return Ok(());
        };

        let (sender, receiver) = pw::channel::channel::<PlaybackCommand>();
        let samples = self.samples.clone();
        let format = self.format;

        let handle = thread::Builder::new()
            .name("murmur-playback".to_string())
            .spawn(move || match run_playback_loop(samples, format, receiver) {
                Ok(true) => {
                    let _ = on_complete.send(());
                }
                Ok(false) => {}
                // Dropping on_complete disconnects the channel, which ends the session
                Err(e) => warn!("Playback failed: {}", e),
            })
            .map_err(|e| AppError::DecoderInit(format!("Failed to spawn playback thread: {}", e)))?;

        self.sender = Some(sender);
        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(PlaybackCommand::Stop);
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PipeWireDecoder {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run the PipeWire playback loop in a background thread
///
/// Returns true if the samples ran out, false if stopped by command.
fn run_playback_loop(
    samples: Arc<Vec<f32>>,
    format: AudioFormat,
    receiver: pw::channel::Receiver<PlaybackCommand>,
) -> Result<bool, String> {
    pw::init();

    let mainloop = pw::main_loop::MainLoopRc::new(None)
        .map_err(|e| format!("Failed to create PipeWire main loop: {}", e))?;

    let context = pw::context::ContextRc::new(&mainloop, None)
        .map_err(|e| format!("Failed to create PipeWire context: {}", e))?;

    let core = context
        .connect_rc(None)
        .map_err(|e| format!("Failed to connect to PipeWire: {}", e))?;

    let mainloop_weak = mainloop.downgrade();
    let _receiver = receiver.attach(mainloop.loop_(), move |cmd| match cmd {
        PlaybackCommand::Stop => {
            if let Some(mainloop) = mainloop_weak.upgrade() {
                mainloop.quit();
            }
        }
    });

    let finished = Arc::new(AtomicBool::new(false));

    struct UserData {
        samples: Arc<Vec<f32>>,
        position: usize,
        channels: usize,
        finished: Arc<AtomicBool>,
        mainloop_weak: pw::main_loop::MainLoopWeak,
    }

    let user_data = UserData {
        samples,
        position: 0,
        channels: usize::from(format.channels),
        finished: finished.clone(),
        mainloop_weak: mainloop.downgrade(),
    };

    let props = pw::properties::properties! {
        *pw::keys::MEDIA_TYPE => "Audio",
        *pw::keys::MEDIA_CATEGORY => "Playback",
        *pw::keys::MEDIA_ROLE => "Music",
        *pw::keys::APP_NAME => "Murmur",
    };

    let stream = pw::stream::StreamBox::new(&core, "murmur-playback", props)
        .map_err(|e| format!("Failed to create PipeWire stream: {}", e))?;

    let _listener = stream
        .add_local_listener_with_user_data(user_data)
        .process(|stream, user_data| {
            let Some(mut buffer) = stream.dequeue_buffer() else {
                return;
            };

            let datas = buffer.datas_mut();
            if datas.is_empty() {
                return;
            }

            let remaining = user_data.samples.len() - user_data.position;
            if remaining == 0 {
                user_data.finished.store(true, Ordering::SeqCst);
                if let Some(mainloop) = user_data.mainloop_weak.upgrade() {
                    mainloop.quit();
                }
                return;
            }

            let data = &mut datas[0];
            let stride = std::mem::size_of::<f32>() * user_data.channels;
            let Some(slice) = data.data() else {
                return;
            };

            if remaining < user_data.channels {
                // Trailing partial frame
                user_data.position = user_data.samples.len();
                return;
            }
            let capacity = slice.len() / stride * user_data.channels;
            let count = capacity.min(remaining - remaining % user_data.channels);
            if count == 0 {
                return;
            }
            let end = user_data.position + count;
            for (i, sample) in user_data.samples[user_data.position..end].iter().enumerate() {
                let offset = i * 4;
                slice[offset..offset + 4].copy_from_slice(&sample.to_le_bytes());
            }
            user_data.position = end;

            let chunk = data.chunk_mut();
            *chunk.offset_mut() = 0;
            *chunk.stride_mut() = stride as i32;
            *chunk.size_mut() = (count * 4) as u32;
        })
        .register()
        .map_err(|e| format!("Failed to register stream listener: {}", e))?;

    let values = format_pod(format)?;
    let pod = Pod::from_bytes(&values).ok_or("Failed to build audio format pod")?;
    let mut params = [pod];

    stream
        .connect(
            spa::utils::Direction::Output,
            None,
            pw::stream::StreamFlags::AUTOCONNECT
                | pw::stream::StreamFlags::MAP_BUFFERS
                | pw::stream::StreamFlags::RT_PROCESS,
            &mut params,
        )
        .map_err(|e| format!("Failed to connect stream: {}", e))?;

    // Run until stopped or the samples run out
    mainloop.run();

    Ok(finished.load(Ordering::SeqCst))
}
