//! Microphone capture using PipeWire
//!
//! Samples are buffered in memory while capturing and written to the output
//! file as WAV when the encoder stops.

use super::wav::{duration_millis, write_wav};
use super::{AudioFormat, Encoder, EncoderFactory};
use crate::error::{AppError, AppResult};
use log::{debug, warn};
use pipewire as pw;
use pw::spa;
use pw::spa::param::format::{MediaSubtype, MediaType};
use pw::spa::param::format_utils;
use pw::spa::pod::Pod;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Samples captured so far, shared with the PipeWire thread
#[derive(Clone, Default)]
struct CaptureBuffer {
    inner: Arc<Mutex<CaptureInner>>,
}

#[derive(Default)]
struct CaptureInner {
    samples: Vec<f32>,
    error: Option<String>,
}

impl CaptureBuffer {
    fn lock(&self) -> std::sync::MutexGuard<'_, CaptureInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn extend(&self, samples: &[f32]) {
        self.lock().samples.extend_from_slice(samples);
    }

    fn set_error(&self, error: String) {
        self.lock().error = Some(error);
    }

    fn take(&self) -> Result<Vec<f32>, String> {
        let mut inner = self.lock();
        match inner.error.take() {
            Some(error) => Err(error),
            None => Ok(std::mem::take(&mut inner.samples)),
        }
    }
}

enum PipeWireCommand {
    Stop,
}

/// Opens PipeWire microphone encoders
pub struct PipeWireEncoderFactory;

impl EncoderFactory for PipeWireEncoderFactory {
    fn open(&self, output: &Path, format: AudioFormat) -> AppResult<Box<dyn Encoder>> {
        // Claim the output path up front so a bad location fails here, not at stop
        File::create(output)
            .map_err(|e| AppError::EncoderInit(format!("Failed to create {:?}: {}", output, e)))?;

        Ok(Box::new(PipeWireEncoder {
            output: output.to_path_buf(),
            format,
            buffer: CaptureBuffer::default(),
            thread_handle: None,
            sender: None,
        }))
    }
}

struct PipeWireEncoder {
    output: PathBuf,
    format: AudioFormat,
    buffer: CaptureBuffer,
    thread_handle: Option<JoinHandle<()>>,
    sender: Option<pw::channel::Sender<PipeWireCommand>>,
}

impl PipeWireEncoder {
    /// Stop the capture thread and wait for it to exit
    fn halt(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(PipeWireCommand::Stop);
        }
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                self.buffer.set_error("Capture thread panicked".to_string());
            }
        }
    }
}

impl Encoder for PipeWireEncoder {
    fn start(&mut self) -> AppResult<()> {
        if self.thread_handle.is_some() {
            return Ok(());
        }

        let (sender, receiver) = pw::channel::channel::<PipeWireCommand>();
        let buffer = self.buffer.clone();
        let format = self.format;

        let handle = thread::Builder::new()
            .name("murmur-capture".to_string())
            .spawn(move || {
                if let Err(e) = run_capture_loop(buffer.clone(), format, receiver) {
                    warn!("Capture failed: {}", e);
                    buffer.set_error(e);
                }
            })
            .map_err(|e| AppError::EncoderInit(format!("Failed to spawn capture thread: {}", e)))?;

        self.sender = Some(sender);
        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) -> AppResult<()> {
        self.halt();

        let samples = self.buffer.take().map_err(AppError::EncoderFinalize)?;
        debug!(
            "Captured {} ms of audio into {:?}",
            duration_millis(samples.len(), self.format),
            self.output
        );
        write_wav(&self.output, self.format, &samples)
    }
}

impl Drop for PipeWireEncoder {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Run the PipeWire capture loop in a background thread
fn run_capture_loop(
    buffer: CaptureBuffer,
    format: AudioFormat,
    receiver: pw::channel::Receiver<PipeWireCommand>,
) -> Result<(), String> {
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
        PipeWireCommand::Stop => {
            if let Some(mainloop) = mainloop_weak.upgrade() {
                mainloop.quit();
            }
        }
    });

    struct UserData {
        negotiated: spa::param::audio::AudioInfoRaw,
        channels: usize,
        buffer: CaptureBuffer,
    }

    let user_data = UserData {
        negotiated: Default::default(),
        channels: usize::from(format.channels.max(1)),
        buffer,
    };

    let props = pw::properties::properties! {
        *pw::keys::MEDIA_TYPE => "Audio",
        *pw::keys::MEDIA_CATEGORY => "Capture",
        *pw::keys::MEDIA_ROLE => "Communication",
        *pw::keys::APP_NAME => "Murmur",
    };

    let stream = pw::stream::StreamBox::new(&core, "murmur-capture", props)
        .map_err(|e| format!("Failed to create PipeWire stream: {}", e))?;

    let _listener = stream
        .add_local_listener_with_user_data(user_data)
        .param_changed(|_, user_data, id, param| {
            let Some(param) = param else { return };
            if id != spa::param::ParamType::Format.as_raw() {
                return;
            }

            let Ok((media_type, media_subtype)) = format_utils::parse_format(param) else {
                return;
            };
            if media_type != MediaType::Audio || media_subtype != MediaSubtype::Raw {
                return;
            }

            if let Err(e) = user_data.negotiated.parse(param) {
                warn!("Failed to parse negotiated capture format: {:?}", e);
            }
        })
        .process(|stream, user_data| {
            let Some(mut buffer) = stream.dequeue_buffer() else {
                return;
            };

            let datas = buffer.datas_mut();
            if datas.is_empty() {
                return;
            }

            let data = &mut datas[0];
            let stream_channels = (user_data.negotiated.channels() as usize).max(1);
            let keep = user_data.channels.min(stream_channels);
            let size = data.chunk().size() as usize;
            let Some(raw) = data.data() else {
                return;
            };

            let raw = &raw[..size.min(raw.len())];
            let frame_bytes = stream_channels * std::mem::size_of::<f32>();
            let mut samples = Vec::with_capacity(raw.len() / frame_bytes * user_data.channels);

            for frame in raw.chunks_exact(frame_bytes) {
                for channel in 0..user_data.channels {
                    // Missing channels repeat the last one the stream provides
                    let source = channel.min(keep - 1) * 4;
                    let bytes: [u8; 4] = frame[source..source + 4].try_into().unwrap_or([0; 4]);
                    samples.push(f32::from_le_bytes(bytes));
                }
            }

            user_data.buffer.extend(&samples);
        })
        .register()
        .map_err(|e| format!("Failed to register stream listener: {}", e))?;

    let values = format_pod(format)?;
    let pod = Pod::from_bytes(&values).ok_or("Failed to build audio format pod")?;
    let mut params = [pod];

    stream
        .connect(
            spa::utils::Direction::Input,
            None,
            pw::stream::StreamFlags::AUTOCONNECT
                | pw::stream::StreamFlags::MAP_BUFFERS
                | pw::stream::StreamFlags::RT_PROCESS,
            &mut params,
        )
        .map_err(|e| format!("Failed to connect stream: {}", e))?;

    // Run until stopped
    mainloop.run();

    Ok(())
}

/// Serialize an F32LE format request for `format`
pub(super) fn format_pod(format: AudioFormat) -> Result<Vec<u8>, String> {
    let mut audio_info = spa::param::audio::AudioInfoRaw::new();
    audio_info.set_format(spa::param::audio::AudioFormat::F32LE);
    audio_info.set_rate(format.sample_rate);
    audio_info.set_channels(u32::from(format.channels));

    let obj = spa::pod::Object {
        type_: spa::utils::SpaTypes::ObjectParamFormat.as_raw(),
        id: spa::param::ParamType::EnumFormat.as_raw(),
        properties: audio_info.into(),
    };

    Ok(spa::pod::serialize::PodSerializer::serialize(
        std::io::Cursor::new(Vec::new()),
        &spa::pod::Value::Object(obj),
    )
    .map_err(|e| format!("Failed to serialize audio format: {:?}", e))?
    .0
    .into_inner())
}
