//! WAV file encoding using hound
//!
//! Recordings are stored as 32-bit float PCM with interleaved channels.

use super::AudioFormat;
use crate::error::{AppError, AppResult};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

fn spec(format: AudioFormat) -> WavSpec {
    WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Write interleaved samples to `path`, replacing any existing file
pub fn write_wav(path: &Path, format: AudioFormat, samples: &[f32]) -> AppResult<()> {
    let file = File::create(path)?;
    let mut writer = WavWriter::new(BufWriter::new(file), spec(format))
        .map_err(|e| AppError::EncoderFinalize(format!("Failed to create WAV writer: {}", e)))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| AppError::EncoderFinalize(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| AppError::EncoderFinalize(format!("Failed to finalize WAV file: {}", e)))
}

/// Read a WAV file as interleaved f32 samples
pub fn read_wav(path: &Path) -> AppResult<(Vec<f32>, AudioFormat)> {
    let reader = WavReader::open(path)
        .map_err(|e| AppError::DecoderInit(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    let format = AudioFormat {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    };

    let samples: Result<Vec<f32>, _> = match spec.sample_format {
        SampleFormat::Float => reader.into_samples::<f32>().collect(),
        SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect()
        }
    };

    let samples =
        samples.map_err(|e| AppError::DecoderInit(format!("Failed to read samples: {}", e)))?;

    Ok((samples, format))
}

/// Duration in milliseconds of an interleaved sample buffer
pub fn duration_millis(sample_count: usize, format: AudioFormat) -> u64 {
    let frames = sample_count as u64 / u64::from(format.channels.max(1));
    frames * 1000 / u64::from(format.sample_rate.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RECORDING_FORMAT;
    use tempfile::tempdir;

    #[test]
    fn test_duration_calculation() {
        let stereo = AudioFormat { channels: 2, sample_rate: 16000 };
        assert_eq!(duration_millis(16000, RECORDING_FORMAT), 362);
        assert_eq!(duration_millis(44_100, RECORDING_FORMAT), 1000);
        assert_eq!(duration_millis(32000, stereo), 1000);
        assert_eq!(duration_millis(0, stereo), 0);
    }

    #[test]
    fn test_written_file_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1700000000000");
        let samples = vec![0.0, 0.25, -0.5, 1.0];

        write_wav(&path, RECORDING_FORMAT, &samples).unwrap();
        let (read, format) = read_wav(&path).unwrap();
        assert_eq!(format, RECORDING_FORMAT);
        assert_eq!(read, samples);
    }

    #[test]
    fn test_non_wav_file_is_decoder_init_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage");
        std::fs::write(&path, b"not audio").unwrap();
        assert!(matches!(read_wav(&path), Err(AppError::DecoderInit(_))));
    }
}
