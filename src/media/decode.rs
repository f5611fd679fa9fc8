//! Decoding of WAV and FLAC files into normalized floating point samples.
//!
//! Everything is decoded up front into memory. Sources in an arrangement are
//! short takes, and holding the full buffer lets playback start at any offset
//! without seeking inside the container.

use crate::error::DecodeError;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

/// Interleaved samples normalized to `[-1.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Arc<[f32]>,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Average every frame down to a single channel
    pub fn to_mono(&self) -> Vec<f32> {
        let channels = self.channels.max(1) as usize;
        if channels == 1 {
            return self.samples.to_vec();
        }
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }

    /// Interleaved sample index of the frame at `seconds`, clamped to the buffer
    pub fn sample_index_at(&self, seconds: f64) -> usize {
        let frame = (seconds.max(0.0) * self.sample_rate as f64) as usize;
        (frame * self.channels as usize).min(self.samples.len())
    }
}

pub fn decode_file(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let decoded = match ext.as_str() {
        "wav" => decode_wav(path)?,
        "flac" => decode_flac(path)?,
        _ => {
            return Err(DecodeError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: ext,
            });
        }
    };

    if decoded.channels == 0 || decoded.sample_rate == 0 {
        return Err(DecodeError::EmptyStream {
            path: path.to_path_buf(),
        });
    }

    log::debug!(
        "Decoded {}: {} Hz, {} channels, {:.3}s",
        path.display(),
        decoded.sample_rate,
        decoded.channels,
        decoded.duration_seconds()
    );

    Ok(decoded)
}

fn decode_wav(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let wav_error = |e: hound::Error| DecodeError::Wav {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut reader = hound::WavReader::new(BufReader::new(file)).map_err(wav_error)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if bits == 0 || bits > 32 {
                return Err(DecodeError::UnsupportedBitDepth {
                    path: path.to_path_buf(),
                    bits: bits as u32,
                });
            }
            let max_value = (1i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<_, _>>()
                .map_err(wav_error)?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(wav_error)?,
    };

    Ok(DecodedAudio {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        samples: samples.into(),
    })
}

fn decode_flac(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let flac_error = |e: claxon::Error| DecodeError::Flac {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut reader = claxon::FlacReader::open(path).map_err(flac_error)?;
    let info = reader.streaminfo();

    if info.bits_per_sample == 0 || info.bits_per_sample > 32 {
        return Err(DecodeError::UnsupportedBitDepth {
            path: path.to_path_buf(),
            bits: info.bits_per_sample,
        });
    }
    let max_value = (1i64 << (info.bits_per_sample - 1)) as f32;

    // claxon yields samples already interleaved
    let samples: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|s| s as f32 / max_value))
        .collect::<Result<_, _>>()
        .map_err(flac_error)?;

    Ok(DecodedAudio {
        sample_rate: info.sample_rate,
        channels: info.channels as u16,
        samples: samples.into(),
    })
}
