use hound::{SampleFormat, WavReader};
use std::path::Path;
use tracing::info;

use super::error::{MediaError, MediaResult};

/// A WAV file decoded into interleaved 16-bit samples
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 16) => reader
                .into_samples::<i16>()
                .collect::<Result<Vec<_>, _>>()?,
            (SampleFormat::Int, bits) if bits <= 32 => {
                let shift = bits.saturating_sub(16);
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| (v >> shift).clamp(i16::MIN as i32, i16::MAX as i32) as i16))
                    .collect::<Result<Vec<_>, _>>()?
            }
            (SampleFormat::Float, _) => reader
                .into_samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect::<Result<Vec<_>, _>>()?,
            (format, bits) => {
                return Err(MediaError::NotSupported(format!(
                    "{:?} WAV with {} bits per sample",
                    format, bits
                )))
            }
        };

        if samples.is_empty() {
            return Err(MediaError::NotReadable(format!(
                "{} contains no audio",
                path.display()
            )));
        }

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Interleaved samples covering `frame_ms` milliseconds (at least one frame)
    pub fn samples_per_frame(&self, frame_ms: u64) -> usize {
        let per_channel = (self.sample_rate as u64 * frame_ms / 1000).max(1) as usize;
        per_channel * self.channels as usize
    }
}
