//! Container encode/decode at the file boundary.
//!
//! The mixing and merging core works on decoded [`AudioBuffer`]s only. A
//! codec turns files into buffers and back, and names the file extension the
//! mixer and merger accept.

use std::path::Path;

use crate::buffer::{clip_to_width, AudioBuffer};
use crate::error::{AudioError, AudioResult};

/// Encodes and decodes one container format.
pub trait AudioCodec {
    /// File extension handled by this codec, without the dot.
    fn extension(&self) -> &str;

    /// Returns true if `path` carries this codec's extension.
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()))
    }

    /// Decodes a file into a buffer.
    fn decode(&self, path: &Path) -> AudioResult<AudioBuffer>;

    /// Encodes a buffer into a file, replacing any existing file.
    fn encode(&self, buffer: &AudioBuffer, path: &Path) -> AudioResult<()>;
}

/// RIFF/WAVE PCM codec.
///
/// Decodes 8, 16, 24 and 32-bit integer PCM and 32-bit float PCM (converted
/// to 16-bit integers). Encodes integer PCM at the buffer's sample width.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl AudioCodec for WavCodec {
    fn extension(&self) -> &str {
        "wav"
    }

    fn decode(&self, path: &Path) -> AudioResult<AudioBuffer> {
        if !path.exists() {
            return Err(AudioError::not_found("audio file", path));
        }
        let mut reader =
            hound::WavReader::open(path).map_err(|e| AudioError::codec(path, e.to_string()))?;
        let spec = reader.spec();

        let (samples, width): (Vec<i32>, u16) = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 8) => (
                collect_samples(reader.samples::<i8>(), path)?,
                1,
            ),
            (hound::SampleFormat::Int, 16) => (
                collect_samples(reader.samples::<i16>(), path)?,
                2,
            ),
            (hound::SampleFormat::Int, bits @ (24 | 32)) => (
                collect_samples(reader.samples::<i32>(), path)?,
                bits / 8,
            ),
            (hound::SampleFormat::Float, 32) => {
                let floats = reader
                    .samples::<f32>()
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|e| AudioError::codec(path, e.to_string()))?;
                let samples = floats
                    .iter()
                    .map(|&f| clip_to_width(f as f64 * 32768.0, 2))
                    .collect();
                (samples, 2)
            }
            (format, bits) => {
                return Err(AudioError::codec(
                    path,
                    format!("unsupported WAV format {:?} with {} bits", format, bits),
                ))
            }
        };

        AudioBuffer::new(samples, spec.channels, spec.sample_rate, width)
            .map_err(|e| AudioError::codec(path, e.to_string()))
    }

    fn encode(&self, buffer: &AudioBuffer, path: &Path) -> AudioResult<()> {
        let spec = hound::WavSpec {
            channels: buffer.channels(),
            sample_rate: buffer.sample_rate(),
            bits_per_sample: buffer.sample_width() * 8,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .map_err(|e| AudioError::codec(path, e.to_string()))?;

        let result = match buffer.sample_width() {
            1 => buffer
                .samples()
                .iter()
                .try_for_each(|&s| writer.write_sample(s as i8)),
            2 => buffer
                .samples()
                .iter()
                .try_for_each(|&s| writer.write_sample(s as i16)),
            _ => buffer
                .samples()
                .iter()
                .try_for_each(|&s| writer.write_sample(s)),
        };
        result.map_err(|e| AudioError::codec(path, e.to_string()))?;
        writer
            .finalize()
            .map_err(|e| AudioError::codec(path, e.to_string()))
    }
}

fn collect_samples<S, I>(samples: I, path: &Path) -> AudioResult<Vec<i32>>
where
    S: Into<i32>,
    I: Iterator<Item = Result<S, hound::Error>>,
{
    samples
        .map(|s| s.map(Into::into))
        .collect::<Result<Vec<i32>, _>>()
        .map_err(|e| AudioError::codec(path, e.to_string()))
}
