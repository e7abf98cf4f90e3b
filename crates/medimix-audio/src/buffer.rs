//! In-memory PCM audio buffer.
//!
//! An [`AudioBuffer`] holds interleaved integer samples together with the
//! format needed to interpret them. Buffers are values: every transformation
//! returns a new buffer and leaves its input untouched.

use crate::convert;
use crate::error::{AudioError, AudioResult};

/// Decoded interleaved integer PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved samples (frame-major: `L R L R ...` for stereo).
    samples: Vec<i32>,
    /// Number of channels (1 = mono, 2 = stereo).
    channels: u16,
    /// Sample rate in Hz.
    sample_rate: u32,
    /// Bytes per sample (1 to 4).
    sample_width: u16,
}

impl AudioBuffer {
    /// Creates a buffer, validating its format.
    ///
    /// # Errors
    /// Returns a validation error if the channel count is not 1 or 2, the
    /// sample width is not 1 to 4 bytes, the sample rate is zero, or the
    /// sample count is not a multiple of the channel count.
    pub fn new(
        samples: Vec<i32>,
        channels: u16,
        sample_rate: u32,
        sample_width: u16,
    ) -> AudioResult<Self> {
        if !(1..=2).contains(&channels) {
            return Err(AudioError::invalid_param(
                "channels",
                format!("must be 1 or 2, got {}", channels),
            ));
        }
        if !(1..=4).contains(&sample_width) {
            return Err(AudioError::invalid_param(
                "sample_width",
                format!("must be between 1 and 4 bytes, got {}", sample_width),
            ));
        }
        if sample_rate == 0 {
            return Err(AudioError::invalid_param(
                "sample_rate",
                "must be greater than 0",
            ));
        }
        if samples.len() % channels as usize != 0 {
            return Err(AudioError::invalid_param(
                "samples",
                format!(
                    "sample count {} is not a multiple of the channel count {}",
                    samples.len(),
                    channels
                ),
            ));
        }
        Ok(Self::from_parts(samples, channels, sample_rate, sample_width))
    }

    /// Builds a buffer from parts that are already known to be consistent.
    pub(crate) fn from_parts(
        samples: Vec<i32>,
        channels: u16,
        sample_rate: u32,
        sample_width: u16,
    ) -> Self {
        debug_assert!(samples.len() % channels as usize == 0);
        Self {
            samples,
            channels,
            sample_rate,
            sample_width,
        }
    }

    /// Creates a silent buffer lasting `seconds` (rounded to whole frames).
    pub fn silent(
        seconds: f64,
        sample_rate: u32,
        channels: u16,
        sample_width: u16,
    ) -> AudioResult<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(AudioError::invalid_param(
                "seconds",
                format!("silence duration must be >= 0, got {}", seconds),
            ));
        }
        let frames = (seconds * sample_rate as f64).round() as usize;
        Self::new(
            vec![0; frames * channels as usize],
            channels,
            sample_rate,
            sample_width,
        )
    }

    /// Creates a silent buffer with the same format as `self`.
    pub fn silent_like(&self, frames: usize) -> Self {
        Self::from_parts(
            vec![0; frames * self.channels as usize],
            self.channels,
            self.sample_rate,
            self.sample_width,
        )
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    /// Consumes the buffer, returning its interleaved samples.
    pub fn into_samples(self) -> Vec<i32> {
        self.samples
    }

    /// Number of channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bytes per sample.
    pub fn sample_width(&self) -> u16 {
        self.sample_width
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Returns true if the buffer holds no frames.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.duration_seconds() * 1000.0
    }

    /// Converts a duration in milliseconds to a frame count at this rate.
    pub fn ms_to_frames(&self, ms: f64) -> usize {
        (ms * self.sample_rate as f64 / 1000.0).round().max(0.0) as usize
    }

    /// Largest representable magnitude for the sample width (full scale).
    pub fn max_amplitude(&self) -> f64 {
        max_amplitude_for_width(self.sample_width)
    }

    /// Clips a value to the sample range of this buffer's width.
    pub(crate) fn clip(&self, value: f64) -> i32 {
        clip_to_width(value, self.sample_width)
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> i64 {
        self.samples
            .iter()
            .map(|&s| (s as i64).abs())
            .max()
            .unwrap_or(0)
    }

    /// Root mean square over all interleaved samples.
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_sq / self.samples.len() as f64).sqrt()
    }

    /// Loudness relative to full scale, in dB. Silence is negative infinity.
    pub fn dbfs(&self) -> f64 {
        let rms = self.rms();
        if rms == 0.0 {
            return f64::NEG_INFINITY;
        }
        20.0 * (rms / self.max_amplitude()).log10()
    }

    /// Returns frames `start..end` as a new buffer. Bounds are clamped.
    pub fn slice_frames(&self, start: usize, end: usize) -> Self {
        let frames = self.frames();
        let end = end.min(frames);
        let start = start.min(end);
        let ch = self.channels as usize;
        Self::from_parts(
            self.samples[start * ch..end * ch].to_vec(),
            self.channels,
            self.sample_rate,
            self.sample_width,
        )
    }

    /// Drops the first `frames` frames.
    pub fn skip_frames(&self, frames: usize) -> Self {
        self.slice_frames(frames, self.frames())
    }

    /// Returns the samples of one channel.
    pub fn channel(&self, index: usize) -> Vec<i32> {
        self.samples
            .iter()
            .skip(index)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Appends `other` after `self`.
    ///
    /// The two buffers are first brought to a common format (highest sample
    /// rate, channel count and width of the pair).
    pub fn append(&self, other: &AudioBuffer) -> AudioResult<AudioBuffer> {
        let (mut head, tail) = convert::match_format(self, other)?;
        head.samples.extend_from_slice(&tail.samples);
        Ok(head)
    }

    /// Adds `other` onto `self` sample by sample, starting at frame 0.
    ///
    /// The result is as long as the longer input; the shorter one is treated
    /// as zero-padded. Sums are clipped to the sample range.
    pub fn overlay(&self, other: &AudioBuffer) -> AudioResult<AudioBuffer> {
        let (base, top) = convert::match_format(self, other)?;
        let len = base.samples.len().max(top.samples.len());
        let samples = (0..len)
            .map(|i| {
                let a = base.samples.get(i).copied().unwrap_or(0) as f64;
                let b = top.samples.get(i).copied().unwrap_or(0) as f64;
                base.clip(a + b)
            })
            .collect();
        Ok(Self::from_parts(
            samples,
            base.channels,
            base.sample_rate,
            base.sample_width,
        ))
    }

    /// Scales every sample by a gain in decibels (amplitude convention).
    pub fn apply_gain_db(&self, gain_db: f64) -> AudioBuffer {
        self.apply_gain_linear(db_to_amplitude(gain_db))
    }

    /// Scales every sample by a linear factor, clipping the result.
    pub fn apply_gain_linear(&self, factor: f64) -> AudioBuffer {
        let samples = self
            .samples
            .iter()
            .map(|&s| self.clip(s as f64 * factor))
            .collect();
        Self::from_parts(samples, self.channels, self.sample_rate, self.sample_width)
    }

    /// Applies a separate linear gain to each channel of a stereo buffer.
    pub(crate) fn apply_channel_gains(&self, left: f64, right: f64) -> AudioBuffer {
        let samples = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let gain = if i % 2 == 0 { left } else { right };
                self.clip(s as f64 * gain)
            })
            .collect();
        Self::from_parts(samples, self.channels, self.sample_rate, self.sample_width)
    }

    /// Applies a per-frame gain produced by `gain_at(frame_index)`.
    pub(crate) fn apply_frame_gains<F>(&self, start: usize, end: usize, gain_at: F) -> AudioBuffer
    where
        F: Fn(usize) -> f64,
    {
        let ch = self.channels as usize;
        let mut samples = self.samples.clone();
        for frame in start..end.min(self.frames()) {
            let gain = gain_at(frame);
            for s in &mut samples[frame * ch..(frame + 1) * ch] {
                *s = clip_to_width(*s as f64 * gain, self.sample_width);
            }
        }
        Self::from_parts(samples, self.channels, self.sample_rate, self.sample_width)
    }

    /// Peak-normalizes so the loudest sample sits `headroom_db` below full scale.
    ///
    /// Silent buffers are returned unchanged.
    pub fn normalize(&self, headroom_db: f64) -> AudioBuffer {
        let peak = self.peak();
        if peak == 0 {
            return self.clone();
        }
        let target_peak = self.max_amplitude() * db_to_amplitude(-headroom_db);
        self.apply_gain_linear(target_peak / peak as f64)
    }
}

/// Converts a decibel gain to a linear amplitude factor.
pub fn db_to_amplitude(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Converts a linear amplitude ratio to decibels.
pub fn amplitude_to_db(ratio: f64) -> f64 {
    20.0 * ratio.log10()
}

/// Full-scale magnitude for a sample width in bytes.
pub(crate) fn max_amplitude_for_width(sample_width: u16) -> f64 {
    (1u64 << (8 * sample_width as u32 - 1)) as f64
}

/// Rounds and clips a value into the signed range of a sample width.
pub(crate) fn clip_to_width(value: f64, sample_width: u16) -> i32 {
    let max = max_amplitude_for_width(sample_width);
    value.round().clamp(-max, max - 1.0) as i32
}
