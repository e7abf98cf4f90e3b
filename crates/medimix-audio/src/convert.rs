//! Format conversion between buffers: channel count, sample width and rate.

use crate::buffer::{clip_to_width, AudioBuffer};
use crate::error::{AudioError, AudioResult};

/// Converts a buffer to the requested channel count.
///
/// Mono is upmixed by duplicating each sample; stereo is downmixed by
/// averaging the two channels.
pub fn to_channels(buffer: &AudioBuffer, channels: u16) -> AudioResult<AudioBuffer> {
    if buffer.channels() == channels {
        return Ok(buffer.clone());
    }
    let samples = match (buffer.channels(), channels) {
        (1, 2) => buffer.samples().iter().flat_map(|&s| [s, s]).collect(),
        (2, 1) => buffer
            .samples()
            .chunks_exact(2)
            .map(|frame| ((frame[0] as i64 + frame[1] as i64) / 2) as i32)
            .collect(),
        (from, to) => {
            return Err(AudioError::invalid_param(
                "channels",
                format!("cannot convert {} channel(s) to {}", from, to),
            ))
        }
    };
    AudioBuffer::new(
        samples,
        channels,
        buffer.sample_rate(),
        buffer.sample_width(),
    )
}

/// Rescales samples to a different sample width in bytes.
pub fn to_sample_width(buffer: &AudioBuffer, sample_width: u16) -> AudioResult<AudioBuffer> {
    if buffer.sample_width() == sample_width {
        return Ok(buffer.clone());
    }
    if !(1..=4).contains(&sample_width) {
        return Err(AudioError::invalid_param(
            "sample_width",
            format!("must be between 1 and 4 bytes, got {}", sample_width),
        ));
    }
    let shift = 8 * (sample_width as i32 - buffer.sample_width() as i32);
    let factor = 2.0_f64.powi(shift);
    let samples = buffer
        .samples()
        .iter()
        .map(|&s| clip_to_width(s as f64 * factor, sample_width))
        .collect();
    AudioBuffer::new(
        samples,
        buffer.channels(),
        buffer.sample_rate(),
        sample_width,
    )
}

/// Resamples to `sample_rate` using linear interpolation between frames.
pub fn resample(buffer: &AudioBuffer, sample_rate: u32) -> AudioResult<AudioBuffer> {
    if sample_rate == 0 {
        return Err(AudioError::invalid_param(
            "sample_rate",
            "must be greater than 0",
        ));
    }
    if buffer.sample_rate() == sample_rate {
        return Ok(buffer.clone());
    }

    let ch = buffer.channels() as usize;
    let in_frames = buffer.frames();
    let ratio = buffer.sample_rate() as f64 / sample_rate as f64;
    let out_frames = (in_frames as f64 / ratio).round() as usize;
    let src = buffer.samples();

    let mut samples = Vec::with_capacity(out_frames * ch);
    for frame in 0..out_frames {
        let pos = frame as f64 * ratio;
        let i0 = (pos.floor() as usize).min(in_frames.saturating_sub(1));
        let i1 = (i0 + 1).min(in_frames.saturating_sub(1));
        let frac = pos - i0 as f64;
        for c in 0..ch {
            let a = src[i0 * ch + c] as f64;
            let b = src[i1 * ch + c] as f64;
            samples.push(clip_to_width(a + (b - a) * frac, buffer.sample_width()));
        }
    }

    AudioBuffer::new(
        samples,
        buffer.channels(),
        sample_rate,
        buffer.sample_width(),
    )
}

/// Converts a buffer to an explicit rate, channel count and width.
pub fn conform(
    buffer: &AudioBuffer,
    sample_rate: u32,
    channels: u16,
    sample_width: u16,
) -> AudioResult<AudioBuffer> {
    let out = to_sample_width(buffer, sample_width)?;
    let out = to_channels(&out, channels)?;
    resample(&out, sample_rate)
}

/// Brings two buffers to a shared format: the highest sample rate, channel
/// count and sample width of the pair.
pub fn match_format(a: &AudioBuffer, b: &AudioBuffer) -> AudioResult<(AudioBuffer, AudioBuffer)> {
    let rate = a.sample_rate().max(b.sample_rate());
    let channels = a.channels().max(b.channels());
    let width = a.sample_width().max(b.sample_width());
    Ok((
        conform(a, rate, channels, width)?,
        conform(b, rate, channels, width)?,
    ))
}
