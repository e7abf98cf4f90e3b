//! Linear fade-in and fade-out envelopes.

use crate::buffer::AudioBuffer;
use crate::error::{AudioError, AudioResult};

/// Ramps the start of `buffer` up from silence over `seconds`.
///
/// Zero seconds leaves the buffer unchanged. A fade longer than the buffer
/// is shortened to the buffer length.
pub fn fade_in(buffer: &AudioBuffer, seconds: f64) -> AudioResult<AudioBuffer> {
    let len = fade_frames(buffer, seconds, "fade_in")?;
    if len == 0 {
        return Ok(buffer.clone());
    }
    Ok(buffer.apply_frame_gains(0, len, |frame| frame as f64 / len as f64))
}

/// Ramps the end of `buffer` down towards silence over `seconds`.
///
/// Zero seconds leaves the buffer unchanged. A fade longer than the buffer
/// is shortened to the buffer length.
pub fn fade_out(buffer: &AudioBuffer, seconds: f64) -> AudioResult<AudioBuffer> {
    let len = fade_frames(buffer, seconds, "fade_out")?;
    if len == 0 {
        return Ok(buffer.clone());
    }
    let start = buffer.frames() - len;
    Ok(buffer.apply_frame_gains(start, buffer.frames(), |frame| {
        1.0 - (frame - start) as f64 / len as f64
    }))
}

fn fade_frames(buffer: &AudioBuffer, seconds: f64, name: &str) -> AudioResult<usize> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(AudioError::invalid_param(
            name,
            format!("fade time must be >= 0 seconds, got {}", seconds),
        ));
    }
    let frames = (seconds * buffer.sample_rate() as f64).round() as usize;
    Ok(frames.min(buffer.frames()))
}
