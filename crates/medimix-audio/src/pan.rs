//! Stereo balance for narration clips.

use crate::buffer::{db_to_amplitude, AudioBuffer};
use crate::convert;
use crate::error::{AudioError, AudioResult};

/// Per-channel linear gains for a pan position.
///
/// Pan ranges from -1.0 (hard left) through 0.0 (centered) to 1.0 (hard
/// right). The favoured side is boosted by up to +3 dB while the other side
/// is attenuated by `2 - 2^|pan|`, reaching silence at the extremes.
pub fn pan_gains(pan: f64) -> (f64, f64) {
    let amount = pan.abs();
    let boost = db_to_amplitude(amount * 20.0 * 2.0_f64.log10() / 2.0);
    let reduce = (2.0 - 2.0_f64.powf(amount)).max(0.0);
    if pan < 0.0 {
        (boost, reduce)
    } else {
        (reduce, boost)
    }
}

/// Applies a stereo pan, upmixing mono input to stereo first.
///
/// # Errors
/// Returns a validation error if `pan` is outside `[-1, 1]`.
pub fn pan(buffer: &AudioBuffer, pan: f64) -> AudioResult<AudioBuffer> {
    validate_pan("pan", pan)?;
    let stereo = convert::to_channels(buffer, 2)?;
    let (left, right) = pan_gains(pan);
    Ok(stereo.apply_channel_gains(left, right))
}

/// Checks that a pan value lies in `[-1, 1]`.
pub fn validate_pan(name: &str, pan: f64) -> AudioResult<()> {
    if !pan.is_finite() || !(-1.0..=1.0).contains(&pan) {
        return Err(AudioError::invalid_param(
            name,
            format!("must be between -1 and 1, got {}", pan),
        ));
    }
    Ok(())
}
