//! Ambient background overlay.
//!
//! A window as long as the speech is cut at a random offset from a longer
//! ambient recording, faded in and out, and mixed under the speech at a
//! controlled power ratio.

use std::path::Path;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buffer::AudioBuffer;
use crate::codec::AudioCodec;
use crate::convert;
use crate::error::{AudioError, AudioResult};
use crate::fade;
use crate::power::{self, SecondaryAttenuationRatio};

/// Parameters for cutting and shaping the ambient window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientParams {
    /// Milliseconds dropped from the start of the ambient track (intros,
    /// silence). Also read from the `chop_samples` key.
    #[serde(alias = "chop_samples")]
    pub chop_ms: u64,
    /// Fade-in applied to the window, in seconds.
    pub fade_in_seconds: f64,
    /// Fade-out applied to the window, in seconds.
    pub fade_out_seconds: f64,
}

impl Default for AmbientParams {
    fn default() -> Self {
        Self {
            chop_ms: 30_000,
            fade_in_seconds: 4.0,
            fade_out_seconds: 4.0,
        }
    }
}

impl AmbientParams {
    /// Checks the fade times independently.
    pub fn validate(&self) -> AudioResult<()> {
        if !self.fade_in_seconds.is_finite() || self.fade_in_seconds < 0.0 {
            return Err(AudioError::invalid_param(
                "fade_in_time",
                format!("must be >= 0, got {}", self.fade_in_seconds),
            ));
        }
        if !self.fade_out_seconds.is_finite() || self.fade_out_seconds < 0.0 {
            return Err(AudioError::invalid_param(
                "fade_out_time",
                format!("must be >= 0, got {}", self.fade_out_seconds),
            ));
        }
        Ok(())
    }
}

/// Cuts a faded window of the ambient track as long as `speech`.
///
/// The ambient track is first trimmed by `chop_ms` milliseconds, measured at
/// its own sample rate, and brought to the speech sample rate. The window offset is drawn uniformly from
/// `[0, ambient_frames - speech_frames]`.
///
/// # Errors
/// Returns a validation error if a fade time is negative or the trimmed
/// ambient track is shorter than the speech.
pub fn select_window<R: Rng>(
    speech: &AudioBuffer,
    ambient: &AudioBuffer,
    params: &AmbientParams,
    rng: &mut R,
) -> AudioResult<AudioBuffer> {
    params.validate()?;

    let chopped = ambient.skip_frames(ambient.ms_to_frames(params.chop_ms as f64));
    let chopped = convert::resample(&chopped, speech.sample_rate())?;

    let speech_frames = speech.frames();
    let ambient_frames = chopped.frames();
    if ambient_frames < speech_frames {
        return Err(AudioError::invalid_param(
            "ambient",
            format!(
                "ambient audio file is not long enough: {} frames after chopping, {} needed",
                ambient_frames, speech_frames
            ),
        ));
    }

    let max_start = ambient_frames - speech_frames;
    let start = rng.gen_range(0..=max_start);
    debug!("ambient window: start={} of max {}", start, max_start);

    let window = chopped.slice_frames(start, start + speech_frames);
    let window = fade::fade_in(&window, params.fade_in_seconds)?;
    fade::fade_out(&window, params.fade_out_seconds)
}

/// Mixes a random window of `ambient` under `speech`.
///
/// `power_ratio` defaults to [`SecondaryAttenuationRatio::AMBIENT_DEFAULT`]
/// when unset or zero.
///
/// # Errors
/// See [`select_window`] and [`power::overlay_with_power_ratio`].
pub fn overlay_ambient<R: Rng>(
    speech: &AudioBuffer,
    ambient: &AudioBuffer,
    params: &AmbientParams,
    power_ratio: Option<f64>,
    rng: &mut R,
) -> AudioResult<AudioBuffer> {
    let ratio = SecondaryAttenuationRatio::resolve(
        power_ratio,
        SecondaryAttenuationRatio::ambient_default(),
    )?;
    let window = select_window(speech, ambient, params, rng)?;
    power::overlay_with_power_ratio(speech, &window, ratio)
}

/// File-level variant of [`overlay_ambient`].
///
/// Both files are checked for existence before either is decoded.
///
/// # Errors
/// Returns a not-found error naming the missing file, otherwise as
/// [`overlay_ambient`].
pub fn overlay_ambient_files<C, R>(
    codec: &C,
    speech_file: &Path,
    ambient_file: &Path,
    params: &AmbientParams,
    power_ratio: Option<f64>,
    rng: &mut R,
) -> AudioResult<AudioBuffer>
where
    C: AudioCodec + ?Sized,
    R: Rng,
{
    if !speech_file.exists() {
        return Err(AudioError::not_found("spoken audio file", speech_file));
    }
    if !ambient_file.exists() {
        return Err(AudioError::not_found("ambient audio file", ambient_file));
    }
    let speech = codec.decode(speech_file)?;
    let ambient = codec.decode(ambient_file)?;
    overlay_ambient(&speech, &ambient, params, power_ratio, rng)
}
