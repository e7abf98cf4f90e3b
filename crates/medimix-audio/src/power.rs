//! Power-ratio overlay of a primary (speech) and secondary (background) signal.
//!
//! The loudness of the background is set relative to the speech by matching
//! mean-squared power. The derived gain is expressed as `-10·log10(scale)` dB
//! and applied with the amplitude convention; this mix of power and amplitude
//! decibels is what sets the audible balance and is kept as-is.

use log::{debug, warn};

use crate::buffer::AudioBuffer;
use crate::convert;
use crate::error::{AudioError, AudioResult};

/// Headroom left below full scale by the final peak normalization.
pub const NORMALIZE_HEADROOM_DB: f64 = 0.1;

/// How much quieter the secondary signal is made relative to the primary.
///
/// Higher values make the secondary (ambient or binaural) signal quieter and
/// therefore the speech more prominent. The value must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryAttenuationRatio(f64);

impl SecondaryAttenuationRatio {
    /// Default ratio when mixing against binaural beats.
    pub const BINAURAL_DEFAULT: f64 = 450_000.0;
    /// Default ratio when mixing against an ambient track.
    pub const AMBIENT_DEFAULT: f64 = 7_500.0;

    /// Creates a ratio.
    ///
    /// # Errors
    /// Returns a validation error unless `value` is finite and positive.
    pub fn new(value: f64) -> AudioResult<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(AudioError::invalid_param(
                "power_ratio",
                format!("must be a positive number, got {}", value),
            ));
        }
        Ok(Self(value))
    }

    /// Default ratio for the binaural path.
    pub fn binaural_default() -> Self {
        Self(Self::BINAURAL_DEFAULT)
    }

    /// Default ratio for the ambient path.
    pub fn ambient_default() -> Self {
        Self(Self::AMBIENT_DEFAULT)
    }

    /// Resolves a configured ratio, falling back to `default` when it is
    /// unset or zero.
    ///
    /// # Errors
    /// Returns a validation error for negative or non-finite values.
    pub fn resolve(configured: Option<f64>, default: Self) -> AudioResult<Self> {
        match configured {
            None => Ok(default),
            Some(v) if v == 0.0 => Ok(default),
            Some(v) if v < 0.0 => Err(AudioError::invalid_param(
                "power_ratio",
                format!("must be positive, not {}", v),
            )),
            Some(v) => Self::new(v),
        }
    }

    /// Raw ratio value.
    pub fn value(self) -> f64 {
        self.0
    }
}

/// Mean-squared power averaged over channels.
///
/// Samples are reshaped into `(frames, channels)`; the mean of squares is
/// taken per channel and then averaged across channels.
///
/// # Errors
/// Returns a domain error for a buffer with no frames.
pub fn average_power(buffer: &AudioBuffer) -> AudioResult<f64> {
    let frames = buffer.frames();
    if frames == 0 {
        return Err(AudioError::domain(
            "average power of an empty buffer is undefined",
        ));
    }
    let ch = buffer.channels() as usize;
    let mut per_channel = vec![0.0_f64; ch];
    for frame in buffer.samples().chunks_exact(ch) {
        for (acc, &s) in per_channel.iter_mut().zip(frame) {
            let v = s as f64;
            *acc += v * v;
        }
    }
    let total: f64 = per_channel.iter().map(|sum| sum / frames as f64).sum();
    Ok(total / ch as f64)
}

/// Gain in dB applied to the secondary signal for a given power balance.
///
/// # Errors
/// Returns a domain error if `primary_power` is zero.
pub fn secondary_gain_db(
    primary_power: f64,
    secondary_power: f64,
    ratio: SecondaryAttenuationRatio,
) -> AudioResult<f64> {
    if primary_power == 0.0 {
        return Err(AudioError::domain(
            "primary signal has zero power; cannot derive a power ratio",
        ));
    }
    let scale = ((secondary_power * ratio.value()) / primary_power).sqrt();
    Ok(-10.0 * scale.log10())
}

/// Attenuates `secondary` against `primary`, overlays the two and peak
/// normalizes the sum.
///
/// Both inputs are brought to a shared rate, channel count and sample width
/// before either power is measured, so the balance does not depend on the
/// bit depth of the source files.
///
/// # Arguments
/// * `primary` - Speech signal, kept at its level
/// * `secondary` - Background signal to attenuate
/// * `ratio` - Target balance of primary power over secondary power
///
/// # Returns
/// The normalized mix, as long as the longer input, in the shared format.
///
/// # Errors
/// Returns a domain error if either buffer is empty or `primary` is silent.
pub fn overlay_with_power_ratio(
    primary: &AudioBuffer,
    secondary: &AudioBuffer,
    ratio: SecondaryAttenuationRatio,
) -> AudioResult<AudioBuffer> {
    let (primary, secondary) = convert::match_format(primary, secondary)?;
    let primary_power = average_power(&primary)?;
    let secondary_power = average_power(&secondary)?;
    if primary_power == 0.0 {
        return Err(AudioError::domain(
            "primary signal has zero power; cannot derive a power ratio",
        ));
    }

    let adjusted = if secondary_power == 0.0 {
        warn!("secondary signal is silent; overlaying without gain adjustment");
        secondary
    } else {
        let gain_db = secondary_gain_db(primary_power, secondary_power, ratio)?;
        debug!(
            "power overlay: primary={:.1} secondary={:.1} ratio={} gain={:.2} dB",
            primary_power,
            secondary_power,
            ratio.value(),
            gain_db
        );
        secondary.apply_gain_db(gain_db)
    };

    let combined = primary.overlay(&adjusted)?;
    Ok(combined.normalize(NORMALIZE_HEADROOM_DB))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tone(frames: usize, amplitude: f64, channels: u16) -> AudioBuffer {
        let samples = (0..frames)
            .flat_map(|i| {
                let v = (amplitude * (i as f64 * 0.05).sin()).round() as i32;
                std::iter::repeat(v).take(channels as usize)
            })
            .collect();
        AudioBuffer::new(samples, channels, 8000, 2).unwrap()
    }

    #[test]
    fn test_average_power_per_channel_mean() {
        let buf = AudioBuffer::new(vec![2, 4, 2, 4], 2, 8000, 2).unwrap();
        // left power 4, right power 16
        assert_eq!(average_power(&buf).unwrap(), 10.0);
    }

    #[test]
    fn test_average_power_empty_is_domain_error() {
        let buf = AudioBuffer::new(vec![], 2, 8000, 2).unwrap();
        assert!(average_power(&buf).unwrap_err().is_domain());
    }

    #[test]
    fn test_ratio_resolution() {
        let d = SecondaryAttenuationRatio::ambient_default();
        assert_eq!(SecondaryAttenuationRatio::resolve(None, d).unwrap(), d);
        assert_eq!(SecondaryAttenuationRatio::resolve(Some(0.0), d).unwrap(), d);
        assert_eq!(
            SecondaryAttenuationRatio::resolve(Some(100.0), d)
                .unwrap()
                .value(),
            100.0
        );
        assert!(SecondaryAttenuationRatio::resolve(Some(-1.0), d)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn test_defaults_are_distinct() {
        assert_eq!(
            SecondaryAttenuationRatio::binaural_default().value(),
            450_000.0
        );
        assert_eq!(SecondaryAttenuationRatio::ambient_default().value(), 7_500.0);
    }

    #[test]
    fn test_higher_ratio_means_quieter_secondary() {
        let low = secondary_gain_db(1.0, 1.0, SecondaryAttenuationRatio::new(100.0).unwrap())
            .unwrap();
        let high = secondary_gain_db(1.0, 1.0, SecondaryAttenuationRatio::new(10_000.0).unwrap())
            .unwrap();
        assert!(high < low);
        assert!((low - -10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_power_primary_is_domain_error() {
        let silent = AudioBuffer::silent(0.1, 8000, 2, 2).unwrap();
        let other = tone(800, 10000.0, 2);
        let err = overlay_with_power_ratio(
            &silent,
            &other,
            SecondaryAttenuationRatio::ambient_default(),
        )
        .unwrap_err();
        assert!(err.is_domain());
    }

    #[test]
    fn test_overlay_is_normalized_and_as_long_as_longer_input() {
        let speech = tone(800, 8000.0, 1);
        let background = tone(1200, 8000.0, 2);
        let out = overlay_with_power_ratio(
            &speech,
            &background,
            SecondaryAttenuationRatio::new(100.0).unwrap(),
        )
        .unwrap();
        assert_eq!(out.frames(), 1200);
        assert_eq!(out.channels(), 2);
        let expected_peak = 32768.0 * 10.0_f64.powf(-NORMALIZE_HEADROOM_DB / 20.0);
        assert!((out.peak() as f64 - expected_peak).abs() <= 1.0);
    }

    fn max_diff(a: &AudioBuffer, b: &AudioBuffer) -> i32 {
        assert_eq!(a.samples().len(), b.samples().len());
        a.samples()
            .iter()
            .zip(b.samples())
            .map(|(x, y)| (x - y).abs())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_balance_independent_of_primary_width() {
        let speech = tone(1600, 12000.0, 2);
        let background = AudioBuffer::new(
            (0..1600)
                .flat_map(|i| {
                    let v = (9000.0 * (i as f64 * 0.013).sin()).round() as i32;
                    [v, -v]
                })
                .collect(),
            2,
            8000,
            2,
        )
        .unwrap();
        let ratio = SecondaryAttenuationRatio::new(400.0).unwrap();

        let narrow = overlay_with_power_ratio(&speech, &background, ratio).unwrap();
        let wide_speech = convert::to_sample_width(&speech, 3).unwrap();
        let wide = overlay_with_power_ratio(&wide_speech, &background, ratio).unwrap();
        assert_eq!(wide.sample_width(), 3);

        let wide_as_narrow = convert::to_sample_width(&wide, 2).unwrap();
        assert!(max_diff(&narrow, &wide_as_narrow) <= 8);
    }

    #[test]
    fn test_balance_independent_of_secondary_width() {
        let speech = tone(1600, 12000.0, 1);
        let background = tone(1600, 4000.0, 1);
        let ratio = SecondaryAttenuationRatio::new(50.0).unwrap();

        let narrow = overlay_with_power_ratio(&speech, &background, ratio).unwrap();
        let wide_background = convert::to_sample_width(&background, 4).unwrap();
        let wide = overlay_with_power_ratio(&speech, &wide_background, ratio).unwrap();

        let wide_as_narrow = convert::to_sample_width(&wide, 2).unwrap();
        assert!(max_diff(&narrow, &wide_as_narrow) <= 8);
    }

    #[test]
    fn test_balance_holds_across_sample_rates() {
        let speech = tone(1600, 12000.0, 1);
        let background = tone(1600, 6000.0, 1);
        let ratio = SecondaryAttenuationRatio::new(10.0).unwrap();
        let same_rate = overlay_with_power_ratio(&speech, &background, ratio).unwrap();

        let upsampled = convert::resample(&background, 16000).unwrap();
        let mixed_rate = overlay_with_power_ratio(&speech, &upsampled, ratio).unwrap();
        assert_eq!(mixed_rate.sample_rate(), 16000);
        assert!((same_rate.dbfs() - mixed_rate.dbfs()).abs() < 0.2);
    }
}
