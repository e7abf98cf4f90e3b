//! Binaural beat synthesis with a swept beat frequency.
//!
//! The left ear receives a pure tone at `base_freq`; the right ear receives
//! `base_freq + beat(t)`, where `beat(t)` is linearly interpolated from
//! `start_beat_freq` to `end_beat_freq`. Because the interpolated frequency is
//! multiplied by `t` inside the sine, the perceived beat can pass through zero
//! and reverse direction part-way through a wide sweep. A single analysis
//! pass detects this and clamps the sweep before the final render.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::buffer::AudioBuffer;
use crate::error::{AudioError, AudioResult};
use crate::fade;

/// Samples of the left-minus-right difference above this count as a pulse.
pub const PULSE_THRESHOLD: f64 = 1.0 - 1e-3;

/// Coefficient of variation (percent) at or above which the sweep is corrected.
pub const CV_THRESHOLD_PERCENT: f64 = 5.0;

/// Length of the analysis windows in seconds.
pub const ANALYSIS_WINDOW_SECONDS: f64 = 0.5;

/// Output amplitude for 16-bit PCM.
const PCM16_SCALE: f64 = 32767.0;

/// Parameters of a binaural beat track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinauralParams {
    /// Beat frequency at the start of the track in Hz.
    pub start_beat_freq: f64,
    /// Beat frequency at the end of the track in Hz.
    pub end_beat_freq: f64,
    /// Carrier frequency of the left channel in Hz.
    pub base_freq: f64,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Length of the fade-out at the tail, in seconds.
    pub fade_out_seconds: f64,
}

impl Default for BinauralParams {
    fn default() -> Self {
        Self {
            start_beat_freq: 5.0,
            end_beat_freq: 0.5,
            base_freq: 110.0,
            sample_rate: 44100,
            fade_out_seconds: 4.0,
        }
    }
}

impl BinauralParams {
    /// Checks the frequency, rate and fade parameters.
    pub fn validate(&self) -> AudioResult<()> {
        positive("start_beat_freq", self.start_beat_freq)?;
        positive("end_beat_freq", self.end_beat_freq)?;
        positive("base_freq", self.base_freq)?;
        if self.sample_rate == 0 {
            return Err(AudioError::invalid_param(
                "sample_rate",
                "must be greater than 0",
            ));
        }
        if !self.fade_out_seconds.is_finite() || self.fade_out_seconds < 0.0 {
            return Err(AudioError::invalid_param(
                "binaural_fade_out_duration",
                format!(
                    "must be greater than or equal to 0, got {}",
                    self.fade_out_seconds
                ),
            ));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> AudioResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AudioError::invalid_param(
            name,
            format!("must be greater than 0, got {}", value),
        ));
    }
    Ok(())
}

/// Result of the monotonic-direction check on the first render.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepAnalysis {
    /// Pulse counts per analysis window.
    pub window_counts: Vec<usize>,
    /// Coefficient of variation of the counts in percent, if defined.
    pub coefficient_of_variation: Option<f64>,
    /// Whether the sweep bounds were clamped.
    pub corrected: bool,
}

/// A synthesized binaural track along with the sweep that produced it.
#[derive(Debug, Clone)]
pub struct BinauralOutput {
    /// Stereo 16-bit buffer.
    pub buffer: AudioBuffer,
    /// Sweep bounds after correction (equal to the input if uncorrected).
    pub params: BinauralParams,
    /// Analysis of the uncorrected render.
    pub analysis: SweepAnalysis,
}

/// Synthesizes a binaural track of `duration` seconds.
///
/// Convenience wrapper around [`synthesize_with_correction`] returning only
/// the buffer.
pub fn generate_binaural_beats(params: &BinauralParams, duration: f64) -> AudioResult<AudioBuffer> {
    synthesize_with_correction(params, duration).map(|out| out.buffer)
}

/// Synthesizes a binaural track and applies at most one sweep correction.
///
/// The returned buffer holds `round(sample_rate * duration)` stereo frames.
/// The input parameters are not modified; corrected bounds are returned in
/// [`BinauralOutput::params`].
///
/// # Arguments
/// * `params` - Beat sweep, carrier, fade-out and sample rate
/// * `duration` - Track length in seconds
///
/// # Returns
/// The stereo buffer with the sweep analysis and the bounds actually used.
///
/// # Errors
/// Returns a validation error naming the offending parameter when a
/// frequency is not positive, the fade-out is negative or the duration is not
/// positive.
pub fn synthesize_with_correction(
    params: &BinauralParams,
    duration: f64,
) -> AudioResult<BinauralOutput> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(AudioError::invalid_param(
            "duration",
            format!("binaural duration must be greater than 0, got {}", duration),
        ));
    }
    params.validate()?;

    let num_samples = (params.sample_rate as f64 * duration).round() as usize;
    if num_samples == 0 {
        return Err(AudioError::invalid_param(
            "duration",
            format!(
                "{} seconds is shorter than one sample at {} Hz",
                duration, params.sample_rate
            ),
        ));
    }

    let t = time_vector(num_samples, duration);
    let window = analysis_window(params.sample_rate);

    let beat = linspace(params.start_beat_freq, params.end_beat_freq, num_samples);
    let (left, right) = render_tones(&t, &beat, params.base_freq);
    let diff: Vec<f64> = left.iter().zip(&right).map(|(l, r)| l - r).collect();

    let window_counts = pulse_counts(&diff, window);
    let cv = coefficient_of_variation(&window_counts);
    debug!("binaural sweep analysis: cv={:?} windows={}", cv, window_counts.len());

    let corrected_params = match cv {
        Some(cv) if cv >= CV_THRESHOLD_PERCENT => {
            correct_sweep(params, &window_counts, &beat, window)
        }
        _ => None,
    };
    let analysis = SweepAnalysis {
        window_counts,
        coefficient_of_variation: cv,
        corrected: corrected_params.is_some(),
    };
    let final_params = corrected_params.unwrap_or(*params);
    if analysis.corrected {
        info!(
            "binaural sweep corrected: {} -> {} Hz became {} -> {} Hz",
            params.start_beat_freq,
            params.end_beat_freq,
            final_params.start_beat_freq,
            final_params.end_beat_freq
        );
    }

    let beat = linspace(
        final_params.start_beat_freq,
        final_params.end_beat_freq,
        num_samples,
    );
    let (left, right) = render_tones(&t, &beat, final_params.base_freq);

    let samples = left
        .iter()
        .zip(&right)
        .flat_map(|(&l, &r)| [(l * PCM16_SCALE) as i32, (r * PCM16_SCALE) as i32])
        .collect();
    let buffer = AudioBuffer::new(samples, 2, final_params.sample_rate, 2)?;
    let buffer = fade::fade_out(&buffer, final_params.fade_out_seconds)?;

    Ok(BinauralOutput {
        buffer,
        params: final_params,
        analysis,
    })
}

/// Clamps the sweep at the window with the fewest pulses.
///
/// The beat frequency at the start of that window is rounded away from the
/// crossing: up and used as the new end for a downward sweep, down and used
/// as the new start for an upward sweep.
pub fn correct_sweep(
    params: &BinauralParams,
    window_counts: &[usize],
    beat: &[f64],
    window: usize,
) -> Option<BinauralParams> {
    let (min_idx, _) = window_counts
        .iter()
        .enumerate()
        .min_by_key(|&(i, &count)| (count, i))?;
    let sample_idx = min_idx * window;
    let est_beat = *beat.get(sample_idx)?;
    debug!(
        "sweep crossing near {:.2}s at {:.3} Hz",
        sample_idx as f64 / params.sample_rate as f64,
        est_beat
    );

    let mut corrected = *params;
    if params.start_beat_freq > params.end_beat_freq {
        corrected.end_beat_freq = est_beat.ceil();
    } else {
        corrected.start_beat_freq = est_beat.floor();
    }
    Some(corrected)
}

/// Counts, per consecutive window, the samples above [`PULSE_THRESHOLD`].
///
/// The final window may be shorter than `window`.
pub fn pulse_counts(diff: &[f64], window: usize) -> Vec<usize> {
    diff.chunks(window.max(1))
        .map(|chunk| chunk.iter().filter(|&&d| d > PULSE_THRESHOLD).count())
        .collect()
}

/// Population coefficient of variation in percent (`100 * std / mean`).
///
/// Returns `None` for an empty series or one whose mean is zero.
pub fn coefficient_of_variation(counts: &[usize]) -> Option<f64> {
    if counts.is_empty() {
        return None;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n;
    if mean == 0.0 {
        return None;
    }
    let variance = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    Some(100.0 * variance.sqrt() / mean)
}

fn analysis_window(sample_rate: u32) -> usize {
    ((sample_rate as f64 * ANALYSIS_WINDOW_SECONDS) as usize).max(1)
}

/// `n` evenly spaced points over `[0, duration)`.
fn time_vector(n: usize, duration: f64) -> Vec<f64> {
    let step = duration / n as f64;
    (0..n).map(|i| i as f64 * step).collect()
}

/// `n` evenly spaced points from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}

fn render_tones(t: &[f64], beat: &[f64], base_freq: f64) -> (Vec<f64>, Vec<f64>) {
    use std::f64::consts::TAU;

    let left = t.iter().map(|&t| (TAU * base_freq * t).sin()).collect();
    let right = t
        .iter()
        .zip(beat)
        .map(|(&t, &b)| (TAU * (base_freq + b) * t).sin())
        .collect();
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(start: f64, end: f64) -> BinauralParams {
        BinauralParams {
            start_beat_freq: start,
            end_beat_freq: end,
            base_freq: 110.0,
            sample_rate: 8000,
            fade_out_seconds: 1.0,
        }
    }

    #[test]
    fn test_sample_count_is_stereo_frames() {
        let buf = generate_binaural_beats(&params(4.0, 4.0), 1.25).unwrap();
        assert_eq!(buf.channels(), 2);
        assert_eq!(buf.sample_width(), 2);
        assert_eq!(buf.samples().len(), 10_000 * 2);
    }

    #[test]
    fn test_fade_out_peaks_decrease() {
        let p = params(4.0, 4.0);
        let buf = generate_binaural_beats(&p, 3.0).unwrap();
        let left = buf.channel(0);
        let fade_start = left.len() - 8000;
        let peaks: Vec<i32> = left[fade_start..]
            .chunks(800)
            .map(|w| w.iter().map(|s| s.abs()).max().unwrap_or(0))
            .collect();
        assert_eq!(peaks.len(), 10);
        for pair in peaks.windows(2) {
            assert!(pair[1] < pair[0], "peaks not decreasing: {:?}", peaks);
        }
    }

    #[test]
    fn test_steady_beat_is_not_corrected() {
        let p = params(4.0, 4.0);
        let out = synthesize_with_correction(&p, 10.0).unwrap();
        assert!(!out.analysis.corrected);
        assert_eq!(out.params, p);
        assert_eq!(out.analysis.window_counts.len(), 20);
        assert!(out.analysis.coefficient_of_variation.unwrap() < CV_THRESHOLD_PERCENT);
    }

    #[test]
    fn test_synthesis_is_pure() {
        let p = params(5.0, 0.5);
        let a = synthesize_with_correction(&p, 6.0).unwrap();
        let b = synthesize_with_correction(&p, 6.0).unwrap();
        assert_eq!(a.buffer, b.buffer);
        assert_eq!(a.params, b.params);
        assert_eq!(p, params(5.0, 0.5));
    }

    #[test]
    fn test_wide_downward_sweep_is_clamped() {
        // The instantaneous beat of a 5 -> 0.5 Hz sweep crosses zero about
        // 9 seconds into a 20 second track.
        let p = params(5.0, 0.5);
        let out = synthesize_with_correction(&p, 20.0).unwrap();
        assert!(out.analysis.corrected);
        assert!(out.analysis.coefficient_of_variation.unwrap() >= CV_THRESHOLD_PERCENT);
        assert_eq!(out.params.start_beat_freq, 5.0);
        assert_eq!(out.params.end_beat_freq, 3.0);
        assert_eq!(out.buffer.frames(), 160_000);
    }

    #[test]
    fn test_correct_downward_sweep_sets_end_to_ceiling() {
        let p = params(5.0, 0.5);
        let beat = linspace(5.0, 0.5, 10);
        let counts = [9, 9, 9, 9, 2, 9, 9, 9, 9, 9];
        let corrected = correct_sweep(&p, &counts, &beat, 1).unwrap();
        // beat[4] = 3.0
        assert_eq!(corrected.start_beat_freq, 5.0);
        assert_eq!(corrected.end_beat_freq, 3.0);

        let counts = [9, 9, 9, 1, 9, 9, 9, 9, 9, 9];
        let corrected = correct_sweep(&p, &counts, &beat, 1).unwrap();
        // beat[3] = 3.5
        assert_eq!(corrected.end_beat_freq, 4.0);
    }

    #[test]
    fn test_correct_upward_sweep_sets_start_to_floor() {
        let p = params(1.0, 10.0);
        let beat = linspace(1.0, 10.0, 7);
        let counts = [5, 5, 1, 5];
        let corrected = correct_sweep(&p, &counts, &beat, 2).unwrap();
        // window 2 starts at sample 4, beat[4] = 7.0
        assert_eq!(corrected.start_beat_freq, 7.0);
        assert_eq!(corrected.end_beat_freq, 10.0);
    }

    #[test]
    fn test_correct_picks_first_global_minimum() {
        let p = params(8.0, 1.0);
        let beat = linspace(8.0, 1.0, 8);
        let corrected = correct_sweep(&p, &[3, 1, 4, 1], &beat, 2).unwrap();
        // window 1 starts at sample 2, beat[2] = 6.0
        assert_eq!(corrected.end_beat_freq, 6.0);
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[]), None);
        assert_eq!(coefficient_of_variation(&[0, 0, 0]), None);
        assert_eq!(coefficient_of_variation(&[4, 4, 4]), Some(0.0));
        // mean 2, population std 1
        let cv = coefficient_of_variation(&[1, 3]).unwrap();
        assert!((cv - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_pulse_counts_partial_window() {
        let diff = [1.0, 0.5, 1.5, 1.2, 0.9995];
        assert_eq!(pulse_counts(&diff, 2), vec![1, 2, 1]);
    }

    #[test]
    fn test_linspace_endpoints() {
        let v = linspace(5.0, 0.5, 10);
        assert_eq!(v.len(), 10);
        assert_eq!(v[0], 5.0);
        assert!((v[9] - 0.5).abs() < 1e-12);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    }

    #[test]
    fn test_validation_names_parameter() {
        let err = generate_binaural_beats(&params(-1.0, 1.0), 1.0).unwrap_err();
        assert!(err.to_string().contains("start_beat_freq"));

        let err = generate_binaural_beats(&params(1.0, 0.0), 1.0).unwrap_err();
        assert!(err.to_string().contains("end_beat_freq"));

        let mut p = params(1.0, 2.0);
        p.base_freq = 0.0;
        let err = generate_binaural_beats(&p, 1.0).unwrap_err();
        assert!(err.to_string().contains("base_freq"));

        let mut p = params(1.0, 2.0);
        p.fade_out_seconds = -1.0;
        let err = generate_binaural_beats(&p, 1.0).unwrap_err();
        assert!(err.to_string().contains("binaural_fade_out_duration"));

        let err = generate_binaural_beats(&params(1.0, 2.0), 0.0).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("duration"));
    }
}
