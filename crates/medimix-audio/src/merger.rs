//! Segment merging.
//!
//! Joins an ordered list of clips into one track of a target length. The
//! slack left by the clips is split into equal gaps, and the track is padded
//! with fixed silence at the front and rear. Clips alternate between two pan
//! positions.

use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buffer::AudioBuffer;
use crate::codec::AudioCodec;
use crate::convert;
use crate::error::{AudioError, AudioResult};
use crate::pan;
use crate::spread::{self, SpreadParams};

/// Default name of the merged file.
pub const DEFAULT_MERGE_OUTPUT: &str = "merged_output.wav";

/// Timing and panning of a merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeTiming {
    /// Length the clips and gaps are stretched to, in seconds.
    pub target_duration: f64,
    /// Silence before the first clip, in seconds.
    pub front_buffer: f64,
    /// Silence after the final gap, in seconds.
    pub rear_buffer: f64,
    /// Pan applied to clips at even positions (0, 2, ...).
    pub pan_even: f64,
    /// Pan applied to clips at odd positions.
    pub pan_odd: f64,
}

impl Default for MergeTiming {
    fn default() -> Self {
        Self {
            target_duration: 0.0,
            front_buffer: 3.0,
            rear_buffer: 3.0,
            pan_even: 0.0,
            pan_odd: 0.0,
        }
    }
}

impl MergeTiming {
    /// Checks durations and pan positions.
    pub fn validate(&self) -> AudioResult<()> {
        if !(self.target_duration.is_finite() && self.target_duration > 0.0) {
            return Err(AudioError::invalid_param(
                "target_duration",
                "duration must be greater than zero",
            ));
        }
        for (name, value) in [
            ("front_buffer", self.front_buffer),
            ("rear_buffer", self.rear_buffer),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AudioError::invalid_param(
                    name,
                    format!("must be >= 0 seconds, got {}", value),
                ));
            }
        }
        pan::validate_pan("pan_even", self.pan_even)?;
        pan::validate_pan("pan_odd", self.pan_odd)
    }

    fn pan_for(&self, index: usize) -> f64 {
        if index % 2 == 0 {
            self.pan_even
        } else {
            self.pan_odd
        }
    }
}

/// A merge job: inputs, timing and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentMergeSpec {
    /// Clips in playback order.
    pub clips: Vec<PathBuf>,
    #[serde(flatten)]
    pub timing: MergeTiming,
    /// Where the merged track is written.
    pub output_file: PathBuf,
    /// Run the spread pre-pass on every clip before merging.
    pub spread_out: bool,
    #[serde(flatten)]
    pub spread: SpreadParams,
}

impl Default for SegmentMergeSpec {
    fn default() -> Self {
        Self {
            clips: Vec::new(),
            timing: MergeTiming::default(),
            output_file: PathBuf::from(DEFAULT_MERGE_OUTPUT),
            spread_out: false,
            spread: SpreadParams::default(),
        }
    }
}

fn check_clip_count(count: usize) -> AudioResult<()> {
    match count {
        0 => Err(AudioError::invalid_param("clips", "no audio files provided")),
        1 => Err(AudioError::invalid_param(
            "clips",
            "at least two audio files are required",
        )),
        _ => Ok(()),
    }
}

/// Length of each of the `clip_count` gaps, in seconds.
pub fn gap_seconds(target_duration: f64, total_clip_seconds: f64, clip_count: usize) -> f64 {
    (target_duration - total_clip_seconds) / clip_count as f64
}

/// Merges decoded clips.
///
/// The layout is `front | clip0 | gap clip1 | ... | gap clipN-1 | gap | rear`,
/// so `clip_count` gaps are inserted in total. Clips are upmixed to stereo,
/// panned, and brought to the highest sample rate and width among them.
///
/// # Arguments
/// * `clips` - Decoded clips in playback order
/// * `timing` - Target duration, buffers and per-parity pan
///
/// # Returns
/// A stereo track of `target_duration + front_buffer + rear_buffer` seconds.
///
/// # Errors
/// Returns a validation error for fewer than two clips, invalid timing, or
/// clips that together run longer than `target_duration`.
pub fn merge_buffers(clips: &[AudioBuffer], timing: &MergeTiming) -> AudioResult<AudioBuffer> {
    check_clip_count(clips.len())?;
    timing.validate()?;

    let total: f64 = clips.iter().map(AudioBuffer::duration_seconds).sum();
    if total > timing.target_duration {
        return Err(AudioError::invalid_param(
            "target_duration",
            format!(
                "total duration of input files ({:.3}s) exceeds the target duration ({:.3}s)",
                total, timing.target_duration
            ),
        ));
    }

    let gap = gap_seconds(timing.target_duration, total, clips.len());
    debug!(
        "merging {} clips: {:.3}s of audio, {:.3}s gaps",
        clips.len(),
        total,
        gap
    );

    let rate = clips.iter().map(AudioBuffer::sample_rate).max().unwrap_or(44_100);
    let width = clips.iter().map(AudioBuffer::sample_width).max().unwrap_or(2);
    let panned = clips
        .iter()
        .enumerate()
        .map(|(i, clip)| {
            let clip = pan::pan(clip, timing.pan_for(i))?;
            convert::conform(&clip, rate, 2, width)
        })
        .collect::<AudioResult<Vec<_>>>()?;

    let silence = |seconds: f64| AudioBuffer::silent(seconds, rate, 2, width);
    let gap_buffer = silence(gap)?;

    let mut samples = silence(timing.front_buffer)?.into_samples();
    for (i, clip) in panned.iter().enumerate() {
        if i > 0 {
            samples.extend_from_slice(gap_buffer.samples());
        }
        samples.extend_from_slice(clip.samples());
    }
    samples.extend_from_slice(gap_buffer.samples());
    samples.extend_from_slice(silence(timing.rear_buffer)?.samples());

    AudioBuffer::new(samples, 2, rate, width)
}

/// Merges clip files with a codec.
pub struct SegmentMerger<C> {
    codec: C,
    spec: SegmentMergeSpec,
}

impl<C: AudioCodec> SegmentMerger<C> {
    pub fn new(codec: C, spec: SegmentMergeSpec) -> Self {
        Self { codec, spec }
    }

    pub fn spec(&self) -> &SegmentMergeSpec {
        &self.spec
    }

    /// Checks the job without decoding anything.
    ///
    /// Order: clip count, clip extensions, clip existence, then timing.
    pub fn validate(&self) -> AudioResult<()> {
        check_clip_count(self.spec.clips.len())?;
        if !self.spec.clips.iter().all(|p| self.codec.accepts(p)) {
            return Err(AudioError::invalid_param(
                "clips",
                format!(
                    "all input files must be in {} format",
                    self.codec.extension().to_uppercase()
                ),
            ));
        }
        if let Some(missing) = self.spec.clips.iter().find(|p| !p.exists()) {
            return Err(AudioError::not_found("input file", missing));
        }
        self.spec.timing.validate()
    }

    /// Runs the merge and writes the result to the configured output file.
    ///
    /// When spreading is enabled each clip file is rewritten in place first,
    /// with its untouched version kept beside it.
    pub fn merge<R: Rng>(&self, rng: &mut R) -> AudioResult<PathBuf> {
        self.validate()?;

        if self.spec.spread_out {
            for clip in &self.spec.clips {
                spread::spread_out_file(&self.codec, clip, &self.spec.spread, rng)?;
            }
        }

        let clips = self
            .spec
            .clips
            .iter()
            .map(|p| self.codec.decode(p))
            .collect::<AudioResult<Vec<_>>>()?;
        let merged = merge_buffers(&clips, &self.spec.timing)?;

        let output = &self.spec.output_file;
        ensure_parent(output)?;
        self.codec.encode(&merged, output)?;
        info!(
            "merged {} clips into {} ({:.2}s)",
            clips.len(),
            output.display(),
            merged.duration_seconds()
        );
        Ok(output.clone())
    }
}

pub(crate) fn ensure_parent(path: &Path) -> AudioResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clip(seconds: f64, rate: u32) -> AudioBuffer {
        let frames = (seconds * rate as f64).round() as usize;
        AudioBuffer::new(vec![1000; frames], 1, rate, 2).unwrap()
    }

    fn timing(target: f64) -> MergeTiming {
        MergeTiming {
            target_duration: target,
            front_buffer: 1.0,
            rear_buffer: 2.0,
            pan_even: 0.0,
            pan_odd: 0.0,
        }
    }

    #[test]
    fn test_layout_length() {
        let clips = vec![clip(1.0, 1000), clip(1.0, 1000), clip(1.0, 1000)];
        let merged = merge_buffers(&clips, &timing(6.0)).unwrap();
        // front 1 + 3 clips + 3 gaps of 1 s + rear 2
        assert_eq!(merged.frames(), 9000);
        assert_eq!(merged.channels(), 2);
    }

    #[test]
    fn test_gap_placement() {
        let clips = vec![clip(1.0, 1000), clip(1.0, 1000)];
        let merged = merge_buffers(&clips, &timing(4.0)).unwrap();
        let left = merged.channel(0);
        // front [0,1000) silent, clip0 [1000,2000), gap [2000,3000), clip1 [3000,4000)
        assert_eq!(left[999], 0);
        assert_ne!(left[1000], 0);
        assert_eq!(left[2500], 0);
        assert_ne!(left[3500], 0);
        assert!(left[4000..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_exact_fit_has_zero_gaps() {
        let clips = vec![clip(1.5, 1000), clip(0.5, 1000)];
        let merged = merge_buffers(&clips, &timing(2.0)).unwrap();
        assert_eq!(merged.frames(), 5000);
    }

    #[test]
    fn test_clips_longer_than_target() {
        let clips = vec![clip(2.0, 1000), clip(2.0, 1000)];
        let err = merge_buffers(&clips, &timing(3.0)).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("exceeds the target duration"));
    }

    #[test]
    fn test_clip_count_errors_are_distinct() {
        let none = merge_buffers(&[], &timing(3.0)).unwrap_err().to_string();
        let one = merge_buffers(&[clip(1.0, 1000)], &timing(3.0))
            .unwrap_err()
            .to_string();
        assert!(none.contains("no audio files provided"));
        assert!(one.contains("at least two audio files are required"));
    }

    #[test]
    fn test_invalid_timing() {
        let clips = vec![clip(1.0, 1000), clip(1.0, 1000)];

        let err = merge_buffers(&clips, &timing(0.0)).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        let mut t = timing(5.0);
        t.front_buffer = -1.0;
        assert!(merge_buffers(&clips, &t).unwrap_err().to_string().contains("front_buffer"));

        let mut t = timing(5.0);
        t.pan_odd = 1.5;
        assert!(merge_buffers(&clips, &t).unwrap_err().to_string().contains("pan_odd"));
    }

    #[test]
    fn test_alternating_pan() {
        let clips = vec![clip(1.0, 1000), clip(1.0, 1000)];
        let mut t = timing(2.0);
        t.front_buffer = 0.0;
        t.rear_buffer = 0.0;
        t.pan_even = -1.0;
        t.pan_odd = 1.0;
        let merged = merge_buffers(&clips, &t).unwrap();
        let (left, right) = (merged.channel(0), merged.channel(1));
        assert!(left[500] > 0 && right[500] == 0);
        assert!(left[1500] == 0 && right[1500] > 0);
    }

    #[test]
    fn test_mixed_rates_conform_to_highest() {
        let clips = vec![clip(1.0, 1000), clip(1.0, 2000)];
        let mut t = timing(2.0);
        t.front_buffer = 0.0;
        t.rear_buffer = 0.0;
        let merged = merge_buffers(&clips, &t).unwrap();
        assert_eq!(merged.sample_rate(), 2000);
        assert_eq!(merged.frames(), 4000);
    }

    #[test]
    fn test_gap_seconds() {
        assert_eq!(gap_seconds(10.0, 4.0, 3), 2.0);
        assert_eq!(gap_seconds(4.0, 4.0, 2), 0.0);
    }
}
