//! Silence detection and splitting on silence.
//!
//! Positions are expressed in milliseconds. A window of `min_silence_len_ms`
//! slides over the audio in `seek_step_ms` steps; windows whose RMS is at or
//! below `silence_thresh_db` (relative to full scale) are silent.

use serde::{Deserialize, Serialize};

use crate::buffer::{db_to_amplitude, AudioBuffer};
use crate::error::{AudioError, AudioResult};

/// Silence detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceParams {
    /// Minimum length of a silent stretch in ms.
    pub min_silence_len_ms: u64,
    /// Level in dBFS at or below which audio counts as silent.
    pub silence_thresh_db: f64,
    /// Silence kept on either side of each non-silent chunk, in ms.
    pub keep_silence_ms: u64,
    /// Step between analysis windows in ms.
    pub seek_step_ms: u64,
}

impl Default for SilenceParams {
    fn default() -> Self {
        Self {
            min_silence_len_ms: 800,
            silence_thresh_db: -50.0,
            keep_silence_ms: 100,
            seek_step_ms: 1,
        }
    }
}

impl SilenceParams {
    /// Checks window lengths and threshold.
    pub fn validate(&self) -> AudioResult<()> {
        if self.min_silence_len_ms == 0 {
            return Err(AudioError::invalid_param(
                "min_silence_len",
                "must be greater than 0 ms",
            ));
        }
        if self.seek_step_ms == 0 {
            return Err(AudioError::invalid_param(
                "seek_step",
                "must be greater than 0 ms",
            ));
        }
        if !self.silence_thresh_db.is_finite() {
            return Err(AudioError::invalid_param(
                "silence_thresh",
                format!("must be a finite dBFS value, got {}", self.silence_thresh_db),
            ));
        }
        Ok(())
    }
}

/// A `[start, end)` range in milliseconds.
pub type MsRange = (u64, u64);

/// Running sums of squared samples per frame, for O(1) window RMS.
struct EnergyIndex {
    prefix: Vec<f64>,
    channels: f64,
    sample_rate: f64,
}

impl EnergyIndex {
    fn new(buffer: &AudioBuffer) -> Self {
        let ch = buffer.channels() as usize;
        let mut prefix = Vec::with_capacity(buffer.frames() + 1);
        prefix.push(0.0);
        let mut acc = 0.0;
        for frame in buffer.samples().chunks_exact(ch) {
            acc += frame.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>();
            prefix.push(acc);
        }
        Self {
            prefix,
            channels: ch as f64,
            sample_rate: buffer.sample_rate() as f64,
        }
    }

    fn frame_at(&self, ms: u64) -> usize {
        let frame = (ms as f64 * self.sample_rate / 1000.0) as usize;
        frame.min(self.prefix.len() - 1)
    }

    fn rms(&self, start_ms: u64, end_ms: u64) -> f64 {
        let a = self.frame_at(start_ms);
        let b = self.frame_at(end_ms);
        if b <= a {
            return 0.0;
        }
        let count = (b - a) as f64 * self.channels;
        ((self.prefix[b] - self.prefix[a]) / count).sqrt()
    }
}

/// Length of a buffer in whole milliseconds.
pub fn length_ms(buffer: &AudioBuffer) -> u64 {
    buffer.duration_ms().round() as u64
}

/// Finds silent stretches at least `min_silence_len_ms` long.
pub fn detect_silence(
    buffer: &AudioBuffer,
    params: &SilenceParams,
) -> AudioResult<Vec<MsRange>> {
    params.validate()?;
    let seg_len = length_ms(buffer);
    let min_len = params.min_silence_len_ms;
    if seg_len < min_len {
        return Ok(Vec::new());
    }

    let threshold = db_to_amplitude(params.silence_thresh_db) * buffer.max_amplitude();
    let index = EnergyIndex::new(buffer);
    let step = params.seek_step_ms;
    let last_start = seg_len - min_len;

    let mut starts: Vec<u64> = (0..=last_start).step_by(step as usize).collect();
    if last_start % step != 0 {
        starts.push(last_start);
    }
    let silent_starts: Vec<u64> = starts
        .into_iter()
        .filter(|&i| index.rms(i, i + min_len) <= threshold)
        .collect();

    let Some((&first, rest)) = silent_starts.split_first() else {
        return Ok(Vec::new());
    };

    let mut ranges = Vec::new();
    let mut range_start = first;
    let mut prev = first;
    for &start in rest {
        let continuous = start == prev + step;
        let has_gap = start > prev + min_len;
        if !continuous && has_gap {
            ranges.push((range_start, prev + min_len));
            range_start = start;
        }
        prev = start;
    }
    ranges.push((range_start, prev + min_len));
    Ok(ranges)
}

/// Complement of [`detect_silence`]: the non-silent stretches.
pub fn detect_nonsilent(
    buffer: &AudioBuffer,
    params: &SilenceParams,
) -> AudioResult<Vec<MsRange>> {
    let silent = detect_silence(buffer, params)?;
    let seg_len = length_ms(buffer);
    if silent.is_empty() {
        return Ok(vec![(0, seg_len)]);
    }
    if silent[0] == (0, seg_len) {
        return Ok(Vec::new());
    }

    let mut ranges = Vec::new();
    let mut prev_end = 0;
    for &(start, end) in &silent {
        ranges.push((prev_end, start));
        prev_end = end;
    }
    if prev_end != seg_len {
        ranges.push((prev_end, seg_len));
    }
    if ranges.first() == Some(&(0, 0)) {
        ranges.remove(0);
    }
    Ok(ranges)
}

/// Splits audio into its non-silent chunks.
///
/// Each chunk keeps up to `keep_silence_ms` of surrounding audio on both
/// sides; where two padded chunks would overlap, the boundary is placed
/// halfway between them.
pub fn split_on_silence(
    buffer: &AudioBuffer,
    params: &SilenceParams,
) -> AudioResult<Vec<AudioBuffer>> {
    let keep = params.keep_silence_ms as i64;
    let mut ranges: Vec<(i64, i64)> = detect_nonsilent(buffer, params)?
        .into_iter()
        .map(|(start, end)| (start as i64 - keep, end as i64 + keep))
        .collect();

    for i in 1..ranges.len() {
        let last_end = ranges[i - 1].1;
        let next_start = ranges[i].0;
        if next_start < last_end {
            let mid = (last_end + next_start).div_euclid(2);
            ranges[i - 1].1 = mid;
            ranges[i].0 = mid;
        }
    }

    let seg_len = length_ms(buffer) as i64;
    Ok(ranges
        .into_iter()
        .map(|(start, end)| {
            let start = start.max(0) as f64;
            let end = end.min(seg_len) as f64;
            buffer.slice_frames(buffer.ms_to_frames(start), buffer.ms_to_frames(end))
        })
        .collect())
}
