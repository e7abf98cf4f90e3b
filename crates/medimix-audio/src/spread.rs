//! Spreading out spoken phrases.
//!
//! Speech is split on silence and re-joined with extra silence between the
//! phrases. Each inserted gap is `silence_add_ms` plus or minus a random
//! jitter of up to a third of that value.

use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buffer::AudioBuffer;
use crate::codec::AudioCodec;
use crate::error::{AudioError, AudioResult};
use crate::silence::{self, SilenceParams};

/// Settings for the spread pre-pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadParams {
    /// How phrases are found.
    #[serde(flatten)]
    pub silence: SilenceParams,
    /// Nominal silence inserted between phrases, in ms.
    pub silence_add_ms: u64,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            silence: SilenceParams::default(),
            silence_add_ms: 8000,
        }
    }
}

/// Outcome of spreading a file in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadReport {
    /// Where the untouched input was moved.
    pub original_path: PathBuf,
    /// Length of the input in ms.
    pub original_ms: f64,
    /// Length of the rewritten file in ms.
    pub spread_ms: f64,
}

/// Inserts jittered silence between the phrases of `buffer`.
///
/// Returns the input unchanged when no phrases are found.
pub fn spread_out_phrases<R: Rng>(
    buffer: &AudioBuffer,
    params: &SpreadParams,
    rng: &mut R,
) -> AudioResult<AudioBuffer> {
    let chunks = silence::split_on_silence(buffer, &params.silence)?;
    let Some((first, rest)) = chunks.split_first() else {
        debug!("no phrases found, leaving audio unchanged");
        return Ok(buffer.clone());
    };

    let deviation = params.silence_add_ms / 3;
    let mut out = first.clone();
    for chunk in rest {
        let jitter = rng.gen_range(0..=2 * deviation);
        let gap_ms = params.silence_add_ms - deviation + jitter;
        let gap = out.silent_like(out.ms_to_frames(gap_ms as f64));
        out = out.append(&gap)?.append(chunk)?;
    }
    debug!("spread {} phrases", chunks.len());
    Ok(out)
}

/// Path the untouched input is moved to: `<stem>_original.<ext>` beside it.
pub fn original_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_original.{}", stem, ext.to_string_lossy()),
        None => format!("{}_original", stem),
    };
    path.with_file_name(name)
}

/// Spreads out the phrases of the file at `path`, rewriting it in place.
///
/// The spread audio is staged in a temporary file next to `path`. Only once
/// it is fully written is the input moved to [`original_path`] and the staged
/// file moved into its place; a failed encode leaves `path` untouched.
///
/// # Errors
/// Returns a not-found error if `path` is missing, an I/O error if a file
/// cannot be staged or moved, or a codec error.
pub fn spread_out_file<C, R>(
    codec: &C,
    path: &Path,
    params: &SpreadParams,
    rng: &mut R,
) -> AudioResult<SpreadReport>
where
    C: AudioCodec + ?Sized,
    R: Rng,
{
    if !path.exists() {
        return Err(AudioError::not_found("audio file", path));
    }
    let audio = codec.decode(path)?;
    let spread = spread_out_phrases(&audio, params, rng)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staged = tempfile::Builder::new()
        .prefix(".spread-")
        .suffix(&format!(".{}", codec.extension()))
        .tempfile_in(dir)?;
    codec.encode(&spread, staged.path())?;

    let original = original_path(path);
    std::fs::rename(path, &original)?;
    if let Err(e) = staged.persist(path) {
        std::fs::rename(&original, path)?;
        return Err(e.error.into());
    }

    let report = SpreadReport {
        original_path: original,
        original_ms: audio.duration_ms(),
        spread_ms: spread.duration_ms(),
    };
    info!(
        "spread {}: {:.0} ms -> {:.0} ms",
        path.display(),
        report.original_ms,
        report.spread_ms
    );
    Ok(report)
}
