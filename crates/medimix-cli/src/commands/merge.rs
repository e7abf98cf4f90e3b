//! Merge command implementation
//!
//! Joins narration clips into one track of an exact target duration.

use anyhow::Result;
use colored::Colorize;
use medimix_audio::rng::{self, component_rng};
use medimix_audio::{MergeConfiguration, SegmentMerger, WavCodec};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::settings::load_config;

/// Arguments of `medimix merge`.
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct MergeArgs {
    /// Clip to merge, in playback order (repeat for each clip)
    #[arg(short, long = "clip")]
    pub clips: Vec<PathBuf>,

    /// Target duration of clips plus gaps (seconds)
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Silence before the first clip (seconds)
    #[arg(long)]
    pub front: Option<f64>,

    /// Silence after the last gap (seconds)
    #[arg(long)]
    pub rear: Option<f64>,

    /// Pan of clips at even positions, -1 (left) to 1 (right)
    #[arg(long, allow_hyphen_values = true)]
    pub pan_even: Option<f64>,

    /// Pan of clips at odd positions, -1 (left) to 1 (right)
    #[arg(long, allow_hyphen_values = true)]
    pub pan_odd: Option<f64>,

    /// Output file (default: merged_output.wav)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Insert extra silence between the phrases of each clip first
    #[arg(long)]
    pub spread_out: bool,

    /// Nominal silence inserted between phrases (ms)
    #[arg(long)]
    pub silence_add_ms: Option<u64>,
}

impl MergeArgs {
    /// Overrides `config` with the values given on the command line.
    pub fn apply(&self, config: &mut MergeConfiguration) {
        if !self.clips.is_empty() {
            config.clips = self.clips.clone();
        }
        if let Some(d) = self.duration {
            config.timing.target_duration = d;
        }
        if let Some(front) = self.front {
            config.timing.front_buffer = front;
        }
        if let Some(rear) = self.rear {
            config.timing.rear_buffer = rear;
        }
        if let Some(pan) = self.pan_even {
            config.timing.pan_even = pan;
        }
        if let Some(pan) = self.pan_odd {
            config.timing.pan_odd = pan;
        }
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if self.spread_out {
            config.spread_out = true;
        }
        if let Some(ms) = self.silence_add_ms {
            config.spread.silence_add_ms = ms;
        }
    }
}

/// Run the merge command
///
/// # Arguments
/// * `args` - Command-line overrides
/// * `config_path` - Optional JSON configuration file
/// * `seed` - Seed for reproducible silence jitter
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(args: &MergeArgs, config_path: Option<&Path>, seed: Option<u32>) -> Result<ExitCode> {
    let mut config = load_config(config_path)?.merge;
    args.apply(&mut config);

    println!(
        "{} {} clips into {:.1}s",
        "Merging:".cyan().bold(),
        config.clips.len(),
        config.timing.target_duration
    );

    let merger = SegmentMerger::new(WavCodec, config);
    let mut rng = component_rng(seed, rng::MERGE);
    let output = merger.merge(&mut rng)?;

    println!("{} Wrote {}", "SUCCESS".green().bold(), output.display());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medimix_audio::{AudioBuffer, AudioCodec};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_overrides() {
        let args = MergeArgs {
            clips: vec![PathBuf::from("a.wav"), PathBuf::from("b.wav")],
            duration: Some(30.0),
            pan_odd: Some(-0.5),
            ..MergeArgs::default()
        };
        let mut config = MergeConfiguration::default();
        args.apply(&mut config);
        assert_eq!(config.clips.len(), 2);
        assert_eq!(config.timing.target_duration, 30.0);
        assert_eq!(config.timing.pan_odd, -0.5);
        assert_eq!(config.timing.front_buffer, 3.0);
        assert_eq!(config.output_file, PathBuf::from("merged_output.wav"));
    }

    #[test]
    fn test_run_merge() {
        let dir = tempfile::tempdir().unwrap();
        let clip = AudioBuffer::new(vec![500; 1000], 1, 1000, 2).unwrap();
        let clips: Vec<PathBuf> = (0..3)
            .map(|i| {
                let p = dir.path().join(format!("c{}.wav", i));
                WavCodec.encode(&clip, &p).unwrap();
                p
            })
            .collect();
        let output = dir.path().join("merged.wav");
        let args = MergeArgs {
            clips,
            duration: Some(6.0),
            front: Some(0.0),
            rear: Some(0.0),
            output: Some(output.clone()),
            ..MergeArgs::default()
        };
        assert_eq!(run(&args, None, None).unwrap(), ExitCode::SUCCESS);
        let merged = WavCodec.decode(&output).unwrap();
        assert_eq!(merged.frames(), 6000);
    }

    #[test]
    fn test_run_single_clip_fails() {
        let args = MergeArgs {
            clips: vec![PathBuf::from("only.wav")],
            duration: Some(6.0),
            ..MergeArgs::default()
        };
        let err = run(&args, None, None).unwrap_err();
        assert!(err.to_string().contains("at least two"));
    }
}
