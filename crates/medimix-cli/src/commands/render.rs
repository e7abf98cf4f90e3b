//! Render command implementation
//!
//! Merges narration clips, passes them through the effects hook and mixes
//! the result in one run.

use anyhow::Result;
use colored::Colorize;
use medimix_audio::rng::{self, component_rng};
use medimix_audio::{Passthrough, Pipeline, WavCodec};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::BinauralArgs;
use crate::settings::load_config;

/// Arguments of `medimix render`.
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct RenderArgs {
    /// Clip to merge, in playback order (repeat for each clip)
    #[arg(short, long = "clip")]
    pub clips: Vec<PathBuf>,

    /// Target duration of clips plus gaps (seconds)
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Directory for intermediate and final files
    #[arg(short, long)]
    pub working_dir: PathBuf,

    /// Prefix of the intermediate files
    #[arg(short, long, default_value = "session")]
    pub name: String,

    /// Mix binaural beats instead of an ambient track
    #[arg(long)]
    pub binaural: bool,

    #[command(flatten)]
    pub beats: BinauralArgs,
}

/// Run the render command
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(args: &RenderArgs, config_path: Option<&Path>, seed: Option<u32>) -> Result<ExitCode> {
    let config = load_config(config_path)?;

    let mut merge = config.merge;
    if !args.clips.is_empty() {
        merge.clips = args.clips.clone();
    }
    if let Some(d) = args.duration {
        merge.timing.target_duration = d;
    }

    let mut mix = config.mix;
    mix.working_dir = args.working_dir.clone();
    if args.binaural {
        mix.binaural = true;
    }
    args.beats.apply(&mut mix.binaural_params);

    println!(
        "{} {} ({} clips)",
        "Rendering:".cyan().bold(),
        args.name,
        merge.clips.len()
    );

    let pipeline = Pipeline::new(WavCodec, Passthrough, merge, mix, args.name.as_str());
    let mut rng = component_rng(seed, rng::RENDER);
    let output = pipeline.render(&mut rng)?;

    println!("  merged:  {}", output.merged.display());
    println!("  effects: {}", output.effected.display());
    println!("{} Wrote {}", "SUCCESS".green().bold(), output.mixed.display());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medimix_audio::{AudioBuffer, AudioCodec};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_binaural() {
        let dir = tempfile::tempdir().unwrap();
        let clip = AudioBuffer::new(
            (0..2000).map(|i| ((i % 20) - 10) * 800).collect(),
            1,
            8000,
            2,
        )
        .unwrap();
        let clips: Vec<PathBuf> = (0..2)
            .map(|i| {
                let p = dir.path().join(format!("part{}.wav", i));
                WavCodec.encode(&clip, &p).unwrap();
                p
            })
            .collect();

        let args = RenderArgs {
            clips,
            duration: Some(1.0),
            working_dir: dir.path().join("work"),
            name: "evening".to_string(),
            binaural: true,
            beats: BinauralArgs {
                sample_rate: Some(8000),
                beat_fade_out: Some(0.5),
                ..BinauralArgs::default()
            },
        };
        assert_eq!(run(&args, None, Some(9)).unwrap(), ExitCode::SUCCESS);
        assert!(dir.path().join("work/evening_merged.wav").exists());
        assert!(dir.path().join("work/evening_merged_fx.wav").exists());
        assert!(dir.path().join("work/output.wav").exists());
    }
}
