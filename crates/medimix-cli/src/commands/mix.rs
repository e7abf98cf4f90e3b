//! Mix command implementation
//!
//! Mixes a speech file with binaural beats or a random ambient track.

use anyhow::Result;
use colored::Colorize;
use medimix_audio::rng::{self, component_rng};
use medimix_audio::{AudioMixer, MixConfiguration, WavCodec};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::BinauralArgs;
use crate::settings::load_config;

/// Arguments of `medimix mix`.
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct MixArgs {
    /// Speech file to mix (WAV)
    #[arg(short, long)]
    pub speech: Option<PathBuf>,

    /// Mix binaural beats instead of an ambient track
    #[arg(long)]
    pub binaural: bool,

    /// Directory the mixed file is written to
    #[arg(short, long)]
    pub working_dir: Option<PathBuf>,

    /// Output file name inside the working directory (default: output.wav)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ambient library directory, relative to the asset root
    #[arg(long)]
    pub sounds_dir: Option<PathBuf>,

    /// Base directory of the ambient library (default: executable directory)
    #[arg(long)]
    pub asset_root: Option<PathBuf>,

    /// Speech power over companion power; higher means a quieter companion
    #[arg(long)]
    pub power_ratio: Option<f64>,

    /// Milliseconds dropped from the start of the ambient track
    #[arg(long)]
    pub chop_ms: Option<u64>,

    /// Ambient fade-in (seconds)
    #[arg(long)]
    pub fade_in: Option<f64>,

    /// Ambient fade-out (seconds)
    #[arg(long)]
    pub fade_out: Option<f64>,

    #[command(flatten)]
    pub beats: BinauralArgs,
}

impl MixArgs {
    /// Overrides `config` with the values given on the command line.
    pub fn apply(&self, config: &mut MixConfiguration) {
        if let Some(speech) = &self.speech {
            config.speech_file = speech.clone();
        }
        if self.binaural {
            config.binaural = true;
        }
        if let Some(dir) = &self.working_dir {
            config.working_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(dir) = &self.sounds_dir {
            config.sounds_dir = dir.clone();
        }
        if let Some(root) = &self.asset_root {
            config.asset_root = Some(root.clone());
        }
        if let Some(ratio) = self.power_ratio {
            config.power_ratio = Some(ratio);
        }
        if let Some(chop) = self.chop_ms {
            config.ambient.chop_ms = chop;
        }
        if let Some(fade) = self.fade_in {
            config.ambient.fade_in_seconds = fade;
        }
        if let Some(fade) = self.fade_out {
            config.ambient.fade_out_seconds = fade;
        }
        self.beats.apply(&mut config.binaural_params);
    }
}

/// Run the mix command
///
/// # Arguments
/// * `args` - Command-line overrides
/// * `config_path` - Optional JSON configuration file
/// * `seed` - Seed for reproducible ambient selection
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(args: &MixArgs, config_path: Option<&Path>, seed: Option<u32>) -> Result<ExitCode> {
    let mut config = load_config(config_path)?.mix;
    args.apply(&mut config);

    let path = if config.binaural { "binaural" } else { "ambient" };
    println!(
        "{} {} ({})",
        "Mixing:".cyan().bold(),
        config.speech_file.display(),
        path
    );

    let mut rng = component_rng(seed, rng::MIX);
    let output = AudioMixer::new(WavCodec, config).mix_audio(&mut rng)?;

    println!("{} Wrote {}", "SUCCESS".green().bold(), output.display());
    Ok(ExitCode::SUCCESS)
}
