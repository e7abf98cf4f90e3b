//! Binaural command implementation
//!
//! Synthesizes binaural beats alone and reports the sweep analysis.

use anyhow::{bail, Result};
use colored::Colorize;
use medimix_audio::binaural::synthesize_with_correction;
use medimix_audio::{AudioCodec, WavCodec};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::BinauralArgs;
use crate::settings::load_config;

/// Arguments of `medimix binaural`.
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct BinauralCommandArgs {
    /// Length of the beats (seconds)
    #[arg(short, long)]
    pub duration: f64,

    /// Output WAV file
    #[arg(short, long)]
    pub out: PathBuf,

    #[command(flatten)]
    pub beats: BinauralArgs,
}

/// Run the binaural command
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(args: &BinauralCommandArgs, config_path: Option<&Path>) -> Result<ExitCode> {
    let codec = WavCodec;
    if !codec.accepts(&args.out) {
        bail!("Output file must end in .{}: {}", codec.extension(), args.out.display());
    }

    let mut params = load_config(config_path)?.mix.binaural_params;
    args.beats.apply(&mut params);

    println!(
        "{} {:.1}s sweep {} Hz -> {} Hz over {} Hz",
        "Synthesizing:".cyan().bold(),
        args.duration,
        params.start_beat_freq,
        params.end_beat_freq,
        params.base_freq
    );

    let output = synthesize_with_correction(&params, args.duration)?;
    codec.encode(&output.buffer, &args.out)?;

    if let Some(cv) = output.analysis.coefficient_of_variation {
        println!("  pulse count CV: {:.2}%", cv);
    }
    if output.analysis.corrected {
        println!(
            "  {} sweep corrected to {} Hz -> {} Hz",
            "NOTE".yellow().bold(),
            output.params.start_beat_freq,
            output.params.end_beat_freq
        );
    }
    println!("{} Wrote {}", "SUCCESS".green().bold(), args.out.display());
    Ok(ExitCode::SUCCESS)
}
