//! Medimix CLI - meditation audio merging and mixing
//!
//! This binary merges narration clips, synthesizes binaural beats and mixes
//! speech with binaural or ambient companion audio.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

// Use modules from the library crate
use medimix_cli::commands;
use medimix_cli::commands::binaural::BinauralCommandArgs;
use medimix_cli::commands::merge::MergeArgs;
use medimix_cli::commands::mix::MixArgs;
use medimix_cli::commands::render::RenderArgs;
use medimix_cli::settings::init_logging;

/// Medimix - Meditation Audio Mixer
#[derive(Parser)]
#[command(name = "medimix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// JSON configuration file; command-line flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible random choices (default: OS entropy)
    #[arg(long, global = true)]
    seed: Option<u32>,

    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mix a speech file with binaural beats or an ambient track
    Mix(MixArgs),

    /// Merge narration clips into a track of a target duration
    Merge(MergeArgs),

    /// Synthesize binaural beats on their own
    Binaural(BinauralCommandArgs),

    /// Merge, apply effects and mix in one run
    Render(RenderArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Mix(args) => commands::mix::run(args, config, cli.seed),
        Commands::Merge(args) => commands::merge::run(args, config, cli.seed),
        Commands::Binaural(args) => commands::binaural::run(args, config),
        Commands::Render(args) => commands::render::run(args, config, cli.seed),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
