//! Medimix Audio Core
//!
//! This crate combines spoken narration with a companion signal for
//! meditation tracks:
//! - binaural beats with a swept beat frequency, or
//! - a randomly chosen window of an ambient recording.
//!
//! # Overview
//!
//! The companion signal is attenuated against the speech by a power ratio
//! ([`SecondaryAttenuationRatio`], where a higher ratio means a quieter
//! companion), overlaid, and peak normalized. A separate merger joins
//! narration clips into one track of an exact target length, distributing
//! silence between them and alternating stereo pan.
//!
//! # Randomness
//!
//! Ambient file choice, window offset and phrase spreading take a
//! caller-supplied `rand::Rng`. Seeded PCG32 generators from [`rng`] make a
//! render reproducible; [`rng::entropy_rng`] is used otherwise.
//!
//! # Example
//!
//! ```ignore
//! use medimix_audio::{AudioMixer, MixConfiguration, WavCodec};
//! use medimix_audio::rng::create_rng;
//!
//! let config = MixConfiguration {
//!     speech_file: "speech.wav".into(),
//!     binaural: true,
//!     ..MixConfiguration::default()
//! };
//! let output = AudioMixer::new(WavCodec, config).mix_audio(&mut create_rng(42))?;
//! println!("wrote {}", output.display());
//! ```
//!
//! # Crate Structure
//!
//! - [`buffer`] - Decoded PCM buffers and gain operations
//! - [`convert`] - Channel, width and rate conversion
//! - [`power`] - Power-ratio overlay
//! - [`binaural`] - Binaural beat synthesis with sweep correction
//! - [`ambient`] - Ambient window selection and overlay
//! - [`silence`] / [`spread`] - Silence detection and phrase spreading
//! - [`merger`] - Clip merging to a target duration
//! - [`mixer`] - Top-level mix
//! - [`pipeline`] - Merge, effects and mix in one call
//! - [`codec`] - File encode/decode

pub mod ambient;
pub mod binaural;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod convert;
pub mod effects;
pub mod error;
pub mod fade;
pub mod merger;
pub mod mixer;
pub mod pan;
pub mod pipeline;
pub mod power;
pub mod rng;
pub mod silence;
pub mod spread;

// Re-export main types at crate root
pub use ambient::AmbientParams;
pub use binaural::{BinauralOutput, BinauralParams, SweepAnalysis};
pub use buffer::AudioBuffer;
pub use codec::{AudioCodec, WavCodec};
pub use config::{MedimixConfig, MergeConfiguration, MixConfiguration};
pub use effects::{Passthrough, SpeechEffects};
pub use error::{AudioError, AudioResult};
pub use merger::{MergeTiming, SegmentMergeSpec, SegmentMerger};
pub use mixer::{AudioMixer, MixPath};
pub use pipeline::{Pipeline, RenderOutput};
pub use power::SecondaryAttenuationRatio;
pub use silence::SilenceParams;
pub use spread::{SpreadParams, SpreadReport};
