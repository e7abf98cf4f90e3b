//! Configuration for mixing and merging.
//!
//! Every field has a default, so a JSON document only needs to name the
//! values it changes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ambient::AmbientParams;
use crate::binaural::BinauralParams;
use crate::merger::SegmentMergeSpec;

/// Default name of the mixed file, inside the working directory.
pub const DEFAULT_MIX_OUTPUT: &str = "output.wav";

/// Default ambient library directory, relative to the asset root.
pub const DEFAULT_SOUNDS_DIR: &str = "ambient_files";

/// Merge settings share their shape with a merge job.
pub type MergeConfiguration = SegmentMergeSpec;

/// Settings for one mix of speech with binaural beats or ambient sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfiguration {
    /// Speech track to mix.
    pub speech_file: PathBuf,
    /// Directory the output is written to.
    pub working_dir: PathBuf,
    /// Output file name, relative to `working_dir`.
    pub output_file: PathBuf,
    /// Mix binaural beats instead of an ambient track.
    pub binaural: bool,
    pub binaural_params: BinauralParams,
    pub ambient: AmbientParams,
    /// Ambient library directory, relative to `asset_root`.
    pub sounds_dir: PathBuf,
    /// Base for `sounds_dir`. Defaults to the directory of the running
    /// executable.
    pub asset_root: Option<PathBuf>,
    /// Speech power over companion power after scaling. Unset or zero picks
    /// the default for the chosen path.
    pub power_ratio: Option<f64>,
}

impl Default for MixConfiguration {
    fn default() -> Self {
        Self {
            speech_file: PathBuf::new(),
            working_dir: PathBuf::from("."),
            output_file: PathBuf::from(DEFAULT_MIX_OUTPUT),
            binaural: false,
            binaural_params: BinauralParams::default(),
            ambient: AmbientParams::default(),
            sounds_dir: PathBuf::from(DEFAULT_SOUNDS_DIR),
            asset_root: None,
            power_ratio: None,
        }
    }
}

impl MixConfiguration {
    /// Full path of the mixed file.
    pub fn output_path(&self) -> PathBuf {
        self.working_dir.join(&self.output_file)
    }
}

/// A configuration file holding both mix and merge settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedimixConfig {
    pub mix: MixConfiguration,
    pub merge: MergeConfiguration,
}

impl MedimixConfig {
    /// Parses a configuration document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = MedimixConfig::from_json("{}").unwrap();
        assert_eq!(config, MedimixConfig::default());

        let mix = &config.mix;
        assert_eq!(mix.output_path(), PathBuf::from("./output.wav"));
        assert_eq!(mix.sounds_dir, PathBuf::from("ambient_files"));
        assert_eq!(mix.power_ratio, None);
        assert_eq!(mix.binaural_params.start_beat_freq, 5.0);
        assert_eq!(mix.binaural_params.end_beat_freq, 0.5);
        assert_eq!(mix.binaural_params.base_freq, 110.0);
        assert_eq!(mix.binaural_params.sample_rate, 44100);
        assert_eq!(mix.ambient.chop_ms, 30_000);

        let merge = &config.merge;
        assert_eq!(merge.output_file, PathBuf::from("merged_output.wav"));
        assert_eq!(merge.timing.front_buffer, 3.0);
        assert_eq!(merge.timing.rear_buffer, 3.0);
        assert_eq!(merge.spread.silence.min_silence_len_ms, 800);
        assert_eq!(merge.spread.silence.silence_thresh_db, -50.0);
        assert_eq!(merge.spread.silence_add_ms, 8000);
        assert!(!merge.spread_out);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "mix": {
                "binaural": true,
                "power_ratio": 300000,
                "binaural_params": { "base_freq": 200.0 }
            },
            "merge": {
                "target_duration": 60.0,
                "pan_odd": -0.5,
                "silence_add_ms": 4000
            }
        }"#;
        let config = MedimixConfig::from_json(json).unwrap();
        assert!(config.mix.binaural);
        assert_eq!(config.mix.power_ratio, Some(300000.0));
        assert_eq!(config.mix.binaural_params.base_freq, 200.0);
        assert_eq!(config.mix.binaural_params.start_beat_freq, 5.0);
        assert_eq!(config.merge.timing.target_duration, 60.0);
        assert_eq!(config.merge.timing.pan_odd, -0.5);
        assert_eq!(config.merge.timing.front_buffer, 3.0);
        assert_eq!(config.merge.spread.silence_add_ms, 4000);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = MedimixConfig::default();
        config.mix.binaural = true;
        config.merge.clips = vec![PathBuf::from("a.wav"), PathBuf::from("b.wav")];
        let json = config.to_json_pretty().unwrap();
        assert_eq!(MedimixConfig::from_json(&json).unwrap(), config);
    }
}
