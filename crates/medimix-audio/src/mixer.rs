//! Top-level mix of speech with binaural beats or an ambient track.
//!
//! [`AudioMixer::mix_audio`] validates the configuration, plans the
//! companion signal (a [`MixPath`]), renders the mix and writes it to the
//! configured output path.

use std::path::{Path, PathBuf};

use log::info;
use rand::Rng;

use crate::ambient;
use crate::binaural;
use crate::buffer::AudioBuffer;
use crate::codec::AudioCodec;
use crate::config::MixConfiguration;
use crate::convert;
use crate::error::{AudioError, AudioResult};
use crate::merger::ensure_parent;
use crate::power::{self, SecondaryAttenuationRatio};

/// The companion signal chosen for a mix.
#[derive(Debug, Clone, PartialEq)]
pub enum MixPath {
    /// Synthesized binaural beats.
    Binaural,
    /// An ambient track from the library.
    Ambient { file: PathBuf },
}

/// Mixes one speech file according to a [`MixConfiguration`].
pub struct AudioMixer<C> {
    codec: C,
    config: MixConfiguration,
}

impl<C: AudioCodec> AudioMixer<C> {
    pub fn new(codec: C, config: MixConfiguration) -> Self {
        Self { codec, config }
    }

    pub fn config(&self) -> &MixConfiguration {
        &self.config
    }

    /// Checks the speech file and power ratio.
    pub fn validate(&self) -> AudioResult<()> {
        let speech = &self.config.speech_file;
        if speech.as_os_str().is_empty() {
            return Err(AudioError::invalid_param(
                "speech_file",
                "a speech audio file is required",
            ));
        }
        if !speech.exists() {
            return Err(AudioError::not_found("speech audio file", speech));
        }
        if !self.codec.accepts(speech) {
            return Err(AudioError::invalid_param(
                "speech_file",
                format!(
                    "{} is not a {} file",
                    speech.display(),
                    self.codec.extension().to_uppercase()
                ),
            ));
        }
        if let Some(ratio) = self.config.power_ratio {
            if ratio < 0.0 {
                return Err(AudioError::invalid_param(
                    "power_ratio",
                    format!("must be positive, got {}", ratio),
                ));
            }
        }
        Ok(())
    }

    /// Picks the companion signal.
    ///
    /// The binaural path checks the binaural parameters; the ambient path
    /// lists the ambient library and draws one file from it.
    pub fn plan<R: Rng>(&self, rng: &mut R) -> AudioResult<MixPath> {
        if self.config.binaural {
            self.config.binaural_params.validate()?;
            return Ok(MixPath::Binaural);
        }
        let dir = self.sounds_dir();
        let files = list_ambient_files(&self.codec, &dir)?;
        let file = files[rng.gen_range(0..files.len())].clone();
        info!("selected ambient file: {}", file.display());
        Ok(MixPath::Ambient { file })
    }

    /// Mixes `speech` along `path`. The result is always stereo.
    pub fn render<R: Rng>(
        &self,
        speech: &AudioBuffer,
        path: &MixPath,
        rng: &mut R,
    ) -> AudioResult<AudioBuffer> {
        let speech = &convert::to_channels(speech, 2)?;
        match path {
            MixPath::Binaural => {
                let beats = binaural::generate_binaural_beats(
                    &self.config.binaural_params,
                    speech.duration_seconds(),
                )?;
                let ratio = SecondaryAttenuationRatio::resolve(
                    self.config.power_ratio,
                    SecondaryAttenuationRatio::binaural_default(),
                )?;
                power::overlay_with_power_ratio(speech, &beats, ratio)
            }
            MixPath::Ambient { file } => {
                let ambient_track = self.codec.decode(file)?;
                ambient::overlay_ambient(
                    speech,
                    &ambient_track,
                    &self.config.ambient,
                    self.config.power_ratio,
                    rng,
                )
            }
        }
    }

    /// Runs the full mix and returns the path of the written file.
    pub fn mix_audio<R: Rng>(&self, rng: &mut R) -> AudioResult<PathBuf> {
        self.validate()?;
        let speech = self.codec.decode(&self.config.speech_file)?;
        let path = self.plan(rng)?;
        let mixed = self.render(&speech, &path, rng)?;

        let output = self.config.output_path();
        ensure_parent(&output)?;
        self.codec.encode(&mixed, &output)?;
        info!(
            "mixed {} ({:.2}s) into {}",
            self.config.speech_file.display(),
            mixed.duration_seconds(),
            output.display()
        );
        Ok(output)
    }

    /// The ambient library directory, joined onto the asset root.
    pub fn sounds_dir(&self) -> PathBuf {
        let root = self
            .config
            .asset_root
            .clone()
            .unwrap_or_else(default_asset_root);
        root.join(&self.config.sounds_dir)
    }
}

/// Directory of the running executable, or the current directory if it
/// cannot be determined.
pub fn default_asset_root() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Lists the files in `dir` the codec accepts, sorted by path.
///
/// # Errors
/// Returns a not-found error if `dir` is missing or holds no such files.
pub fn list_ambient_files<C>(codec: &C, dir: &Path) -> AudioResult<Vec<PathBuf>>
where
    C: AudioCodec + ?Sized,
{
    if !dir.is_dir() {
        return Err(AudioError::not_found("ambient sound directory", dir));
    }
    let mut files = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    files.retain(|p| p.is_file() && codec.accepts(p));
    files.sort();

    if files.is_empty() {
        return Err(AudioError::not_found(
            format!("{} files in ambient sound directory", codec.extension()),
            dir,
        ));
    }
    Ok(files)
}
