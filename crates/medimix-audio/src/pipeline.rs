//! Merge, effects and mix as one render.

use std::path::PathBuf;

use log::info;
use rand::Rng;

use crate::codec::AudioCodec;
use crate::config::{MergeConfiguration, MixConfiguration};
use crate::effects::SpeechEffects;
use crate::error::{AudioError, AudioResult};
use crate::merger::{ensure_parent, SegmentMerger};
use crate::mixer::AudioMixer;

/// Files written by [`Pipeline::render`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// `<name>_merged.<ext>` in the working directory.
    pub merged: PathBuf,
    /// `<name>_merged_fx.<ext>` in the working directory.
    pub effected: PathBuf,
    /// The mixer's output path.
    pub mixed: PathBuf,
}

/// Renders a set of narration clips into a finished mix.
///
/// Intermediate files are named after `name` and written to the mix working
/// directory. The merge output and mix speech file in the configurations are
/// replaced by those intermediates.
pub struct Pipeline<C, E> {
    codec: C,
    effects: E,
    merge: MergeConfiguration,
    mix: MixConfiguration,
    name: String,
}

impl<C, E> Pipeline<C, E>
where
    C: AudioCodec + Clone,
    E: SpeechEffects,
{
    pub fn new(
        codec: C,
        effects: E,
        merge: MergeConfiguration,
        mix: MixConfiguration,
        name: impl Into<String>,
    ) -> Self {
        Self {
            codec,
            effects,
            merge,
            mix,
            name: name.into(),
        }
    }

    fn intermediate(&self, suffix: &str) -> PathBuf {
        self.mix.working_dir.join(format!(
            "{}_{}.{}",
            self.name,
            suffix,
            self.codec.extension()
        ))
    }

    /// Runs merge, effects and mix in order.
    pub fn render<R: Rng>(&self, rng: &mut R) -> AudioResult<RenderOutput> {
        if self.name.is_empty() {
            return Err(AudioError::invalid_param("name", "render name must not be empty"));
        }

        let merged = self.intermediate("merged");
        let merge = MergeConfiguration {
            output_file: merged.clone(),
            ..self.merge.clone()
        };
        SegmentMerger::new(self.codec.clone(), merge).merge(rng)?;

        let effected = self.intermediate("merged_fx");
        let processed = self.effects.apply(self.codec.decode(&merged)?)?;
        ensure_parent(&effected)?;
        self.codec.encode(&processed, &effected)?;
        info!("effects applied: {}", effected.display());

        let mix = MixConfiguration {
            speech_file: effected.clone(),
            ..self.mix.clone()
        };
        let mixed = AudioMixer::new(self.codec.clone(), mix).mix_audio(rng)?;

        Ok(RenderOutput {
            merged,
            effected,
            mixed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AudioBuffer;
    use crate::codec::WavCodec;
    use crate::effects::Passthrough;
    use crate::rng::create_rng;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_name_rejected() {
        let pipeline = Pipeline::new(
            WavCodec,
            Passthrough,
            MergeConfiguration::default(),
            MixConfiguration::default(),
            "",
        );
        let err = pipeline.render(&mut create_rng(0)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_render_binaural_writes_intermediates() {
        let dir = tempfile::tempdir().unwrap();
        let clip = AudioBuffer::new(
            (0..4000).map(|i| ((i % 40) as i32 - 20) * 500).collect(),
            1,
            8000,
            2,
        )
        .unwrap();
        let clips: Vec<PathBuf> = ["a.wav", "b.wav"]
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                WavCodec.encode(&clip, &path).unwrap();
                path
            })
            .collect();

        let mut merge = MergeConfiguration::default();
        merge.clips = clips;
        merge.timing.target_duration = 2.0;
        merge.timing.front_buffer = 0.5;
        merge.timing.rear_buffer = 0.5;

        let mut mix = MixConfiguration::default();
        mix.working_dir = dir.path().join("work");
        mix.binaural = true;
        mix.binaural_params.sample_rate = 8000;
        mix.binaural_params.fade_out_seconds = 0.5;

        let pipeline = Pipeline::new(WavCodec, Passthrough, merge, mix, "calm");
        let out = pipeline.render(&mut create_rng(1)).unwrap();

        assert_eq!(out.merged, dir.path().join("work/calm_merged.wav"));
        assert_eq!(out.effected, dir.path().join("work/calm_merged_fx.wav"));
        assert_eq!(out.mixed, dir.path().join("work/output.wav"));

        let mixed = WavCodec.decode(&out.mixed).unwrap();
        assert_eq!(mixed.channels(), 2);
        assert!((mixed.duration_seconds() - 3.0).abs() < 1e-3);
    }
}
