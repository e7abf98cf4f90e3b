//! CLI command implementations

pub mod binaural;
pub mod merge;
pub mod mix;
pub mod render;

use medimix_audio::BinauralParams;

/// Binaural overrides shared by the mix, binaural and render commands.
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct BinauralArgs {
    /// Beat frequency at the start of the sweep (Hz)
    #[arg(long)]
    pub start_beat: Option<f64>,

    /// Beat frequency at the end of the sweep (Hz)
    #[arg(long)]
    pub end_beat: Option<f64>,

    /// Carrier frequency of the left channel (Hz)
    #[arg(long)]
    pub base_freq: Option<f64>,

    /// Sample rate of the synthesized beats (Hz)
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Fade-out at the end of the beats (seconds)
    #[arg(long)]
    pub beat_fade_out: Option<f64>,
}

impl BinauralArgs {
    pub fn apply(&self, params: &mut BinauralParams) {
        if let Some(v) = self.start_beat {
            params.start_beat_freq = v;
        }
        if let Some(v) = self.end_beat {
            params.end_beat_freq = v;
        }
        if let Some(v) = self.base_freq {
            params.base_freq = v;
        }
        if let Some(v) = self.sample_rate {
            params.sample_rate = v;
        }
        if let Some(v) = self.beat_fade_out {
            params.fade_out_seconds = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binaural_overrides_only_given_values() {
        let args = BinauralArgs {
            base_freq: Some(220.0),
            ..BinauralArgs::default()
        };
        let mut params = BinauralParams::default();
        args.apply(&mut params);
        assert_eq!(params.base_freq, 220.0);
        assert_eq!(params.start_beat_freq, 5.0);
    }
}
