//! Hook for speech effects applied between merging and mixing.

use crate::buffer::AudioBuffer;
use crate::error::AudioResult;

/// Processes the merged narration before it is mixed.
pub trait SpeechEffects {
    fn apply(&self, buffer: AudioBuffer) -> AudioResult<AudioBuffer>;
}

/// Leaves the audio untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl SpeechEffects for Passthrough {
    fn apply(&self, buffer: AudioBuffer) -> AudioResult<AudioBuffer> {
        Ok(buffer)
    }
}

impl<F> SpeechEffects for F
where
    F: Fn(AudioBuffer) -> AudioResult<AudioBuffer>,
{
    fn apply(&self, buffer: AudioBuffer) -> AudioResult<AudioBuffer> {
        self(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_passthrough_is_identity() {
        let buf = AudioBuffer::new(vec![1, 2, 3, 4], 2, 8000, 2).unwrap();
        assert_eq!(Passthrough.apply(buf.clone()).unwrap(), buf);
    }

    #[test]
    fn test_closure_effect() {
        let buf = AudioBuffer::new(vec![1000, -1000], 1, 8000, 2).unwrap();
        let halve = |b: AudioBuffer| -> AudioResult<AudioBuffer> { Ok(b.apply_gain_linear(0.5)) };
        assert_eq!(halve.apply(buf).unwrap().samples(), &[500, -500]);
    }
}
