//! Synthesized speech: the capability seam and the fallback adapter used when clips are missing.

use std::sync::Arc;

use crate::config::SpeechConfig;

/// Voice parameters for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechOptions {
    /// Speaking rate, 1.0 being the synthesizer's normal speed.
    pub rate: f32,
    /// Voice pitch.
    pub pitch: f32,
    /// BCP 47 language tag.
    pub language: String,
}

/// Speech synthesizer exposed by the host. Utterances have no completion signal.
pub trait SpeechSynth: Send + Sync {
    /// Queue `text` for speaking.
    fn speak(&self, text: &str, options: &SpeechOptions);
    /// Drop the utterance being spoken and everything queued behind it.
    fn cancel(&self);
}

/// Speaks words, sentences and syllable breakdowns with the configured voice.
#[derive(Clone)]
pub struct SpeechFallback {
    synth: Arc<dyn SpeechSynth>,
    config: SpeechConfig,
}

impl SpeechFallback {
    /// Wrap `synth` with the voice from `config`.
    pub fn new(synth: Arc<dyn SpeechSynth>, config: SpeechConfig) -> Self {
        Self { synth, config }
    }

    /// Speak `text` at the normal rate.
    pub fn say(&self, text: &str) {
        self.say_with_rate(text, self.config.rate);
    }

    /// Speak `text` at `rate`.
    pub fn say_with_rate(&self, text: &str, rate: f32) {
        let options = SpeechOptions {
            rate,
            pitch: self.config.pitch,
            language: self.config.language.clone(),
        };
        self.synth.speak(text, &options);
    }

    /// Speak a syllable breakdown slowly, pausing between syllables.
    pub fn say_syllables(&self, syllables: &[String]) {
        self.say_with_rate(&syllable_utterance(syllables), self.config.syllable_rate);
    }

    /// Spoken victory cue.
    pub fn say_cue(&self, text: &str) {
        self.say_with_rate(text, self.config.cue_rate);
    }

    /// Silence the synthesizer.
    pub fn cancel(&self) {
        self.synth.cancel();
    }
}

/// Join syllables so a synthesizer pauses between them: `E, Le, Fan, Te`.
pub fn syllable_utterance(syllables: &[String]) -> String {
    syllables
        .iter()
        .map(|syllable| capitalize(syllable))
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
