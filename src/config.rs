//! Application-level configuration loading: speech voice, timings, volumes and file locations.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the binary looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PALABRA_VIVA_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Local directory bare audio file names resolve under.
    pub audio_dir: String,
    /// Alternative catalog file; `None` uses the built-in catalog.
    pub catalog_path: Option<PathBuf>,
    /// JSON file holding persisted values.
    pub stars_path: PathBuf,
    /// Stars between two reward modals.
    pub reward_every: u64,
    /// Synthesized speech settings.
    pub speech: SpeechConfig,
    /// Delays driving playback and game pacing.
    pub timings: Timings,
    /// Playback volumes.
    pub volumes: Volumes,
}

#[derive(Debug, Clone, PartialEq)]
/// Voice parameters handed to the speech synthesizer.
pub struct SpeechConfig {
    /// BCP 47 language tag.
    pub language: String,
    /// Rate for ordinary sentences and words.
    pub rate: f32,
    /// Pitch for every utterance.
    pub pitch: f32,
    /// Slower rate for syllable breakdowns.
    pub syllable_rate: f32,
    /// Rate of the spoken victory cue.
    pub cue_rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Delays in milliseconds.
pub struct Timings {
    /// See [`Timings::word_fallback`].
    pub word_fallback: u64,
    /// See [`Timings::syllable_fallback`].
    pub syllable_fallback: u64,
    /// See [`Timings::stage_pause`].
    pub stage_pause: u64,
    /// See [`Timings::listen_prompt_delay`].
    pub listen_prompt_delay: u64,
    /// See [`Timings::pair_check_delay`].
    pub pair_check_delay: u64,
    /// See [`Timings::memory_celebration_delay`].
    pub memory_celebration_delay: u64,
    /// See [`Timings::memory_advance`].
    pub memory_advance: u64,
    /// See [`Timings::success_advance`].
    pub success_advance: u64,
    /// See [`Timings::spelling_advance`].
    pub spelling_advance: u64,
    /// See [`Timings::classification_advance`].
    pub classification_advance: u64,
    /// See [`Timings::voice_retry_replay`].
    pub voice_retry_replay: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Playback volumes between 0 and 1.
pub struct Volumes {
    /// Word sound effect, last stage of a card sequence.
    pub effect: f32,
    /// Victory cue.
    pub victory: f32,
    /// Error cue.
    pub error: f32,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        audio_dir = %app_config.audio_dir,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document. Absent fields keep their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Timings {
    /// Wait before advancing past a word spoken by the fallback voice.
    pub fn word_fallback(&self) -> Duration {
        Duration::from_millis(self.word_fallback)
    }

    /// Wait before advancing past syllables spoken by the fallback voice.
    pub fn syllable_fallback(&self) -> Duration {
        Duration::from_millis(self.syllable_fallback)
    }

    /// Gap between two playback stages.
    pub fn stage_pause(&self) -> Duration {
        Duration::from_millis(self.stage_pause)
    }

    /// Delay before the spoken listen-and-choose prompt.
    pub fn listen_prompt_delay(&self) -> Duration {
        Duration::from_millis(self.listen_prompt_delay)
    }

    /// Delay before two face-up memory pieces are compared.
    pub fn pair_check_delay(&self) -> Duration {
        Duration::from_millis(self.pair_check_delay)
    }

    /// Delay between the last memory match and the board celebration.
    pub fn memory_celebration_delay(&self) -> Duration {
        Duration::from_millis(self.memory_celebration_delay)
    }

    /// Delay between the board celebration and the next memory round.
    pub fn memory_advance(&self) -> Duration {
        Duration::from_millis(self.memory_advance)
    }

    /// Delay before the next choice or syllable round.
    pub fn success_advance(&self) -> Duration {
        Duration::from_millis(self.success_advance)
    }

    /// Delay before the next spelling round.
    pub fn spelling_advance(&self) -> Duration {
        Duration::from_millis(self.spelling_advance)
    }

    /// Delay before the next classification round.
    pub fn classification_advance(&self) -> Duration {
        Duration::from_millis(self.classification_advance)
    }

    /// Delay before a card replays after a missed voice attempt.
    pub fn voice_retry_replay(&self) -> Duration {
        Duration::from_millis(self.voice_retry_replay)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio_dir: "audio".into(),
            catalog_path: None,
            stars_path: PathBuf::from("data/stars.json"),
            reward_every: 5,
            speech: SpeechConfig::default(),
            timings: Timings::default(),
            volumes: Volumes::default(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "es-MX".into(),
            rate: 0.9,
            pitch: 1.0,
            syllable_rate: 0.8,
            cue_rate: 1.2,
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            word_fallback: 1_000,
            syllable_fallback: 2_000,
            stage_pause: 500,
            listen_prompt_delay: 1_000,
            pair_check_delay: 1_000,
            memory_celebration_delay: 1_000,
            memory_advance: 3_000,
            success_advance: 2_000,
            spelling_advance: 3_000,
            classification_advance: 2_500,
            voice_retry_replay: 1_500,
        }
    }
}

impl Default for Volumes {
    fn default() -> Self {
        Self {
            effect: 0.6,
            victory: 0.7,
            error: 0.5,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    audio_dir: Option<String>,
    catalog_path: Option<PathBuf>,
    stars_path: Option<PathBuf>,
    reward_every: Option<u64>,
    speech: RawSpeech,
    timings: RawTimings,
    volumes: RawVolumes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSpeech {
    language: Option<String>,
    rate: Option<f32>,
    pitch: Option<f32>,
    syllable_rate: Option<f32>,
    cue_rate: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTimings {
    word_fallback: Option<u64>,
    syllable_fallback: Option<u64>,
    stage_pause: Option<u64>,
    listen_prompt_delay: Option<u64>,
    pair_check_delay: Option<u64>,
    memory_celebration_delay: Option<u64>,
    memory_advance: Option<u64>,
    success_advance: Option<u64>,
    spelling_advance: Option<u64>,
    classification_advance: Option<u64>,
    voice_retry_replay: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVolumes {
    effect: Option<f32>,
    victory: Option<f32>,
    error: Option<f32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            audio_dir: value.audio_dir.unwrap_or(defaults.audio_dir),
            catalog_path: value.catalog_path.or(defaults.catalog_path),
            stars_path: value.stars_path.unwrap_or(defaults.stars_path),
            // Zero would celebrate on every point.
            reward_every: value
                .reward_every
                .filter(|every| *every > 0)
                .unwrap_or(defaults.reward_every),
            speech: value.speech.into(),
            timings: value.timings.into(),
            volumes: value.volumes.into(),
        }
    }
}

impl From<RawSpeech> for SpeechConfig {
    fn from(value: RawSpeech) -> Self {
        let defaults = SpeechConfig::default();
        Self {
            language: value.language.unwrap_or(defaults.language),
            rate: value.rate.unwrap_or(defaults.rate),
            pitch: value.pitch.unwrap_or(defaults.pitch),
            syllable_rate: value.syllable_rate.unwrap_or(defaults.syllable_rate),
            cue_rate: value.cue_rate.unwrap_or(defaults.cue_rate),
        }
    }
}

impl From<RawTimings> for Timings {
    fn from(value: RawTimings) -> Self {
        let defaults = Timings::default();
        Self {
            word_fallback: value.word_fallback.unwrap_or(defaults.word_fallback),
            syllable_fallback: value.syllable_fallback.unwrap_or(defaults.syllable_fallback),
            stage_pause: value.stage_pause.unwrap_or(defaults.stage_pause),
            listen_prompt_delay: value
                .listen_prompt_delay
                .unwrap_or(defaults.listen_prompt_delay),
            pair_check_delay: value.pair_check_delay.unwrap_or(defaults.pair_check_delay),
            memory_celebration_delay: value
                .memory_celebration_delay
                .unwrap_or(defaults.memory_celebration_delay),
            memory_advance: value.memory_advance.unwrap_or(defaults.memory_advance),
            success_advance: value.success_advance.unwrap_or(defaults.success_advance),
            spelling_advance: value.spelling_advance.unwrap_or(defaults.spelling_advance),
            classification_advance: value
                .classification_advance
                .unwrap_or(defaults.classification_advance),
            voice_retry_replay: value
                .voice_retry_replay
                .unwrap_or(defaults.voice_retry_replay),
        }
    }
}

impl From<RawVolumes> for Volumes {
    fn from(value: RawVolumes) -> Self {
        let defaults = Volumes::default();
        Self {
            effect: value.effect.unwrap_or(defaults.effect).clamp(0.0, 1.0),
            victory: value.victory.unwrap_or(defaults.victory).clamp(0.0, 1.0),
            error: value.error.unwrap_or(defaults.error).clamp(0.0, 1.0),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
