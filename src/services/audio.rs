//! Audio playback and voice capture capabilities consumed by the core.

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

/// Playback failures. None of them reach the user; the caller falls back to speech.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// No clip is configured for the stage.
    #[error("audio resource missing")]
    Missing,
    /// The host could not load or play the clip.
    #[error("playback failed: {0}")]
    PlaybackFailed(String),
    /// The handle was stopped before reaching its end.
    #[error("playback stopped")]
    Stopped,
    /// The handle no longer exists on the host.
    #[error("audio handle disposed")]
    Disposed,
}

/// Voice capture failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    /// The host has no speech recognition.
    #[error("speech recognition unsupported")]
    Unsupported,
    /// A capture is already in flight.
    #[error("speech recognition already listening")]
    Busy,
    /// Recognition ended without a transcript.
    #[error("no speech recognised")]
    NoResult,
    /// Recognition reported an error.
    #[error("speech recognition failed: {0}")]
    Failed(String),
}

/// A clip currently owned by the host.
pub trait AudioHandle: Send + Sync {
    /// Identifier shared with the host.
    fn id(&self) -> Uuid;
    /// Pause the clip and rewind it to the start.
    fn stop(&self) -> Result<(), AudioError>;
}

/// A started clip together with its completion signal.
pub struct Playing {
    /// Handle used to stop the clip.
    pub handle: Arc<dyn AudioHandle>,
    /// Resolves when the clip ends naturally or fails.
    pub finished: BoxFuture<'static, Result<(), AudioError>>,
}

/// Audio output exposed by the host.
pub trait AudioBackend: Send + Sync {
    /// Start playing `src` at `volume`.
    fn play(&self, src: &str, volume: f32) -> Result<Playing, AudioError>;

    /// Hint that `src` will be played soon.
    fn preload(&self, _src: &str) {}
}

/// Speech recognition exposed by the host, one capture at a time.
pub trait VoiceCapture: Send + Sync {
    /// Whether the host can recognise speech at all.
    fn is_supported(&self) -> bool;
    /// Start listening. The returned future resolves with the raw transcript.
    fn start(&self) -> Result<BoxFuture<'static, Result<String, VoiceError>>, VoiceError>;
}
