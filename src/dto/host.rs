use serde::Serialize;
use uuid::Uuid;

use crate::dto::surface::SurfaceEvent;

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Capability requests sent to the host.
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    /// Start a clip; completion is reported back under `handle`.
    AudioPlay {
        handle: Uuid,
        src: String,
        volume: f32,
    },
    /// Stop a clip started by `audio_play`.
    AudioStop {
        handle: Uuid,
    },
    /// Fetch a clip ahead of time.
    AudioPreload {
        src: String,
    },
    /// Speak text with the host synthesizer.
    SpeechSpeak {
        text: String,
        rate: f32,
        pitch: f32,
        language: String,
    },
    /// Silence the synthesizer.
    SpeechCancel,
    /// Start one speech recognition capture.
    VoiceStart {
        language: String,
    },
}

#[derive(Debug, Serialize)]
/// One line written to stdout.
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum OutboundLine<'a> {
    /// Presentation event.
    Surface(&'a SurfaceEvent),
    /// Capability command.
    Host(&'a HostCommand),
}
