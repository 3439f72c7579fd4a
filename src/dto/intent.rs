//! Messages and user actions arriving from the host.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::games::GameMode;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Actions forwarded by the presentation surface.
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserIntent {
    /// Open learn mode on a category.
    LoadCategory { name: String },
    NextCard,
    PrevCard,
    /// Play the current card again.
    Replay,
    /// Show or hide the card picture.
    ToggleImage,
    /// Start voice practice on the current card.
    StartListening,
    GoHome,
    OpenGameMenu,
    StartGame { mode: GameMode },
    /// Pick a picture option by catalog id.
    SelectOption { id: String },
    /// Flip a memory piece by board index.
    FlipCard { index: usize },
    /// Move a syllable from the bank to the assembled word.
    SelectSyllable { index: usize },
    /// Submit the assembled syllables.
    CheckSyllables,
    /// Pick a letter tile by bank index.
    PickLetter { index: usize },
    /// Sort the picture into the bucket with this key.
    ChooseBucket { category: String },
    /// Ask to zero the stars. Only a confirmed request resets them.
    ResetStars {
        #[serde(default)]
        confirmed: bool,
    },
    CloseModal,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// Messages accepted from the host on stdin, one JSON document per line.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// The host finished loading; carries detected capabilities.
    Ready {
        #[serde(default)]
        voice_supported: bool,
    },
    /// A user action.
    Intent(UserIntent),
    /// A playback handle reached its natural end.
    AudioEnded { handle: Uuid },
    /// A playback handle failed to load or play.
    AudioFailed {
        handle: Uuid,
        #[serde(default)]
        reason: Option<String>,
    },
    /// Speech recognition produced a transcript.
    VoiceResult { transcript: String },
    /// Speech recognition ended without a transcript.
    VoiceFailed {
        #[serde(default)]
        reason: Option<String>,
    },
    /// Any message type this version does not know.
    #[serde(other)]
    Unknown,
}
