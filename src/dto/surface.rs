//! Payloads pushed to the presentation surface.

use serde::{Deserialize, Serialize};

use crate::{
    services::messages,
    state::{
        content::WordEntry,
        games::{Face, GameMode, PieceState, Round},
        session::Screen,
    },
};

#[derive(Clone, Debug, Serialize)]
/// Dispatched payload carried to the presentation surface.
pub struct SurfaceEvent {
    /// Event name, e.g. `screen` or `round`.
    pub event: String,
    /// Event payload.
    pub data: serde_json::Value,
}

impl SurfaceEvent {
    /// Convenience wrapper that serialises `payload` into the data field.
    pub fn json<T>(event: &str, payload: &T) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        Ok(Self {
            event: event.to_string(),
            data: serde_json::to_value(payload)?,
        })
    }
}

/// Toast flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Right answer or completed action.
    Success,
    /// Wrong answer or failed action.
    Error,
    /// Neutral notice.
    Info,
}

/// Destructive actions that need an explicit yes from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmAction {
    /// Zero the star counter.
    ResetStars,
}

/// Screen change.
#[derive(Debug, Serialize)]
pub struct ScreenEvent {
    pub screen: Screen,
}

/// Short message over the current screen.
#[derive(Debug, Serialize)]
pub struct ToastEvent<'a> {
    pub message: &'a str,
    pub severity: Severity,
}

/// Updated star total.
#[derive(Debug, Serialize)]
pub struct StarsEvent {
    pub count: u64,
}

/// On/off indicator, such as the microphone or the hidden-image toggle.
#[derive(Debug, Serialize)]
pub struct FlagEvent {
    pub value: bool,
}

/// Spelling tile to shake after a wrong pick.
#[derive(Debug, Serialize)]
pub struct LetterRejectedEvent {
    /// Index of the tile in the bank.
    pub index: usize,
}

/// Yes/no question; the answer comes back as a confirm intent.
#[derive(Debug, Serialize)]
pub struct ConfirmEvent<'a> {
    pub action: ConfirmAction,
    pub prompt: &'a str,
}

/// Images the surface should fetch ahead of time.
#[derive(Debug, Serialize)]
pub struct PreloadEvent<'a> {
    pub images: &'a [String],
}

/// Flashcard as rendered in learn mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    /// Catalog id of the entry.
    pub id: String,
    /// Display word in capitals.
    pub word: String,
    /// Authored syllable breakdown, e.g. `Ga-to`.
    pub syllables: String,
    pub image: String,
    /// Whether the picture is replaced by the read-the-word placeholder.
    pub image_hidden: bool,
    /// Zero-based position in the category.
    pub index: usize,
    /// Number of cards in the category.
    pub total: usize,
}

impl CardView {
    /// Describe `entry` as card `index` of `total`.
    pub fn new(entry: &WordEntry, index: usize, total: usize, image_hidden: bool) -> Self {
        Self {
            id: entry.id.clone(),
            word: entry.word.clone(),
            syllables: entry.syllable_text.clone(),
            image: entry.image.clone(),
            image_hidden,
            index,
            total,
        }
    }
}

/// Picture option of a choice round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    /// Catalog id, sent back when the option is picked.
    pub id: String,
    pub word: String,
    pub image: String,
}

impl From<&WordEntry> for OptionView {
    fn from(entry: &WordEntry) -> Self {
        Self {
            id: entry.id.clone(),
            word: entry.word.clone(),
            image: entry.image.clone(),
        }
    }
}

/// Memory board piece. Content is only exposed once the piece is face up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieceView {
    /// Position on the board.
    pub index: usize,
    pub state: PieceState,
    /// Whether the piece shows the word or the picture. Hidden while face down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<Face>,
    /// Set for a face-up word piece.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    /// Set for a face-up picture piece.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Syllable bank button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenView {
    /// Position in the shuffled bank.
    pub index: usize,
    pub text: String,
    /// Already placed in the assembled word.
    pub selected: bool,
}

/// Letter bank button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileView {
    /// Position in the shuffled bank.
    pub index: usize,
    pub letter: char,
    /// Already placed in a slot.
    pub used: bool,
}

/// Classification bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketView {
    /// Group key, sent back when the bucket is picked.
    pub key: String,
    /// Spanish name of the group.
    pub label: String,
    pub icon: String,
}

/// Board of the current round, one shape per round kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundView {
    /// Find-the-word or listen-and-choose.
    Choice {
        /// Which of the two choice games this is.
        mode: GameMode,
        instruction: String,
        /// Picture options in display order.
        options: Vec<OptionView>,
    },
    /// Memory board.
    Memory {
        instruction: String,
        pieces: Vec<PieceView>,
        /// Pairs matched so far.
        matched_pairs: usize,
        /// Pairs on the board.
        pairs: usize,
    },
    /// Syllable ordering.
    Syllables {
        instruction: String,
        /// Picture of the target word.
        image: String,
        bank: Vec<TokenView>,
        /// Syllables placed so far, in order.
        assembled: Vec<String>,
    },
    /// Missing letters.
    Spelling {
        instruction: String,
        /// Picture of the target word.
        image: String,
        /// One slot per letter; `None` for a slot still empty.
        slots: Vec<Option<char>>,
        bank: Vec<TileView>,
    },
    /// Sort a picture into its group.
    Classification {
        instruction: String,
        /// Picture to classify.
        image: String,
        buckets: Vec<BucketView>,
    },
}

impl From<&Round> for RoundView {
    fn from(round: &Round) -> Self {
        let instruction = messages::instruction(round);
        match round {
            Round::FindWord(choice) | Round::ListenChoose(choice) => RoundView::Choice {
                mode: round.mode(),
                instruction,
                options: choice
                    .options()
                    .iter()
                    .map(|entry| OptionView::from(entry.as_ref()))
                    .collect(),
            },
            Round::Memory(memory) => RoundView::Memory {
                instruction,
                pieces: memory
                    .pieces()
                    .iter()
                    .enumerate()
                    .map(|(index, piece)| {
                        let visible = piece.state != PieceState::Hidden;
                        PieceView {
                            index,
                            state: piece.state,
                            face: visible.then_some(piece.face),
                            word: (visible && piece.face == Face::Word)
                                .then(|| piece.entry.word.clone()),
                            image: (visible && piece.face == Face::Image)
                                .then(|| piece.entry.image.clone()),
                        }
                    })
                    .collect(),
                matched_pairs: memory.matched_pairs(),
                pairs: memory.pair_count(),
            },
            Round::SyllableOrder(syllables) => RoundView::Syllables {
                instruction,
                image: syllables.target().image.clone(),
                bank: syllables
                    .bank()
                    .iter()
                    .enumerate()
                    .map(|(index, token)| TokenView {
                        index,
                        text: token.text.clone(),
                        selected: token.selected,
                    })
                    .collect(),
                assembled: syllables
                    .assembled()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            },
            Round::Spelling(spelling) => RoundView::Spelling {
                instruction,
                image: spelling.target().image.clone(),
                slots: spelling.slots(),
                bank: spelling
                    .bank()
                    .iter()
                    .enumerate()
                    .map(|(index, tile)| TileView {
                        index,
                        letter: tile.letter,
                        used: tile.used,
                    })
                    .collect(),
            },
            Round::Classification(classification) => RoundView::Classification {
                instruction,
                image: classification.target().image.clone(),
                buckets: classification
                    .buckets()
                    .iter()
                    .map(|bucket| BucketView {
                        key: bucket.key.clone(),
                        label: bucket.label.clone(),
                        icon: bucket.icon.clone(),
                    })
                    .collect(),
            },
        }
    }
}
