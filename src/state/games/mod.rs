//! Round generation and answer evaluation for the six game modes.

pub mod choice;
pub mod classification;
pub mod memory;
pub mod spelling;
pub mod syllables;

use std::{fmt, str::FromStr, sync::Arc};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{dao::catalog::ContentRepository, state::content::Category};

pub use self::{
    choice::ChoiceRound,
    classification::{Bucket, ClassificationRound},
    memory::{Face, FlipOutcome, MemoryPiece, MemoryRound, PairOutcome, PieceState},
    spelling::{LetterOutcome, LetterTile, SpellingRound},
    syllables::{SyllableRound, SyllableToken},
};

/// Playable game modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Read the word, pick its picture.
    FindWord,
    /// Hear the word, pick its picture.
    ListenChoose,
    /// Match each picture with its word.
    Memory,
    /// Rebuild a word from shuffled syllables.
    SyllableOrder,
    /// Fill the missing letters of a word.
    Spelling,
    /// Put a picture into its category.
    Classification,
}

impl GameMode {
    /// Every mode in menu order.
    pub const ALL: [GameMode; 6] = [
        GameMode::FindWord,
        GameMode::ListenChoose,
        GameMode::Memory,
        GameMode::SyllableOrder,
        GameMode::Spelling,
        GameMode::Classification,
    ];

    /// Whether rounds are drawn from the selected category rather than the whole catalog.
    pub fn needs_category(self) -> bool {
        !matches!(self, GameMode::Classification)
    }

    fn as_str(self) -> &'static str {
        match self {
            GameMode::FindWord => "find_word",
            GameMode::ListenChoose => "listen_choose",
            GameMode::Memory => "memory",
            GameMode::SyllableOrder => "syllable_order",
            GameMode::Spelling => "spelling",
            GameMode::Classification => "classification",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = RoundError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| RoundError::UnknownMode(value.to_string()))
    }
}

/// Result of evaluating one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The answer was right.
    Correct,
    /// The answer was wrong; the round stays open.
    Incorrect,
}

/// Reasons a round cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// A single-category mode was requested with no category selected.
    #[error("no category selected")]
    NoCategory,
    /// The selected category has no entries.
    #[error("category `{0}` has no entries")]
    EmptyCategory(String),
    /// The catalog has no usable category.
    #[error("catalog has no categories")]
    EmptyCatalog,
    /// The mode name is not recognised.
    #[error("unknown game mode `{0}`")]
    UnknownMode(String),
}

/// A live round, one variant per mode with its own working state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Round {
    /// Written prompt, picture options.
    FindWord(ChoiceRound),
    /// Spoken prompt, picture options.
    ListenChoose(ChoiceRound),
    /// Board of face-down pieces.
    Memory(MemoryRound),
    /// Shuffled syllable bank.
    SyllableOrder(SyllableRound),
    /// Word with hidden letters and a letter bank.
    Spelling(SpellingRound),
    /// Picture and category buckets.
    Classification(ClassificationRound),
}

impl Round {
    /// Generate a fresh round for `mode`.
    ///
    /// Single-category modes draw from `category`; classification draws from the
    /// whole `content` repository.
    pub fn generate<R: Rng + ?Sized>(
        mode: GameMode,
        category: Option<&Arc<Category>>,
        content: &dyn ContentRepository,
        rng: &mut R,
    ) -> Result<Self, RoundError> {
        let selected = || category.ok_or(RoundError::NoCategory);
        let round = match mode {
            GameMode::FindWord => Round::FindWord(ChoiceRound::generate(selected()?, rng)?),
            GameMode::ListenChoose => {
                Round::ListenChoose(ChoiceRound::generate(selected()?, rng)?)
            }
            GameMode::Memory => Round::Memory(MemoryRound::generate(selected()?, rng)?),
            GameMode::SyllableOrder => {
                Round::SyllableOrder(SyllableRound::generate(selected()?, rng)?)
            }
            GameMode::Spelling => Round::Spelling(SpellingRound::generate(selected()?, rng)?),
            GameMode::Classification => {
                Round::Classification(ClassificationRound::generate(content, rng)?)
            }
        };
        Ok(round)
    }

    /// Mode this round belongs to.
    pub fn mode(&self) -> GameMode {
        match self {
            Round::FindWord(_) => GameMode::FindWord,
            Round::ListenChoose(_) => GameMode::ListenChoose,
            Round::Memory(_) => GameMode::Memory,
            Round::SyllableOrder(_) => GameMode::SyllableOrder,
            Round::Spelling(_) => GameMode::Spelling,
            Round::Classification(_) => GameMode::Classification,
        }
    }
}
