//! Missing letters: fill the hidden slots of a word from a letter bank.

use std::sync::Arc;

use rand::Rng;

use crate::state::{
    content::{Category, WordEntry},
    games::RoundError,
    sampling::{permute, pick, sample},
};

/// Letters drawn as distractors for the bank.
pub const ALPHABET: &str = "ABCDEFGHIJKLMNÑOPQRSTUVWXYZ";
/// Number of random letters added to the bank.
pub const DISTRACTOR_LETTERS: usize = 3;
/// Words up to this many letters hide a single letter; longer ones hide two.
pub const SHORT_WORD_LEN: usize = 3;

/// One button of the letter bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterTile {
    /// Letter shown on the tile.
    pub letter: char,
    /// Whether the tile already filled a slot.
    pub used: bool,
}

/// Result of picking a letter tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterOutcome {
    /// The tile does not exist, was already used, or the word is complete.
    Ignored,
    /// The letter filled the next empty slot.
    Placed {
        /// Whether every slot is now filled.
        complete: bool,
    },
    /// The letter does not belong in the next empty slot; nothing changed.
    Rejected,
}

/// Spelling round: fill the hidden letters of the target word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellingRound {
    target: Arc<WordEntry>,
    letters: Vec<char>,
    hidden: Vec<usize>,
    filled: usize,
    bank: Vec<LetterTile>,
}

impl SpellingRound {
    /// Pick a random target, hide its letters and build the letter bank.
    pub fn generate<R: Rng + ?Sized>(category: &Category, rng: &mut R) -> Result<Self, RoundError> {
        let target = pick(rng, &category.entries)
            .cloned()
            .ok_or_else(|| RoundError::EmptyCategory(category.key.clone()))?;
        Ok(Self::for_target(target, rng))
    }

    /// Build the round for a known target.
    pub fn for_target<R: Rng + ?Sized>(target: Arc<WordEntry>, rng: &mut R) -> Self {
        let count = target.letter_count();
        let hide = if count <= SHORT_WORD_LEN { 1 } else { 2 };
        let letters: Vec<char> = target.word.chars().collect();
        let positions: Vec<usize> = (0..count).collect();
        let mut hidden = sample(rng, &positions, hide);
        hidden.sort_unstable();

        let alphabet: Vec<char> = ALPHABET.chars().collect();
        let mut bank: Vec<LetterTile> = hidden
            .iter()
            .map(|&index| letters[index])
            .chain((0..DISTRACTOR_LETTERS).filter_map(|_| pick(rng, &alphabet).copied()))
            .map(|letter| LetterTile {
                letter,
                used: false,
            })
            .collect();
        permute(rng, &mut bank);

        Self {
            target,
            letters,
            hidden,
            filled: 0,
            bank,
        }
    }

    /// Entry being spelled.
    pub fn target(&self) -> &Arc<WordEntry> {
        &self.target
    }

    /// Indices of the hidden letters, left to right.
    pub fn hidden_indices(&self) -> &[usize] {
        &self.hidden
    }

    /// Letter bank in display order.
    pub fn bank(&self) -> &[LetterTile] {
        &self.bank
    }

    /// Word slots as displayed: `None` for a slot still empty.
    pub fn slots(&self) -> Vec<Option<char>> {
        let pending = &self.hidden[self.filled..];
        self.letters
            .iter()
            .enumerate()
            .map(|(index, letter)| (!pending.contains(&index)).then_some(*letter))
            .collect()
    }

    /// Whether every hidden slot is filled.
    pub fn is_complete(&self) -> bool {
        self.filled == self.hidden.len()
    }

    /// Pick the bank tile at `index` for the leftmost empty slot.
    pub fn pick(&mut self, index: usize) -> LetterOutcome {
        let Some(&slot) = self.hidden.get(self.filled) else {
            return LetterOutcome::Ignored;
        };
        let Some(tile) = self.bank.get_mut(index) else {
            return LetterOutcome::Ignored;
        };
        if tile.used {
            return LetterOutcome::Ignored;
        }
        if tile.letter != self.letters[slot] {
            return LetterOutcome::Rejected;
        }

        tile.used = true;
        self.filled += 1;
        LetterOutcome::Placed {
            complete: self.is_complete(),
        }
    }
}
