//! Syllable ordering: rebuild the target word from a shuffled syllable bank.

use std::sync::Arc;

use rand::Rng;

use crate::state::{
    content::{Category, WordEntry},
    games::{RoundError, Verdict},
    sampling::{permute, pick},
};

/// One button of the syllable bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllableToken {
    /// Syllable text.
    pub text: String,
    /// Whether the token has already been placed in the answer.
    pub selected: bool,
}

/// Syllable-ordering round: rebuild the target word from a shuffled bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllableRound {
    target: Arc<WordEntry>,
    bank: Vec<SyllableToken>,
    answer: Vec<usize>,
}

impl SyllableRound {
    /// Pick a random target and shuffle its syllables into the bank.
    ///
    /// The shuffle may reproduce the canonical order; no re-shuffle is attempted.
    pub fn generate<R: Rng + ?Sized>(category: &Category, rng: &mut R) -> Result<Self, RoundError> {
        let target = pick(rng, &category.entries)
            .cloned()
            .ok_or_else(|| RoundError::EmptyCategory(category.key.clone()))?;
        Ok(Self::for_target(target, rng))
    }

    /// Build the bank for a known target.
    pub fn for_target<R: Rng + ?Sized>(target: Arc<WordEntry>, rng: &mut R) -> Self {
        let mut bank: Vec<SyllableToken> = target
            .syllables
            .iter()
            .map(|text| SyllableToken {
                text: text.clone(),
                selected: false,
            })
            .collect();
        permute(rng, &mut bank);

        Self {
            target,
            bank,
            answer: Vec::new(),
        }
    }

    /// Entry being rebuilt.
    pub fn target(&self) -> &Arc<WordEntry> {
        &self.target
    }

    /// Token bank in display order.
    pub fn bank(&self) -> &[SyllableToken] {
        &self.bank
    }

    /// Syllables assembled so far, in selection order.
    pub fn assembled(&self) -> Vec<&str> {
        self.answer
            .iter()
            .map(|&index| self.bank[index].text.as_str())
            .collect()
    }

    /// Append the bank token at `index` to the answer. Returns `false` when the
    /// token does not exist or was already used.
    pub fn select(&mut self, index: usize) -> bool {
        match self.bank.get_mut(index) {
            Some(token) if !token.selected => {
                token.selected = true;
                self.answer.push(index);
                true
            }
            _ => false,
        }
    }

    /// Compare the assembled answer with the canonical order.
    ///
    /// A wrong answer clears the selection so every token is available again.
    pub fn check(&mut self) -> Verdict {
        let assembled = self.assembled();
        let correct = assembled.len() == self.target.syllables.len()
            && assembled
                .iter()
                .zip(&self.target.syllables)
                .all(|(given, expected)| *given == expected.as_str());

        if correct {
            Verdict::Correct
        } else {
            self.reset();
            Verdict::Incorrect
        }
    }

    fn reset(&mut self) {
        self.answer.clear();
        for token in &mut self.bank {
            token.selected = false;
        }
    }
}
