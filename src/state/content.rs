//! Vocabulary entries and the categories that group them.

use std::sync::Arc;

/// Delimiter separating syllables in the catalog's syllable text (`Pe-rro`).
pub const SYLLABLE_DELIMITER: char = '-';

/// One learnable item: a word with its syllables, picture and optional audio clips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    /// Identifier unique within the owning category (`a1`, `fa3`, ...).
    pub id: String,
    /// Upper-case display word.
    pub word: String,
    /// Syllable text as authored, shown under the card word.
    pub syllable_text: String,
    /// Syllables in canonical order, never empty and never containing the delimiter.
    pub syllables: Vec<String>,
    /// Picture shown on the card.
    pub image: String,
    /// Pronunciation clip for the whole word.
    pub audio: Option<String>,
    /// Recorded syllable breakdown; replaces the synthesized fallback when present.
    pub syllable_audio: Option<String>,
    /// Sound effect associated with the word (a bark, a bite...).
    pub sound: Option<String>,
}

impl WordEntry {
    /// Number of letters in the display word, counted in characters.
    pub fn letter_count(&self) -> usize {
        self.word.chars().count()
    }
}

/// Split authored syllable text into its trimmed, non-empty segments.
pub fn split_syllables(text: &str) -> Vec<String> {
    text.split(SYLLABLE_DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Named, ordered collection of words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Lookup key (`animales`).
    pub key: String,
    /// Human readable label (`Animales`).
    pub label: String,
    /// Icon shown on classification buckets.
    pub icon: String,
    /// Words in display order.
    pub entries: Vec<Arc<WordEntry>>,
}

impl Category {
    /// Number of words in the category.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the category has no words.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Word at `index`, if in bounds.
    pub fn entry(&self, index: usize) -> Option<&Arc<WordEntry>> {
        self.entries.get(index)
    }
}
