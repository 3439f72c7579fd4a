use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::state::content::SYLLABLE_DELIMITER;

/// Root of a catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct CatalogEntity {
    /// Categories in display order.
    #[validate(nested)]
    pub categories: Vec<CategoryEntity>,
}

/// Category definition as stored in the catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct CategoryEntity {
    /// Lookup key (`animales`).
    #[validate(length(min = 1))]
    pub key: String,
    /// Human readable label; falls back to the key when omitted.
    #[serde(default)]
    pub label: Option<String>,
    /// Icon shown on classification buckets.
    #[serde(default)]
    pub icon: Option<String>,
    /// Words of the category.
    #[validate(length(min = 1), nested)]
    pub entries: Vec<WordEntryEntity>,
}

/// Word entry as stored in the catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct WordEntryEntity {
    /// Identifier, unique within the category.
    #[validate(length(min = 1))]
    pub id: String,
    /// Display word, upper case.
    #[validate(length(min = 1), custom(function = "validate_word"))]
    pub word: String,
    /// Syllables joined with `-`.
    #[validate(custom(function = "validate_syllables"))]
    pub syllables: String,
    /// Picture URI.
    pub image: String,
    /// Pronunciation clip name or URL.
    #[serde(default)]
    pub audio: Option<String>,
    /// Recorded syllable breakdown clip.
    #[serde(default)]
    pub syllable_audio: Option<String>,
    /// Associated sound effect clip.
    #[serde(default)]
    pub sound: Option<String>,
}

/// Rejects words that are not already upper case.
fn validate_word(word: &str) -> Result<(), ValidationError> {
    if word.trim().is_empty() {
        let mut err = ValidationError::new("word_blank");
        err.message = Some("word must not be blank".into());
        return Err(err);
    }

    if word != word.to_uppercase() {
        let mut err = ValidationError::new("word_case");
        err.message = Some(format!("word `{word}` must be upper case").into());
        return Err(err);
    }

    Ok(())
}

/// Rejects syllable text with empty segments (`Pe--rro`, `-Pe`, ``).
fn validate_syllables(text: &str) -> Result<(), ValidationError> {
    if text
        .split(SYLLABLE_DELIMITER)
        .any(|segment| segment.trim().is_empty())
    {
        let mut err = ValidationError::new("syllables_format");
        err.message = Some(
            format!("syllables `{text}` must be non-empty segments separated by `-`").into(),
        );
        return Err(err);
    }

    Ok(())
}
