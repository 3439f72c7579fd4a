//! Content repository backed by a JSON catalog document.

use std::{collections::HashSet, fs, io, path::Path, sync::Arc};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{CatalogEntity, CategoryEntity, WordEntryEntity},
    state::content::{Category, WordEntry, split_syllables},
};

/// Catalog shipped with the binary.
const BUILTIN_CATALOG: &str = include_str!("../../assets/catalog.json");

/// Read-only access to the word catalog.
pub trait ContentRepository: Send + Sync {
    /// Category registered under `name`.
    fn category(&self, name: &str) -> Option<Arc<Category>>;
    /// Category keys in catalog order.
    fn category_names(&self) -> Vec<String>;
}

/// Failures raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The document is not valid JSON for the catalog schema.
    #[error("failed to parse catalog")]
    Parse(#[from] serde_json::Error),
    /// A field failed validation.
    #[error("invalid catalog: {0}")]
    Invalid(#[from] ValidationErrors),
    /// Two entries of one category share an identifier.
    #[error("duplicate entry id `{id}` in category `{category}`")]
    DuplicateId { category: String, id: String },
    /// Two categories share a key.
    #[error("duplicate category `{0}`")]
    DuplicateCategory(String),
    /// The document declares no categories at all.
    #[error("catalog has no categories")]
    Empty,
}

/// Immutable catalog of categories keyed by name, in document order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: IndexMap<String, Arc<Category>>,
}

impl Catalog {
    /// Parse the catalog embedded in the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Load and validate a catalog file.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            categories = catalog.categories.len(),
            "loaded catalog from file"
        );
        Ok(catalog)
    }

    /// Parse and validate a catalog document.
    pub fn from_json(contents: &str) -> Result<Self, CatalogError> {
        let entity: CatalogEntity = serde_json::from_str(contents)?;
        Self::try_from(entity)
    }

    /// Build a catalog directly from domain categories.
    pub fn from_categories(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            categories: categories
                .into_iter()
                .map(|category| (category.key.clone(), Arc::new(category)))
                .collect(),
        }
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the catalog has no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl ContentRepository for Catalog {
    fn category(&self, name: &str) -> Option<Arc<Category>> {
        self.categories.get(name).cloned()
    }

    fn category_names(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }
}

impl TryFrom<CatalogEntity> for Catalog {
    type Error = CatalogError;

    fn try_from(value: CatalogEntity) -> Result<Self, Self::Error> {
        value.validate()?;
        if value.categories.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut categories = IndexMap::with_capacity(value.categories.len());
        for entity in value.categories {
            let category = Category::try_from(entity)?;
            if categories.contains_key(&category.key) {
                return Err(CatalogError::DuplicateCategory(category.key));
            }
            categories.insert(category.key.clone(), Arc::new(category));
        }

        Ok(Self { categories })
    }
}

impl TryFrom<CategoryEntity> for Category {
    type Error = CatalogError;

    fn try_from(value: CategoryEntity) -> Result<Self, Self::Error> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(value.entries.len());
        for entry in value.entries {
            if !seen.insert(entry.id.clone()) {
                return Err(CatalogError::DuplicateId {
                    category: value.key,
                    id: entry.id,
                });
            }
            entries.push(Arc::new(WordEntry::from(entry)));
        }

        Ok(Self {
            label: value.label.unwrap_or_else(|| value.key.clone()),
            icon: value.icon.unwrap_or_default(),
            key: value.key,
            entries,
        })
    }
}

impl From<WordEntryEntity> for WordEntry {
    fn from(value: WordEntryEntity) -> Self {
        Self {
            id: value.id,
            syllables: split_syllables(&value.syllables),
            word: value.word,
            syllable_text: value.syllables,
            image: value.image,
            audio: non_blank(value.audio),
            syllable_audio: non_blank(value.syllable_audio),
            sound: non_blank(value.sound),
        }
    }
}

/// Treat empty clip names as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|name| !name.trim().is_empty())
}
