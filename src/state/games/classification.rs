//! Classification: sort a picture into the group it belongs to.

use std::sync::Arc;

use rand::Rng;

use crate::{
    dao::catalog::ContentRepository,
    state::{
        content::{Category, WordEntry},
        games::{RoundError, Verdict},
        sampling::{permute, pick, sample},
    },
};

/// Upper bound on wrong buckets shown next to the true category.
pub const MAX_OTHER_BUCKETS: usize = 2;

/// One category bucket offered to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Category key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Display icon.
    pub icon: String,
}

impl From<&Category> for Bucket {
    fn from(category: &Category) -> Self {
        Self {
            key: category.key.clone(),
            label: category.label.clone(),
            icon: category.icon.clone(),
        }
    }
}

/// Classification round: place one picture into its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRound {
    target: Arc<WordEntry>,
    category: String,
    buckets: Vec<Bucket>,
}

impl ClassificationRound {
    /// Pick a random category of the whole catalog, a random entry in it, and up
    /// to [`MAX_OTHER_BUCKETS`] other categories as wrong buckets.
    pub fn generate<R: Rng + ?Sized>(
        content: &dyn ContentRepository,
        rng: &mut R,
    ) -> Result<Self, RoundError> {
        let names: Vec<String> = content
            .category_names()
            .into_iter()
            .filter(|name| content.category(name).is_some_and(|category| !category.is_empty()))
            .collect();
        let chosen = pick(rng, &names).ok_or(RoundError::EmptyCatalog)?;
        let category = content.category(chosen).ok_or(RoundError::EmptyCatalog)?;
        let target = pick(rng, &category.entries)
            .cloned()
            .ok_or_else(|| RoundError::EmptyCategory(category.key.clone()))?;

        let others: Vec<Arc<Category>> = content
            .category_names()
            .iter()
            .filter(|name| *name != &category.key)
            .filter_map(|name| content.category(name))
            .collect();

        let mut buckets: Vec<Bucket> = sample(rng, &others, MAX_OTHER_BUCKETS)
            .iter()
            .map(|other| Bucket::from(other.as_ref()))
            .collect();
        buckets.push(Bucket::from(category.as_ref()));
        permute(rng, &mut buckets);

        Ok(Self {
            target,
            category: category.key.clone(),
            buckets,
        })
    }

    /// Entry to classify.
    pub fn target(&self) -> &Arc<WordEntry> {
        &self.target
    }

    /// Key of the category the entry belongs to.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Buckets in display order.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Bucket registered under `key`, if on display.
    pub fn bucket(&self, key: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|bucket| bucket.key == key)
    }

    /// Evaluate a chosen bucket. Buckets not on display yield `None`.
    pub fn evaluate(&self, key: &str) -> Option<Verdict> {
        self.bucket(key)?;
        Some(if key == self.category {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        })
    }
}
