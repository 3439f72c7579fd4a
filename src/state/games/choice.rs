//! Find-the-word and listen-and-choose: pick the picture of the target among three.

use std::sync::Arc;

use rand::Rng;

use crate::state::{
    content::{Category, WordEntry},
    games::{RoundError, Verdict},
    sampling::{permute, pick, sample},
};

/// Upper bound on wrong answers shown next to the target.
pub const MAX_DISTRACTORS: usize = 2;

/// Multiple-choice round shared by find-the-word and listen-and-choose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceRound {
    target: Arc<WordEntry>,
    options: Vec<Arc<WordEntry>>,
}

impl ChoiceRound {
    /// Pick a random target from `category` and build its option set.
    pub fn generate<R: Rng + ?Sized>(category: &Category, rng: &mut R) -> Result<Self, RoundError> {
        let target = pick(rng, &category.entries)
            .cloned()
            .ok_or_else(|| RoundError::EmptyCategory(category.key.clone()))?;
        Ok(Self::for_target(category, target, rng))
    }

    /// Build the option set around a known target: up to [`MAX_DISTRACTORS`] other
    /// entries sampled without replacement, then shuffled together with the target.
    pub fn for_target<R: Rng + ?Sized>(
        category: &Category,
        target: Arc<WordEntry>,
        rng: &mut R,
    ) -> Self {
        let pool: Vec<Arc<WordEntry>> = category
            .entries
            .iter()
            .filter(|entry| entry.id != target.id)
            .cloned()
            .collect();

        let mut options = sample(rng, &pool, MAX_DISTRACTORS);
        options.push(target.clone());
        permute(rng, &mut options);

        Self { target, options }
    }

    /// Entry the player has to find.
    pub fn target(&self) -> &Arc<WordEntry> {
        &self.target
    }

    /// Options in display order.
    pub fn options(&self) -> &[Arc<WordEntry>] {
        &self.options
    }

    /// Evaluate a selected option id. Ids not on display yield `None`.
    pub fn evaluate(&self, option_id: &str) -> Option<Verdict> {
        if !self.options.iter().any(|option| option.id == option_id) {
            return None;
        }

        Some(if option_id == self.target.id {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::games::fixtures::{animals, category};

    #[test]
    fn three_or_more_entries_yield_three_distinct_options() {
        let animals = animals();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let round = ChoiceRound::generate(&animals, &mut rng).unwrap();
            assert_eq!(round.options().len(), 3);
            let ids: HashSet<_> = round.options().iter().map(|entry| &entry.id).collect();
            assert_eq!(ids.len(), 3);
            let target_hits = round
                .options()
                .iter()
                .filter(|entry| entry.id == round.target().id)
                .count();
            assert_eq!(target_hits, 1);
        }
    }

    #[test]
    fn option_count_adapts_to_small_categories() {
        let mut rng = StdRng::seed_from_u64(1);
        let two = category("c", &[("a1", "PERRO", "Pe-rro"), ("a2", "GATO", "Ga-to")]);
        assert_eq!(ChoiceRound::generate(&two, &mut rng).unwrap().options().len(), 2);

        let one = category("c", &[("a1", "PERRO", "Pe-rro")]);
        let round = ChoiceRound::generate(&one, &mut rng).unwrap();
        assert_eq!(round.options().len(), 1);
        assert_eq!(round.options()[0].id, "a1");
    }

    #[test]
    fn empty_category_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let empty = category("vacia", &[]);
        assert_eq!(
            ChoiceRound::generate(&empty, &mut rng),
            Err(RoundError::EmptyCategory("vacia".into()))
        );
    }

    #[test]
    fn selecting_target_is_correct() {
        let three = category(
            "animales",
            &[
                ("a1", "PERRO", "Pe-rro"),
                ("a2", "GATO", "Ga-to"),
                ("a3", "LEÓN", "Le-ón"),
            ],
        );
        let gato = three.entries[1].clone();
        let mut rng = StdRng::seed_from_u64(9);
        let round = ChoiceRound::for_target(&three, gato, &mut rng);

        assert_eq!(round.options().len(), 3);
        assert_eq!(round.evaluate("a2"), Some(Verdict::Correct));
        assert_eq!(round.evaluate("a1"), Some(Verdict::Incorrect));
        assert_eq!(round.evaluate("a3"), Some(Verdict::Incorrect));
        assert_eq!(round.evaluate("zz"), None);
    }
}
