//! Random selection primitives shared by every round generator.
//!
//! All helpers take the random source explicitly so callers can seed it.

use rand::{
    Rng,
    seq::{IndexedRandom, SliceRandom, index},
};

/// Pick `amount` distinct items without replacement, returned in random order.
///
/// `amount` is clamped to the number of available items.
pub fn sample<T: Clone, R: Rng + ?Sized>(rng: &mut R, items: &[T], amount: usize) -> Vec<T> {
    let amount = amount.min(items.len());
    let mut picked: Vec<T> = index::sample(rng, items.len(), amount)
        .into_iter()
        .map(|position| items[position].clone())
        .collect();
    permute(rng, &mut picked);
    picked
}

/// Uniform in-place permutation (Fisher-Yates).
pub fn permute<T, R: Rng + ?Sized>(rng: &mut R, items: &mut [T]) {
    items.shuffle(rng);
}

/// Uniform pick of one item.
pub fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    items.choose(rng)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn sample_never_repeats_items() {
        let mut rng = StdRng::seed_from_u64(7);
        let items: Vec<u32> = (0..10).collect();
        for _ in 0..50 {
            let picked = sample(&mut rng, &items, 4);
            assert_eq!(picked.len(), 4);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), 4);
        }
    }

    #[test]
    fn sample_clamps_to_pool_size() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample(&mut rng, &[1, 2], 5).len(), 2);
        assert!(sample::<u8, _>(&mut rng, &[], 2).is_empty());
    }

    #[test]
    fn permute_keeps_multiset() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut items = vec!["a", "b", "b", "c"];
        permute(&mut rng, &mut items);
        items.sort();
        assert_eq!(items, vec!["a", "b", "b", "c"]);
    }

    #[test]
    fn pick_on_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(pick::<u8, _>(&mut rng, &[]), None);
        assert_eq!(pick(&mut rng, &[9]), Some(&9));
    }
}
