//! Memory board: pairs of word and picture pieces, two flips per attempt.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::state::{
    content::{Category, WordEntry},
    games::RoundError,
    sampling::{permute, sample},
};

/// Maximum number of pairs on one board.
pub const MAX_PAIRS: usize = 6;

/// Which representation of an entry a piece shows once face up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    /// The entry's picture.
    Image,
    /// The entry's word.
    Word,
}

/// Visibility of a board piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceState {
    /// Face down.
    Hidden,
    /// Face up, waiting to be checked.
    Revealed,
    /// Paired and locked face up.
    Matched,
}

/// One piece of the memory board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryPiece {
    /// Entry the piece represents; its id is the pairing key.
    pub entry: Arc<WordEntry>,
    /// Representation shown when face up.
    pub face: Face,
    /// Current visibility.
    pub state: PieceState,
}

impl MemoryPiece {
    /// Pairing key shared with the sibling piece.
    pub fn pairing_key(&self) -> &str {
        &self.entry.id
    }
}

/// Result of flipping a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// The flip was not allowed (out of range, already face up, or a pair is pending).
    Ignored,
    /// First piece of a pair is face up.
    Revealed,
    /// Second piece is face up; the pair must now be resolved.
    PairReady,
}

/// Result of resolving the two face-up pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// The pieces match and stay face up.
    Matched {
        /// Whether every pair on the board is now matched.
        complete: bool,
    },
    /// The pieces differ and were turned face down again.
    Mismatched,
}

/// Board-wide memory round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRound {
    pieces: Vec<MemoryPiece>,
    revealed: Vec<usize>,
    matched_pairs: usize,
}

impl MemoryRound {
    /// Pick up to [`MAX_PAIRS`] entries and lay out an image piece and a word piece
    /// for each, in random order.
    pub fn generate<R: Rng + ?Sized>(category: &Category, rng: &mut R) -> Result<Self, RoundError> {
        if category.is_empty() {
            return Err(RoundError::EmptyCategory(category.key.clone()));
        }

        let chosen = sample(rng, &category.entries, MAX_PAIRS);
        let mut pieces: Vec<MemoryPiece> = chosen
            .into_iter()
            .flat_map(|entry| {
                [Face::Image, Face::Word].map(|face| MemoryPiece {
                    entry: entry.clone(),
                    face,
                    state: PieceState::Hidden,
                })
            })
            .collect();
        permute(rng, &mut pieces);

        Ok(Self {
            pieces,
            revealed: Vec::with_capacity(2),
            matched_pairs: 0,
        })
    }

    /// Board pieces in display order.
    pub fn pieces(&self) -> &[MemoryPiece] {
        &self.pieces
    }

    /// Number of pairs on the board.
    pub fn pair_count(&self) -> usize {
        self.pieces.len() / 2
    }

    /// Number of pairs matched so far.
    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    /// Whether two pieces are face up and waiting for [`MemoryRound::resolve`].
    pub fn pair_pending(&self) -> bool {
        self.revealed.len() == 2
    }

    /// Whether every pair is matched.
    pub fn is_complete(&self) -> bool {
        self.matched_pairs == self.pair_count()
    }

    /// Turn the piece at `index` face up.
    pub fn flip(&mut self, index: usize) -> FlipOutcome {
        if self.pair_pending() {
            return FlipOutcome::Ignored;
        }
        let Some(piece) = self.pieces.get_mut(index) else {
            return FlipOutcome::Ignored;
        };
        if piece.state != PieceState::Hidden {
            return FlipOutcome::Ignored;
        }

        piece.state = PieceState::Revealed;
        self.revealed.push(index);
        if self.pair_pending() {
            FlipOutcome::PairReady
        } else {
            FlipOutcome::Revealed
        }
    }

    /// Check the two face-up pieces. Returns `None` when no pair is pending.
    ///
    /// A match needs the same pairing key on two different faces.
    pub fn resolve(&mut self) -> Option<PairOutcome> {
        let [first, second] = self.revealed[..] else {
            return None;
        };
        self.revealed.clear();

        let matched = {
            let (a, b) = (&self.pieces[first], &self.pieces[second]);
            a.pairing_key() == b.pairing_key() && a.face != b.face
        };

        let state = if matched {
            PieceState::Matched
        } else {
            PieceState::Hidden
        };
        self.pieces[first].state = state;
        self.pieces[second].state = state;

        if matched {
            self.matched_pairs += 1;
            Some(PairOutcome::Matched {
                complete: self.is_complete(),
            })
        } else {
            Some(PairOutcome::Mismatched)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::games::fixtures::{animals, category};

    fn sibling(round: &MemoryRound, index: usize) -> usize {
        let piece = &round.pieces()[index];
        round
            .pieces()
            .iter()
            .position(|other| other.pairing_key() == piece.pairing_key() && other.face != piece.face)
            .unwrap()
    }

    fn stranger(round: &MemoryRound, index: usize) -> usize {
        let key = round.pieces()[index].pairing_key().to_string();
        round
            .pieces()
            .iter()
            .position(|other| other.pairing_key() != key)
            .unwrap()
    }

    #[test]
    fn board_has_one_image_and_one_word_per_key() {
        let mut rng = StdRng::seed_from_u64(4);
        let round = MemoryRound::generate(&animals(), &mut rng).unwrap();
        assert_eq!(round.pieces().len(), 2 * MAX_PAIRS);

        let mut faces: HashMap<&str, Vec<Face>> = HashMap::new();
        for piece in round.pieces() {
            faces.entry(piece.pairing_key()).or_default().push(piece.face);
        }
        assert_eq!(faces.len(), MAX_PAIRS);
        for kinds in faces.values() {
            assert_eq!(kinds.len(), 2);
            assert!(kinds.contains(&Face::Image) && kinds.contains(&Face::Word));
        }
    }

    #[test]
    fn small_category_uses_every_entry() {
        let mut rng = StdRng::seed_from_u64(4);
        let small = category("c", &[("a1", "PERRO", "Pe-rro"), ("a2", "GATO", "Ga-to")]);
        let round = MemoryRound::generate(&small, &mut rng).unwrap();
        assert_eq!(round.pieces().len(), 4);
        assert_eq!(round.pair_count(), 2);
    }

    #[test]
    fn matching_pair_stays_face_up() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut round = MemoryRound::generate(&animals(), &mut rng).unwrap();
        let other = sibling(&round, 0);

        assert_eq!(round.flip(0), FlipOutcome::Revealed);
        assert_eq!(round.flip(other), FlipOutcome::PairReady);
        assert_eq!(
            round.resolve(),
            Some(PairOutcome::Matched { complete: false })
        );
        assert_eq!(round.pieces()[0].state, PieceState::Matched);
        assert_eq!(round.flip(0), FlipOutcome::Ignored);
        assert_eq!(round.matched_pairs(), 1);
    }

    #[test]
    fn mismatched_pair_flips_back() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut round = MemoryRound::generate(&animals(), &mut rng).unwrap();
        let other = stranger(&round, 0);

        round.flip(0);
        round.flip(other);
        assert_eq!(round.resolve(), Some(PairOutcome::Mismatched));
        assert_eq!(round.pieces()[0].state, PieceState::Hidden);
        assert_eq!(round.pieces()[other].state, PieceState::Hidden);
        assert_eq!(round.resolve(), None);
    }

    #[test]
    fn flips_are_blocked_while_pair_pending() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut round = MemoryRound::generate(&animals(), &mut rng).unwrap();
        round.flip(0);
        assert_eq!(round.flip(0), FlipOutcome::Ignored);
        round.flip(1);
        assert!(round.pair_pending());
        assert_eq!(round.flip(2), FlipOutcome::Ignored);
        assert_eq!(round.flip(99), FlipOutcome::Ignored);
    }

    #[test]
    fn matching_every_pair_completes_board() {
        let mut rng = StdRng::seed_from_u64(13);
        let small = category(
            "c",
            &[
                ("a1", "PERRO", "Pe-rro"),
                ("a2", "GATO", "Ga-to"),
                ("a3", "LEÓN", "Le-ón"),
            ],
        );
        let mut round = MemoryRound::generate(&small, &mut rng).unwrap();
        let mut last = None;
        for index in 0..round.pieces().len() {
            if round.pieces()[index].state != PieceState::Hidden {
                continue;
            }
            let other = sibling(&round, index);
            round.flip(index);
            round.flip(other);
            last = round.resolve();
        }
        assert_eq!(last, Some(PairOutcome::Matched { complete: true }));
        assert!(round.is_complete());
    }
}
