//! Navigation and per-screen session state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::state::{
    content::{Category, WordEntry},
    games::{GameMode, Round},
    state_machine::{InvalidTransition, RoundEvent, RoundPhase, RoundStateMachine},
};

/// Screens the surface can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Category picker.
    #[default]
    Home,
    /// Flashcards.
    Learn,
    /// Game picker.
    GameMenu,
    /// A running game.
    GamePlay,
}

/// Transient per-process state, owned and mutated by the application controller only.
#[derive(Debug, Default)]
pub struct Session {
    screen: Screen,
    category: Option<Arc<Category>>,
    card_index: usize,
    card_generation: u64,
    image_hidden: bool,
    listening: bool,
    mode: Option<GameMode>,
    round: Option<Round>,
    machine: RoundStateMachine,
}

impl Session {
    /// Fresh session on the home screen with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Screen currently displayed.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Record the displayed screen.
    pub fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
    }

    /// Selected category, if any.
    pub fn category(&self) -> Option<&Arc<Category>> {
        self.category.as_ref()
    }

    /// Select a category and rewind to its first card.
    pub fn select_category(&mut self, category: Arc<Category>) {
        self.category = Some(category);
        self.card_index = 0;
        self.bump_card();
    }

    /// Index of the displayed card.
    pub fn card_index(&self) -> usize {
        self.card_index
    }

    /// Entry of the displayed card.
    pub fn current_entry(&self) -> Option<Arc<WordEntry>> {
        self.category.as_ref()?.entry(self.card_index).cloned()
    }

    /// Step to the next card. Returns `false` at the last card.
    pub fn next_card(&mut self) -> bool {
        let Some(category) = &self.category else {
            return false;
        };
        if self.card_index + 1 >= category.len() {
            return false;
        }
        self.card_index += 1;
        self.bump_card();
        true
    }

    /// Step to the previous card. Returns `false` at the first card.
    pub fn prev_card(&mut self) -> bool {
        if self.category.is_none() || self.card_index == 0 {
            return false;
        }
        self.card_index -= 1;
        self.bump_card();
        true
    }

    /// Counter bumped every time the displayed card changes or learn mode is left.
    pub fn card_generation(&self) -> u64 {
        self.card_generation
    }

    /// Invalidate anything scheduled for the current card.
    pub fn bump_card(&mut self) {
        self.card_generation += 1;
    }

    /// Whether card pictures are hidden.
    pub fn image_hidden(&self) -> bool {
        self.image_hidden
    }

    /// Flip the hidden-picture flag, returning the new value.
    pub fn toggle_image(&mut self) -> bool {
        self.image_hidden = !self.image_hidden;
        self.image_hidden
    }

    /// Whether a voice capture is in flight.
    pub fn listening(&self) -> bool {
        self.listening
    }

    /// Record whether a voice capture is in flight.
    pub fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }

    /// Active game mode, if a game is running.
    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    /// Current round, if any.
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// Mutable access to the current round.
    pub fn round_mut(&mut self) -> Option<&mut Round> {
        self.round.as_mut()
    }

    /// Install a freshly generated round.
    pub fn set_round(&mut self, round: Round) {
        self.round = Some(round);
    }

    /// Phase of the current round.
    pub fn phase(&self) -> RoundPhase {
        self.machine.phase()
    }

    /// Generation of the current round.
    pub fn round_generation(&self) -> u64 {
        self.machine.generation()
    }

    /// Whether the current round accepts answers.
    pub fn accepts_input(&self) -> bool {
        self.machine.accepts_input()
    }

    /// Apply a round event.
    pub fn transition(&mut self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        self.machine.apply(event)
    }

    /// Enter `mode`, leaving any running game first.
    pub fn enter_game(&mut self, mode: GameMode) -> Result<RoundPhase, InvalidTransition> {
        self.leave_game();
        self.mode = Some(mode);
        self.machine.apply(RoundEvent::Present)
    }

    /// Drop the running game, if any.
    pub fn leave_game(&mut self) {
        self.mode = None;
        self.round = None;
        // Leave is valid from every phase.
        let _ = self.machine.apply(RoundEvent::Leave);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::games::fixtures::category;

    fn session_with_three_cards() -> Session {
        let mut session = Session::new();
        session.select_category(category(
            "animales",
            &[
                ("a1", "PERRO", "Pe-rro"),
                ("a2", "GATO", "Ga-to"),
                ("a3", "LEÓN", "Le-ón"),
            ],
        ));
        session
    }

    #[test]
    fn card_navigation_stays_in_bounds() {
        let mut session = session_with_three_cards();
        assert!(!session.prev_card());
        assert!(session.next_card());
        assert!(session.next_card());
        assert_eq!(session.current_entry().unwrap().word, "LEÓN");
        assert!(!session.next_card());
        assert_eq!(session.card_index(), 2);
    }

    #[test]
    fn card_moves_bump_generation() {
        let mut session = session_with_three_cards();
        let before = session.card_generation();
        session.next_card();
        assert_ne!(session.card_generation(), before);

        let at_end = session.card_generation();
        session.next_card();
        session.next_card();
        session.next_card();
        assert_eq!(session.card_generation(), at_end + 1);
    }

    #[test]
    fn selecting_category_rewinds() {
        let mut session = session_with_three_cards();
        session.next_card();
        session.select_category(category("frutas", &[("f1", "PERA", "Pe-ra")]));
        assert_eq!(session.card_index(), 0);
        assert_eq!(session.current_entry().unwrap().id, "f1");
    }

    #[test]
    fn entering_a_game_presents_first_round() {
        let mut session = Session::new();
        assert_eq!(
            session.enter_game(GameMode::Memory),
            Ok(RoundPhase::Presented)
        );
        let generation = session.round_generation();

        assert_eq!(
            session.enter_game(GameMode::Spelling),
            Ok(RoundPhase::Presented)
        );
        assert_ne!(session.round_generation(), generation);
        assert_eq!(session.mode(), Some(GameMode::Spelling));

        session.leave_game();
        assert_eq!(session.mode(), None);
        assert_eq!(session.phase(), RoundPhase::Idle);
    }

    #[test]
    fn image_toggle_flips() {
        let mut session = Session::new();
        assert!(session.toggle_image());
        assert!(!session.toggle_image());
    }
}
