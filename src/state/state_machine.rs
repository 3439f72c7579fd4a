use thiserror::Error;

use crate::state::games::Verdict;

/// Phases every game round goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundPhase {
    /// No round is running.
    #[default]
    Idle,
    /// A round was generated and rendered; input is not accepted yet.
    Presented,
    /// The round accepts answers.
    AwaitingInput,
    /// An answer was evaluated.
    Evaluated(Verdict),
}

/// Events that can be applied to the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundEvent {
    /// Present the first round of a game.
    Present,
    /// Open the presented round for input.
    Arm,
    /// Record the verdict of an answer.
    Evaluate(Verdict),
    /// Keep playing the same round after an evaluation.
    Resume,
    /// Move to a freshly generated round after a correct answer.
    Advance,
    /// Leave the game entirely.
    Leave,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: RoundPhase,
    /// The event that cannot be applied from this phase.
    pub event: RoundEvent,
}

/// State machine shared by the six game modes.
///
/// ```text
/// Idle --Present--> Presented --Arm--> AwaitingInput --Evaluate--> Evaluated
///                       ^                     ^                       |
///                       |                     +--------Resume---------+
///                       +-------------------Advance (Correct)---------+
/// ```
///
/// `Leave` returns to `Idle` from anywhere.
#[derive(Debug, Clone, Default)]
pub struct RoundStateMachine {
    phase: RoundPhase,
    generation: u64,
}

impl RoundStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Current round generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether answers are currently accepted.
    pub fn accepts_input(&self) -> bool {
        self.phase == RoundPhase::AwaitingInput
    }

    /// Apply an event, returning the new phase.
    pub fn apply(&mut self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        if matches!(
            event,
            RoundEvent::Present | RoundEvent::Advance | RoundEvent::Leave
        ) {
            self.generation += 1;
        }
        self.phase = next;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: RoundEvent) -> Result<RoundPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (RoundPhase::Idle, RoundEvent::Present) => RoundPhase::Presented,
            (RoundPhase::Presented, RoundEvent::Arm) => RoundPhase::AwaitingInput,
            (RoundPhase::AwaitingInput, RoundEvent::Evaluate(verdict)) => {
                RoundPhase::Evaluated(verdict)
            }
            (RoundPhase::Evaluated(_), RoundEvent::Resume) => RoundPhase::AwaitingInput,
            (RoundPhase::Evaluated(Verdict::Correct), RoundEvent::Advance) => {
                RoundPhase::Presented
            }
            (_, RoundEvent::Leave) => RoundPhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut RoundStateMachine, event: RoundEvent) -> RoundPhase {
        sm.apply(event).unwrap()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = RoundStateMachine::new();
        assert_eq!(sm.phase(), RoundPhase::Idle);
        assert_eq!(sm.generation(), 0);
        assert!(!sm.accepts_input());
    }

    #[test]
    fn full_loop_through_rounds() {
        let mut sm = RoundStateMachine::new();

        assert_eq!(apply(&mut sm, RoundEvent::Present), RoundPhase::Presented);
        assert_eq!(apply(&mut sm, RoundEvent::Arm), RoundPhase::AwaitingInput);
        assert_eq!(
            apply(&mut sm, RoundEvent::Evaluate(Verdict::Incorrect)),
            RoundPhase::Evaluated(Verdict::Incorrect)
        );
        assert_eq!(apply(&mut sm, RoundEvent::Resume), RoundPhase::AwaitingInput);
        assert_eq!(
            apply(&mut sm, RoundEvent::Evaluate(Verdict::Correct)),
            RoundPhase::Evaluated(Verdict::Correct)
        );
        assert_eq!(apply(&mut sm, RoundEvent::Advance), RoundPhase::Presented);
        assert_eq!(apply(&mut sm, RoundEvent::Leave), RoundPhase::Idle);
    }

    #[test]
    fn generation_changes_on_round_boundaries_only() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::Present);
        let first = sm.generation();
        apply(&mut sm, RoundEvent::Arm);
        apply(&mut sm, RoundEvent::Evaluate(Verdict::Correct));
        assert_eq!(sm.generation(), first);

        apply(&mut sm, RoundEvent::Advance);
        assert_ne!(sm.generation(), first);
        let second = sm.generation();
        apply(&mut sm, RoundEvent::Leave);
        assert_ne!(sm.generation(), second);
    }

    #[test]
    fn incorrect_answer_cannot_advance() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::Present);
        apply(&mut sm, RoundEvent::Arm);
        apply(&mut sm, RoundEvent::Evaluate(Verdict::Incorrect));

        let err = sm.apply(RoundEvent::Advance).unwrap_err();
        assert_eq!(err.from, RoundPhase::Evaluated(Verdict::Incorrect));
        assert_eq!(err.event, RoundEvent::Advance);
    }

    #[test]
    fn answers_outside_awaiting_input_are_rejected() {
        let mut sm = RoundStateMachine::new();
        assert!(sm.apply(RoundEvent::Evaluate(Verdict::Correct)).is_err());
        apply(&mut sm, RoundEvent::Present);
        assert!(sm.apply(RoundEvent::Evaluate(Verdict::Correct)).is_err());
        assert_eq!(sm.phase(), RoundPhase::Presented);
    }

    #[test]
    fn present_twice_is_invalid() {
        let mut sm = RoundStateMachine::new();
        apply(&mut sm, RoundEvent::Present);
        let generation = sm.generation();
        assert!(sm.apply(RoundEvent::Present).is_err());
        assert_eq!(sm.generation(), generation);
    }

    #[test]
    fn leave_from_idle_is_allowed() {
        let mut sm = RoundStateMachine::new();
        assert_eq!(apply(&mut sm, RoundEvent::Leave), RoundPhase::Idle);
    }
}
