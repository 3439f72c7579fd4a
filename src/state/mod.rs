pub mod content;
pub mod games;
mod hub;
pub mod sampling;
pub mod session;
pub mod state_machine;

pub use self::hub::EventHub;
pub use self::session::{Screen, Session};
pub use self::state_machine::{InvalidTransition, RoundEvent, RoundPhase};
