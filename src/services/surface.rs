//! Presentation surface seam and its broadcast-backed implementation.

use serde::Serialize;
use tracing::warn;

use crate::{
    dto::surface::{
        CardView, ConfirmAction, ConfirmEvent, FlagEvent, LetterRejectedEvent, PreloadEvent,
        RoundView, ScreenEvent, Severity, StarsEvent, SurfaceEvent, ToastEvent,
    },
    state::{EventHub, Screen},
};

const EVENT_SCREEN: &str = "screen";
const EVENT_CARD: &str = "card";
const EVENT_IMAGE_HIDDEN: &str = "image_hidden";
const EVENT_ROUND: &str = "round";
const EVENT_LETTER_REJECTED: &str = "letter_rejected";
const EVENT_TOAST: &str = "toast";
const EVENT_STARS: &str = "stars";
const EVENT_REWARD_MODAL: &str = "reward_modal";
const EVENT_CELEBRATE: &str = "celebrate";
const EVENT_VOICE_AVAILABLE: &str = "voice_available";
const EVENT_LISTENING: &str = "listening";
const EVENT_CONFIRM: &str = "confirm";
const EVENT_PRELOAD: &str = "preload";

/// Side effects the core asks of the user interface. Nothing flows back.
pub trait PresentationSurface: Send + Sync {
    /// Switch to `screen`.
    fn show_screen(&self, screen: Screen);
    /// Show a flashcard.
    fn render_card(&self, card: &CardView);
    /// Hide or reveal the card picture.
    fn set_image_hidden(&self, hidden: bool);
    /// Draw the board of the current round.
    fn render_round(&self, round: &RoundView);
    /// Flash the letter tile at `bank_index` as wrong.
    fn letter_rejected(&self, bank_index: usize);
    /// Transient notification.
    fn toast(&self, message: &str, severity: Severity);
    /// Persistent star counter.
    fn render_stars(&self, count: u64);
    /// Open the reward modal.
    fn show_reward_modal(&self);
    /// Close the reward modal.
    fn dismiss_reward_modal(&self);
    /// Confetti.
    fn celebrate(&self);
    /// Show or hide the microphone affordance.
    fn set_voice_available(&self, available: bool);
    /// Reflect whether a voice capture is in flight.
    fn set_listening(&self, listening: bool);
    /// Ask the user to confirm a destructive action.
    fn request_confirmation(&self, action: ConfirmAction, prompt: &str);
    /// Warm the picture cache.
    fn preload_images(&self, images: &[String]);
}

/// Publishes every surface call as a [`SurfaceEvent`] on the hub.
#[derive(Clone)]
pub struct HubSurface {
    hub: EventHub,
}

impl HubSurface {
    /// Publish on `hub`.
    pub fn new(hub: EventHub) -> Self {
        Self { hub }
    }

    fn send_event<T>(&self, event: &str, payload: &T)
    where
        T: Serialize,
    {
        match SurfaceEvent::json(event, payload) {
            Ok(message) => self.hub.broadcast(message),
            Err(err) => warn!(event, error = %err, "failed to serialize surface event"),
        }
    }

    fn send_flag(&self, event: &str, value: bool) {
        self.send_event(event, &FlagEvent { value });
    }
}

impl PresentationSurface for HubSurface {
    fn show_screen(&self, screen: Screen) {
        self.send_event(EVENT_SCREEN, &ScreenEvent { screen });
    }

    fn render_card(&self, card: &CardView) {
        self.send_event(EVENT_CARD, card);
    }

    fn set_image_hidden(&self, hidden: bool) {
        self.send_flag(EVENT_IMAGE_HIDDEN, hidden);
    }

    fn render_round(&self, round: &RoundView) {
        self.send_event(EVENT_ROUND, round);
    }

    fn letter_rejected(&self, bank_index: usize) {
        self.send_event(EVENT_LETTER_REJECTED, &LetterRejectedEvent { index: bank_index });
    }

    fn toast(&self, message: &str, severity: Severity) {
        self.send_event(EVENT_TOAST, &ToastEvent { message, severity });
    }

    fn render_stars(&self, count: u64) {
        self.send_event(EVENT_STARS, &StarsEvent { count });
    }

    fn show_reward_modal(&self) {
        self.send_flag(EVENT_REWARD_MODAL, true);
    }

    fn dismiss_reward_modal(&self) {
        self.send_flag(EVENT_REWARD_MODAL, false);
    }

    fn celebrate(&self) {
        self.send_event(EVENT_CELEBRATE, &serde_json::Value::Null);
    }

    fn set_voice_available(&self, available: bool) {
        self.send_flag(EVENT_VOICE_AVAILABLE, available);
    }

    fn set_listening(&self, listening: bool) {
        self.send_flag(EVENT_LISTENING, listening);
    }

    fn request_confirmation(&self, action: ConfirmAction, prompt: &str) {
        self.send_event(EVENT_CONFIRM, &ConfirmEvent { action, prompt });
    }

    fn preload_images(&self, images: &[String]) {
        self.send_event(EVENT_PRELOAD, &PreloadEvent { images });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn surface_calls_become_named_events() {
        let hub = EventHub::new(8);
        let mut events = hub.subscribe();
        let surface = HubSurface::new(hub);

        surface.show_screen(Screen::GameMenu);
        surface.toast("¡Correcto! 🎉", Severity::Success);
        surface.dismiss_reward_modal();

        let screen = events.recv().await.unwrap();
        assert_eq!(screen.event, "screen");
        assert_eq!(screen.data["screen"], "game_menu");

        let toast = events.recv().await.unwrap();
        assert_eq!(toast.data["severity"], "success");

        let modal = events.recv().await.unwrap();
        assert_eq!(modal.event, "reward_modal");
        assert_eq!(modal.data["value"], false);
    }
}
