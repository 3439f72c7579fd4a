//! Drives the controller through the stdio host adapter the way the binary wires it.

use std::sync::Arc;

use palabra_viva::{
    config::AppConfig,
    dao::{catalog::Catalog, store::MemoryStore},
    dto::{host::HostCommand, intent::HostMessage, surface::SurfaceEvent},
    services::{
        app::{App, AppDeps},
        host_bridge::HostBridge,
        surface::HubSurface,
    },
    state::{EventHub, Screen},
};
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

struct Host {
    app: App,
    bridge: HostBridge,
    commands: mpsc::UnboundedReceiver<HostCommand>,
    events: broadcast::Receiver<SurfaceEvent>,
}

impl Host {
    async fn start() -> Self {
        let hub = EventHub::new(64);
        let events = hub.subscribe();
        let (sender, commands) = mpsc::unbounded_channel();
        let bridge = HostBridge::new(sender, "es-MX");
        let deps = AppDeps {
            config: AppConfig::default(),
            content: Arc::new(Catalog::builtin().unwrap()),
            surface: Arc::new(HubSurface::new(hub)),
            audio: Arc::new(bridge.clone()),
            speech: Arc::new(bridge.clone()),
            voice: Arc::new(bridge.clone()),
            store: Arc::new(MemoryStore::new()),
        };
        let mut app = App::new(deps, StdRng::seed_from_u64(11)).await;
        app.init();
        Self {
            app,
            bridge,
            commands,
            events,
        }
    }

    /// Feed one host line exactly as the binary's reader does.
    async fn line(&mut self, line: &str) {
        let message: HostMessage = serde_json::from_str(line).unwrap();
        if let Some(event) = self.bridge.route(message) {
            self.app.handle(event).await;
        }
    }

    /// Skip commands until the next clip starts. Returns its handle, source and
    /// whether `stopped` was asked to stop on the way.
    async fn next_play(&mut self, stopped: Option<Uuid>) -> (Uuid, String, bool) {
        let mut saw_stop = false;
        loop {
            match self.commands.recv().await.unwrap() {
                HostCommand::AudioPlay { handle, src, .. } => return (handle, src, saw_stop),
                HostCommand::AudioStop { handle } if Some(handle) == stopped => saw_stop = true,
                _ => {}
            }
        }
    }

    fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

#[tokio::test(start_paused = true)]
async fn init_publishes_the_home_screen() {
    let mut host = Host::start().await;
    let events = host.drain_events();
    let names: Vec<&str> = events.iter().map(|event| event.event.as_str()).collect();
    assert_eq!(names, ["stars", "voice_available", "screen"]);
    assert_eq!(events[0].data["count"], 0);
    assert_eq!(events[1].data["value"], false);
    assert_eq!(events[2].data["screen"], "home");
}

#[tokio::test(start_paused = true)]
async fn intent_lines_drive_learn_mode() {
    let mut host = Host::start().await;
    host.drain_events();

    host.line(r#"{"type":"intent","action":"load_category","name":"frutas"}"#)
        .await;

    assert_eq!(host.app.session().screen(), Screen::Learn);
    assert_eq!(
        host.app.session().category().map(|category| category.key.as_str()),
        Some("frutas")
    );
    let events = host.drain_events();
    assert!(events.iter().any(|event| event.event == "card"));
    assert_eq!(
        events.last().map(|event| event.data["screen"].clone()),
        Some(serde_json::json!("learn"))
    );
}

#[tokio::test(start_paused = true)]
async fn card_sequence_follows_host_completions_and_stops_on_navigation() {
    let mut host = Host::start().await;
    host.line(r#"{"type":"intent","action":"load_category","name":"animales"}"#)
        .await;

    let (word, src, _) = host.next_play(None).await;
    assert_eq!(src, "audio/perro.mp3");

    host.line(&format!(r#"{{"type":"audio_ended","handle":"{word}"}}"#))
        .await;
    let (syllables, src, _) = host.next_play(None).await;
    assert_eq!(src, "audio/si_perro.mp3");

    host.line(r#"{"type":"intent","action":"next_card"}"#).await;
    let (_, src, stopped) = host.next_play(Some(syllables)).await;
    assert!(stopped);
    assert_eq!(src, "audio/gato.mp3");

    // The stopped clip's completion arrives late and is dropped.
    host.line(&format!(r#"{{"type":"audio_ended","handle":"{syllables}"}}"#))
        .await;
    assert_eq!(host.bridge.pending_audio(), 1);
}
