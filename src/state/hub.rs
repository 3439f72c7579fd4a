use tokio::sync::broadcast;

use crate::dto::surface::SurfaceEvent;

/// Broadcast hub fanning presentation events out to every subscriber.
#[derive(Clone)]
pub struct EventHub {
    sender: broadcast::Sender<SurfaceEvent>,
}

impl EventHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: SurfaceEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_sent_after_subscribing() {
        let hub = EventHub::new(4);
        hub.broadcast(SurfaceEvent {
            event: "lost".into(),
            data: serde_json::Value::Null,
        });

        let mut rx = hub.subscribe();
        hub.broadcast(SurfaceEvent {
            event: "celebrate".into(),
            data: serde_json::Value::Null,
        });
        assert_eq!(rx.recv().await.unwrap().event, "celebrate");
    }
}
