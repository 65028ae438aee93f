//! Read-only observations published by the voice session.
//!
//! UI collaborators (level meters, transcript views, status badges)
//! subscribe here; nothing on this bus mutates session state.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Role, SessionState};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// Microphone amplitude sample (RMS, 0.0..=1.0) from the level meter.
    MicLevel(f32),
    StateChanged(SessionState),
    /// A streamed piece of the assistant's in-progress message.
    AssistantDelta(String),
    TurnFinalized { role: Role, text: String },
    Notification(String),
    Shutdown,
    #[serde(other)]
    Unknown,
}

pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(Event::StateChanged(SessionState::Active));

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            Event::StateChanged(SessionState::Active)
        ));
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new(16);
        let delivered = bus.publish(Event::MicLevel(0.5));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn late_subscriber_sees_only_new_events() {
        let bus = EventBus::new(16);
        bus.publish(Event::Shutdown);

        let mut rx = bus.subscribe();
        bus.publish(Event::AssistantDelta("hi".into()));

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::AssistantDelta(t) if t == "hi"));
    }

    #[test]
    fn unknown_event_deserializes() {
        let event: Event =
            serde_json::from_str(r#"{"type":"SomethingNew","data":{}}"#).unwrap();
        assert!(matches!(event, Event::Unknown));
    }
}
