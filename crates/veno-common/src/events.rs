use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::id::AttemptId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    PresenceChanged { online_count: usize },
    StreakExtended { current: u32 },
    TestStarted(AttemptId),
    TestSubmitted { attempt_id: AttemptId, score: u32, total: u32 },
    PaymentConfirmed { reference: String },
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

        bus.publish(Event::Shutdown);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::Shutdown));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(Event::PresenceChanged { online_count: 3 });

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();
        assert!(matches!(e1, Event::PresenceChanged { online_count: 3 }));
        assert!(matches!(e2, Event::PresenceChanged { online_count: 3 }));
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let attempt = AttemptId::new();

        bus.publish(Event::TestStarted(attempt.clone()));
        bus.publish(Event::TestSubmitted {
            attempt_id: attempt.clone(),
            score: 7,
            total: 10,
        });

        let e1 = rx.recv().await.unwrap();
        assert!(matches!(e1, Event::TestStarted(ref id) if *id == attempt));

        let e2 = rx.recv().await.unwrap();
        assert!(
            matches!(e2, Event::TestSubmitted { ref attempt_id, score, total }
                if *attempt_id == attempt && score == 7 && total == 10)
        );
    }

    #[tokio::test]
    async fn streak_and_payment_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(Event::StreakExtended { current: 12 });
        bus.publish(Event::PaymentConfirmed {
            reference: "ref_123".into(),
        });
        bus.publish(Event::Notification("quiz ready".into()));

        let e1 = rx.recv().await.unwrap();
        assert!(matches!(e1, Event::StreakExtended { current: 12 }));

        let e2 = rx.recv().await.unwrap();
        assert!(matches!(e2, Event::PaymentConfirmed { ref reference } if reference == "ref_123"));

        let e3 = rx.recv().await.unwrap();
        assert!(matches!(e3, Event::Notification(ref msg) if msg == "quiz ready"));
    }

    #[test]
    fn publish_returns_zero_with_no_subscribers() {
        let bus = EventBus::new(16);
        let count = bus.publish(Event::Shutdown);
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn publish_returns_subscriber_count() {
        let bus = EventBus::new(16);
        let _rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();

        let count = bus.publish(Event::Notification("hi".into()));
        assert_eq!(count, 2);
    }

    #[test]
    fn unknown_event_deserializes() {
        let json = r#"{"type":"SomeNewEventWeNeverHeardOf","data":null}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(matches!(event, Event::Unknown));
    }
}
