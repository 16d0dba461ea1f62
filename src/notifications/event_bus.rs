//! Session event bus
//!
//! A tokio broadcast channel; every reactor of a session holds its own
//! subscriber. Events carry no aggregate data, so a subscriber that falls
//! behind only loses notifications, never state: it skips ahead and keeps
//! going, and the next event makes it re-read the store.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::broadcast;

use super::events::{EventMessage, OnboardingEvent};

/// Events a subscriber may fall behind by before it starts skipping
const CHANNEL_CAPACITY: usize = 256;

/// Fan-out of session events to every reactor
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    /// Bus with the default channel capacity
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    /// Bus whose subscribers may lag by up to `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Deliver `event` to every live subscriber. Returns how many got it.
    pub fn publish(&self, event: OnboardingEvent) -> usize {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let revision = message.event.revision();

        // send only fails when nobody listens, e.g. before reactors start
        let delivered = self.sender.send(message).unwrap_or(0);
        debug!(
            "Published {} (revision {:?}) to {} subscriber(s)",
            event_type, revision, delivered
        );
        delivered
    }

    /// New subscriber; it only sees events published from now on
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            missed: 0,
        }
    }

    /// Live subscribers, i.e. reactors still running
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One receiving end of the bus
pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    missed: u64,
}

impl EventSubscriber {
    /// Next event, or `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    self.missed += count;
                    warn!("Event subscriber fell behind, skipped {} event(s)", count);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Events skipped so far because this subscriber lagged
    pub fn missed(&self) -> u64 {
        self.missed
    }
}

pub type SharedEventBus = Arc<EventBus>;

/// Shared bus for one session
pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Section;
    use crate::notifications::events::{DataUpdatedEvent, UpdateOrigin};
    use std::time::Duration;

    fn updated(revision: u64) -> OnboardingEvent {
        OnboardingEvent::DataUpdated(DataUpdatedEvent {
            revision,
            origin: UpdateOrigin::User,
            sections: vec![Section::Fees],
            critical: true,
        })
    }

    #[tokio::test]
    async fn every_subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.publish(updated(7)), 2);

        for subscriber in [&mut first, &mut second] {
            let received = tokio::time::timeout(Duration::from_millis(100), subscriber.recv())
                .await
                .expect("Timeout")
                .expect("No message");
            assert_eq!(received.event.event_type(), "data_updated");
            assert_eq!(received.event.revision(), Some(7));
        }
    }

    #[test]
    fn subscriber_count_follows_drops() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let first = bus.subscribe();
        let _second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(first);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn publish_without_subscribers_delivers_nothing() {
        let bus = EventBus::with_capacity(4);
        assert_eq!(bus.publish(updated(1)), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_newest_events() {
        let bus = EventBus::with_capacity(2);
        let mut subscriber = bus.subscribe();
        for revision in 1..=5 {
            bus.publish(updated(revision));
        }

        let next = subscriber.recv().await.unwrap();
        assert_eq!(next.event.revision(), Some(4));
        assert_eq!(subscriber.missed(), 3);
    }

    #[tokio::test]
    async fn closed_bus_ends_the_stream() {
        let bus = EventBus::new();
        let mut subscriber = bus.subscribe();
        drop(bus);
        assert!(subscriber.recv().await.is_none());
    }
}
