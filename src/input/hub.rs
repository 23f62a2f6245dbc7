//! Fan-out point for gesture events
//!
//! Input sources publish tagged `GestureEvent`s into the hub; every
//! consumer subscribes and receives its own copy of the stream.

use tokio::sync::broadcast;
use tracing::trace;

use super::gesture::GestureEvent;

const HUB_CAPACITY: usize = 64;

/// Shared broadcast channel for gesture events
#[derive(Debug, Clone)]
pub struct InputHub {
    tx: broadcast::Sender<GestureEvent>,
}

impl InputHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Self { tx }
    }

    /// Publish an event to all current subscribers.
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, event: GestureEvent) -> usize {
        trace!(?event, "publishing gesture event");
        self.tx.send(event).unwrap_or(0)
    }

    /// Register a new consumer
    pub fn subscribe(&self) -> broadcast::Receiver<GestureEvent> {
        self.tx.subscribe()
    }
}

impl Default for InputHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Edge, Gesture};

    #[test]
    fn test_publish_without_subscribers() {
        let hub = InputHub::new();
        assert_eq!(hub.publish(GestureEvent::new(Gesture::Hold, Edge::Start)), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let hub = InputHub::new();
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        let event = GestureEvent::new(Gesture::Action, Edge::Start);
        assert_eq!(hub.publish(event), 2);
        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let hub = InputHub::new();
        let _early = hub.subscribe();
        hub.publish(GestureEvent::new(Gesture::Hold, Edge::Start));

        let mut late = hub.subscribe();
        let event = GestureEvent::new(Gesture::Hold, Edge::Cancel);
        hub.publish(event);
        assert_eq!(tokio_test::block_on(late.recv()).unwrap(), event);
    }
}
