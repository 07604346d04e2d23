//! Event emission.
//!
//! Events are pushed from the daemon to subscribed connections as JSON-RPC
//! notifications. Each subscriber has an independent buffer; a subscriber
//! that falls behind by more than the buffer loses the oldest events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dmerge_types::events::{Event, EventType};
use dmerge_types::unix_now;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Category filter: "workflow", "data", "session", "system".
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    /// Emit an event stamped with the current time.
    pub fn publish(&self, event_type: EventType, payload: serde_json::Value) {
        self.emit(Event {
            event_type,
            timestamp: unix_now(),
            payload,
        });
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        match self.categories {
            Some(ref categories) => {
                let category = event.event_type.category();
                categories.iter().any(|c| c == category)
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(EventType::DaemonStatus, serde_json::json!({"version": "0.1.0"}));

        let event = rx.try_recv().expect("receive event");
        assert_eq!(event.event_type, EventType::DaemonStatus);
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish(EventType::ViewChanged, serde_json::json!({}));
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_event_filter_categories() {
        let filter = EventFilter {
            categories: Some(vec!["data".to_string()]),
        };

        let created = Event {
            event_type: EventType::ProposalCreated,
            timestamp: 1000,
            payload: serde_json::json!({}),
        };
        assert!(filter.matches(&created));

        let banner = Event {
            event_type: EventType::BannerChanged,
            timestamp: 1000,
            payload: serde_json::json!({}),
        };
        assert!(!filter.matches(&banner));
        assert!(EventFilter::default().matches(&banner));
    }
}
