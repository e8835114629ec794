//! # Event Sinks

use crate::domain::errors::SinkError;
use crate::ports::outbound::EventSink;
use shared_bus::{EventPublisher, InMemoryEventBus, WalletEvent};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Forwards events to a publisher, by default the in-memory bus.
#[derive(Clone)]
pub struct BusEventSink<P = InMemoryEventBus> {
    publisher: Arc<P>,
}

impl<P: EventPublisher> BusEventSink<P> {
    pub fn new(publisher: Arc<P>) -> Self {
        Self { publisher }
    }
}

impl<P: EventPublisher> EventSink for BusEventSink<P> {
    fn on_event(&self, event: &WalletEvent) -> Result<(), SinkError> {
        let receivers = self.publisher.publish(event.clone());
        trace!(event = event.name(), receivers, "Event forwarded to bus");
        Ok(())
    }
}

/// Keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    events: Arc<Mutex<Vec<WalletEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first.
    pub fn events(&self) -> Vec<WalletEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for MemoryEventSink {
    fn on_event(&self, event: &WalletEvent) -> Result<(), SinkError> {
        let mut events = self.events.lock().map_err(|_| SinkError::Closed)?;
        events.push(event.clone());
        Ok(())
    }
}

/// No sink attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedEventSink;

impl EventSink for DetachedEventSink {
    fn on_event(&self, _event: &WalletEvent) -> Result<(), SinkError> {
        Err(SinkError::NotConfigured)
    }
}
