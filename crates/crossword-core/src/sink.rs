//! Publishing seam between session logic and delivery.
//!
//! The registry's timers and the server's handlers publish
//! `(RoomKey, ServerEvent)` pairs through an [`EventSink`] without
//! knowing which connections sit in the room. Publishing is fire and
//! forget: an empty or unknown room is a silent no-op.

use std::sync::Mutex;

use crate::messages::ServerEvent;
use crate::room::RoomKey;

pub trait EventSink: Send + Sync {
    fn publish(&self, room: RoomKey, event: ServerEvent);
}

/// Sink that keeps every published event in order. Used by tests and
/// diagnostics.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(RoomKey, ServerEvent)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    /// Everything published so far.
    pub fn events(&self) -> Vec<(RoomKey, ServerEvent)> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Events published to a single room, in order.
    pub fn events_for(&self, room: &RoomKey) -> Vec<ServerEvent> {
        self.events()
            .into_iter()
            .filter(|(r, _)| r == room)
            .map(|(_, event)| event)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, room: RoomKey, event: ServerEvent) {
        let mut guard = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((room, event));
    }
}
