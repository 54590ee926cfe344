//! Shared types for the session server.
//!
//! This module defines:
//! - `ClientId`: a lightweight handle for connected clients
//! - channel aliases for per-client outbound traffic
//! - `Delivery`: a room-addressed event on its way to the delivery task
//! - `DeliverySink`: the `EventSink` handed to the registry and handlers

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crossword_core::{EventSink, RoomKey, ServerEvent};
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tracing::warn;

/// Identifier for a connected client.
///
/// This is intentionally opaque; we just guarantee uniqueness
/// over the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound events for a given client.
pub type OutboundTx = mpsc::UnboundedSender<ServerEvent>;
pub type OutboundRx = mpsc::UnboundedReceiver<ServerEvent>;

/// Registry of connected clients and their outbound channels.
///
/// - Key: `ClientId`
/// - Value: `OutboundTx` to push `ServerEvent`s to that client.
pub type ClientRegistry = Arc<RwLock<HashMap<ClientId, OutboundTx>>>;

/// An event addressed to a room.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub room: RoomKey,
    pub event: ServerEvent,
}

/// Channel from publishers (handlers, timers) → delivery task.
pub type DeliveryTx = mpsc::UnboundedSender<Delivery>;
pub type DeliveryRx = mpsc::UnboundedReceiver<Delivery>;

/// `EventSink` that queues onto the delivery channel.
#[derive(Debug, Clone)]
pub struct DeliverySink {
    tx: DeliveryTx,
}

impl DeliverySink {
    pub fn new(tx: DeliveryTx) -> Self {
        DeliverySink { tx }
    }
}

impl EventSink for DeliverySink {
    fn publish(&self, room: RoomKey, event: ServerEvent) {
        if self.tx.send(Delivery { room, event }).is_err() {
            warn!("delivery channel closed, dropping event");
        }
    }
}
