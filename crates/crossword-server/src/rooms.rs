//! Room membership table.
//!
//! Maps each `RoomKey` to the connections currently subscribed to it.
//! Purely for delivery targeting: nothing here outlives the connections
//! themselves, and an empty room simply disappears.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crossword_core::RoomKey;
use tokio::sync::RwLock;

use crate::types::ClientId;

#[derive(Debug, Clone, Default)]
pub struct RoomTable {
    inner: Arc<RwLock<HashMap<RoomKey, HashSet<ClientId>>>>,
}

impl RoomTable {
    pub fn new() -> Self {
        RoomTable::default()
    }

    /// Subscribe a connection. Joining twice is harmless.
    pub async fn join(&self, room: RoomKey, client: ClientId) {
        let mut guard = self.inner.write().await;
        guard.entry(room).or_default().insert(client);
    }

    /// Unsubscribe a connection from one room.
    pub async fn leave(&self, room: &RoomKey, client: ClientId) {
        let mut guard = self.inner.write().await;
        if let Some(members) = guard.get_mut(room) {
            members.remove(&client);
            if members.is_empty() {
                guard.remove(room);
            }
        }
    }

    /// Unsubscribe a connection from every room (disconnect cleanup).
    pub async fn leave_all(&self, client: ClientId) {
        let mut guard = self.inner.write().await;
        guard.retain(|_, members| {
            members.remove(&client);
            !members.is_empty()
        });
    }

    /// Current subscribers of a room, in id order.
    pub async fn members(&self, room: &RoomKey) -> Vec<ClientId> {
        let guard = self.inner.read().await;
        let mut members: Vec<ClientId> = guard
            .get(room)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Rooms a connection is subscribed to.
    pub async fn rooms_of(&self, client: ClientId) -> Vec<RoomKey> {
        let guard = self.inner.read().await;
        let mut rooms: Vec<RoomKey> = guard
            .iter()
            .filter(|(_, members)| members.contains(&client))
            .map(|(room, _)| room.clone())
            .collect();
        rooms.sort();
        rooms
    }
}
