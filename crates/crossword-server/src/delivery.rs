//! Central delivery loop.
//!
//! This task drains every room-addressed event published by handlers
//! and session timers and pushes it to the room's current subscribers.
//!
//! Routing policy:
//! - Room events go to whoever is in the room at delivery time.
//! - An empty or unknown room is a silent no-op.
//! - A subscriber whose outbound channel is gone is skipped; its own
//!   disconnect cleanup removes it.
//!
//! Unicast replies (`game_created`, `error`) never pass through here;
//! handlers send those straight to the originating connection.

use crossword_core::ServerEvent;
use tracing::{debug, trace};

use crate::rooms::RoomTable;
use crate::types::{ClientId, ClientRegistry, Delivery, DeliveryRx, OutboundTx};

/// Run the delivery loop until every sender is dropped.
pub async fn run_delivery_loop(mut delivery_rx: DeliveryRx, rooms: RoomTable, clients: ClientRegistry) {
    while let Some(Delivery { room, event }) = delivery_rx.recv().await {
        let members = rooms.members(&room).await;
        if members.is_empty() {
            trace!(%room, event = event.kind().name(), "no subscribers");
            continue;
        }

        // Snapshot of the target channels to minimize lock hold time.
        let targets: Vec<(ClientId, OutboundTx)> = {
            let guard = clients.read().await;
            members
                .iter()
                .filter_map(|id| guard.get(id).map(|tx| (*id, tx.clone())))
                .collect()
        };

        let delivered = fan_out(&event, &targets);
        debug!(%room, event = event.kind().name(), delivered, "delivered");
    }

    debug!("delivery loop shutting down (channel closed)");
}

fn fan_out(event: &ServerEvent, targets: &[(ClientId, OutboundTx)]) -> usize {
    targets
        .iter()
        .filter(|(id, tx)| {
            let ok = tx.send(event.clone()).is_ok();
            if !ok {
                trace!(client_id = %id, "outbound channel closed");
            }
            ok
        })
        .count()
}
