//! Authentication handlers.
//!
//! Keeps the `username -> connection` mapping. At most one connection
//! per username: a second authenticate for the same name overwrites the
//! first (last write wins). Disconnect removes only an entry that still
//! points at the disconnecting connection, so a superseded connection
//! closing never evicts its replacement.

use std::collections::HashMap;

use crossword_core::{Authenticate, ClientEvent, ClientEventKind, RoomKey};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::dispatcher::{EventContext, HandlerError, HandlerGroup};
use crate::rooms::RoomTable;
use crate::types::ClientId;

const EVENTS: &[ClientEventKind] = &[
    ClientEventKind::Connect,
    ClientEventKind::Authenticate,
    ClientEventKind::Disconnect,
];

pub struct AuthHandlers {
    users: RwLock<HashMap<String, ClientId>>,
    rooms: RoomTable,
}

impl AuthHandlers {
    pub fn new(rooms: RoomTable) -> Self {
        AuthHandlers {
            users: RwLock::new(HashMap::new()),
            rooms,
        }
    }

    /// Read-only copy of the current mapping, for diagnostics.
    pub async fn user_sessions(&self) -> HashMap<String, ClientId> {
        self.users.read().await.clone()
    }

    async fn on_authenticate(&self, ctx: &EventContext, msg: Authenticate) {
        let previous = {
            let mut users = self.users.write().await;
            users.insert(msg.username.clone(), ctx.client_id)
        };

        if let Some(old) = previous.filter(|old| *old != ctx.client_id) {
            debug!(username = %msg.username, old_client = %old, "authentication superseded");
        }

        self.rooms
            .join(RoomKey::personal(msg.username.as_str()), ctx.client_id)
            .await;

        info!(client_id = %ctx.client_id, username = %msg.username, "user authenticated");
    }

    async fn on_disconnect(&self, ctx: &EventContext) {
        let mut removed = Vec::new();
        {
            let mut users = self.users.write().await;
            users.retain(|username, client| {
                let stale = *client == ctx.client_id;
                if stale {
                    removed.push(username.clone());
                }
                !stale
            });
        }

        for username in removed {
            info!(client_id = %ctx.client_id, %username, "user disconnected");
        }
    }
}

impl HandlerGroup for AuthHandlers {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn events(&self) -> &'static [ClientEventKind] {
        EVENTS
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a EventContext,
        event: ClientEvent,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        async move {
            match event {
                ClientEvent::Connect => {
                    debug!(client_id = %ctx.client_id, "client connected");
                }
                ClientEvent::Authenticate(msg) => self.on_authenticate(ctx, msg).await,
                ClientEvent::Disconnect => self.on_disconnect(ctx).await,
                other => {
                    debug!(event = other.kind().name(), "auth handlers ignoring event");
                }
            }
            Ok(())
        }
        .boxed()
    }
}
