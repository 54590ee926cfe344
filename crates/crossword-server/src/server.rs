//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Builds the shared state: session registry, room table, client
//!   registry and the dispatcher with its three handler groups.
//! - Spawns the single delivery task that fans room events out.
//! - Listens on the configured address/port and accepts connections.
//! - Assigns each connection a `ClientId` and spawns its I/O task.
//!
//! The per-connection loop lives in `client`, room fan-out in `delivery`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossword_core::{
    ClientEvent, EventSink, InMemorySessionStore, RegistryConfigError, SessionRegistry, SessionStore,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client;
use crate::config::{Config, ConfigError};
use crate::delivery;
use crate::dispatcher::{DispatchError, Dispatcher, EventContext};
use crate::handlers::{AuthHandlers, GameHandlers, SocialHandlers};
use crate::rooms::RoomTable;
use crate::types::{ClientId, ClientRegistry, DeliveryRx, DeliverySink, DeliveryTx, OutboundRx, OutboundTx};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Global-ish counter for assigning unique `ClientId`s.
static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_client_id() -> ClientId {
    let id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    ClientId(id)
}

/// Everything the connections share.
pub struct ServerState {
    clients: ClientRegistry,
    rooms: RoomTable,
    registry: Arc<SessionRegistry>,
    auth: Arc<AuthHandlers>,
    dispatcher: Dispatcher,
    max_frame_len: usize,
}

impl ServerState {
    /// Build the state and spawn the delivery task. Must be called from
    /// within a tokio runtime.
    pub fn start(config: &Config, store: Arc<dyn SessionStore>) -> Result<Arc<Self>, ServerError> {
        config.validate()?;

        let clients: ClientRegistry = Arc::new(tokio::sync::RwLock::new(HashMap::new()));
        let rooms = RoomTable::new();

        // Channel from publishers → delivery task.
        let (delivery_tx, delivery_rx): (DeliveryTx, DeliveryRx) = mpsc::unbounded_channel();
        let sink: Arc<dyn EventSink> = Arc::new(DeliverySink::new(delivery_tx));

        let registry = SessionRegistry::new(store, Arc::clone(&sink), config.registry_config())?;

        let auth = Arc::new(AuthHandlers::new(rooms.clone()));
        let game = Arc::new(GameHandlers::new(registry.clone(), rooms.clone(), Arc::clone(&sink)));
        let social = Arc::new(SocialHandlers::new(sink));

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(auth.clone())?;
        dispatcher.register(game)?;
        dispatcher.register(social)?;

        tokio::spawn(delivery::run_delivery_loop(delivery_rx, rooms.clone(), clients.clone()));

        Ok(Arc::new(ServerState {
            clients,
            rooms,
            registry,
            auth,
            dispatcher,
            max_frame_len: config.max_frame_len,
        }))
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn rooms(&self) -> &RoomTable {
        &self.rooms
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Current `username -> connection` mapping, for diagnostics.
    pub async fn user_sessions(&self) -> HashMap<String, ClientId> {
        self.auth.user_sessions().await
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Register a new connection and raise `connect` for it.
    pub async fn connect_client(&self) -> (EventContext, OutboundRx) {
        let client_id = next_client_id();

        // Create outbound channel for this client.
        let (out_tx, out_rx): (OutboundTx, OutboundRx) = mpsc::unbounded_channel();
        {
            let mut guard = self.clients.write().await;
            guard.insert(client_id, out_tx.clone());
        }

        let ctx = EventContext::new(client_id, out_tx);
        self.dispatcher.dispatch_or_report(&ctx, ClientEvent::Connect).await;
        (ctx, out_rx)
    }

    /// Route one inbound event from a connection.
    pub async fn handle_event(&self, ctx: &EventContext, event: ClientEvent) {
        debug!(client_id = %ctx.client_id, event = event.kind().name(), "inbound event");
        self.dispatcher.dispatch_or_report(ctx, event).await;
    }

    /// Raise `disconnect`, then drop the connection from every room and
    /// from the client registry.
    pub async fn disconnect_client(&self, ctx: &EventContext) {
        self.dispatcher.dispatch_or_report(ctx, ClientEvent::Disconnect).await;
        self.rooms.leave_all(ctx.client_id).await;

        let mut guard = self.clients.write().await;
        guard.remove(&ctx.client_id);
    }
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    serve(listener, config, Arc::new(InMemorySessionStore::new()), shutdown).await
}

/// Accept connections on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    config: Config,
    store: Arc<dyn SessionStore>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()>,
{
    let state = ServerState::start(&config, store)?;
    tokio::pin!(shutdown);

    loop {
        let (stream, peer_addr) = tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                state.registry().shutdown().await;
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            },
        };

        let current_clients = state.client_count().await;
        if current_clients >= config.max_clients {
            warn!(
                %peer_addr,
                max_clients = config.max_clients,
                "rejecting connection: max_clients reached"
            );
            // Just drop the stream; client will see the connection closed.
            continue;
        }

        let (ctx, out_rx) = state.connect_client().await;
        info!(client_id = %ctx.client_id, %peer_addr, "accepted connection");

        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            let client_id = ctx.client_id;
            if let Err(e) = client::run_client(ctx, stream, state_clone, out_rx).await {
                warn!(%client_id, error = %e, "client error");
            } else {
                info!(%client_id, "client disconnected");
            }
        });
    }
}
