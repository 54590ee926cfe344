//! Event dispatcher.
//!
//! Pure routing: one table from inbound event kind to the handler group
//! that owns it. Groups register themselves at startup; binding an
//! event that is already bound fails registration instead of silently
//! replacing the earlier handler.

use std::collections::HashMap;
use std::sync::Arc;

use crossword_core::{ClientEvent, ClientEventKind, ServerEvent, SessionError};
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{ClientId, OutboundTx};

/// Failure inside a handler action.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("event {event} already handled by {existing}, refusing {incoming}")]
    DuplicateEvent {
        event: &'static str,
        existing: &'static str,
        incoming: &'static str,
    },

    #[error("no handler registered for {0}")]
    Unrouted(&'static str),

    #[error("{event} failed: {source}")]
    Handler {
        event: &'static str,
        #[source]
        source: HandlerError,
    },
}

impl DispatchError {
    /// Name of the inbound event this error belongs to.
    pub fn event_name(&self) -> &'static str {
        match self {
            DispatchError::DuplicateEvent { event, .. } => *event,
            DispatchError::Unrouted(event) => *event,
            DispatchError::Handler { event, .. } => *event,
        }
    }
}

/// Per-event context: who sent it and how to answer them directly.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub client_id: ClientId,
    outbound: OutboundTx,
}

impl EventContext {
    pub fn new(client_id: ClientId, outbound: OutboundTx) -> Self {
        EventContext {
            client_id,
            outbound,
        }
    }

    /// Send an event to the originating connection only.
    pub fn reply(&self, event: ServerEvent) {
        if self.outbound.send(event).is_err() {
            debug!(client_id = %self.client_id, "reply dropped, connection gone");
        }
    }
}

/// A cohesive set of handlers for one slice of the protocol.
pub trait HandlerGroup: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inbound events this group owns.
    fn events(&self) -> &'static [ClientEventKind];

    fn handle<'a>(
        &'a self,
        ctx: &'a EventContext,
        event: ClientEvent,
    ) -> BoxFuture<'a, Result<(), HandlerError>>;
}

#[derive(Default)]
pub struct Dispatcher {
    routes: HashMap<ClientEventKind, Arc<dyn HandlerGroup>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher::default()
    }

    /// Bind every event of `group`. All-or-nothing: on a clash nothing
    /// from this group is bound.
    pub fn register(&mut self, group: Arc<dyn HandlerGroup>) -> Result<(), DispatchError> {
        for kind in group.events() {
            if let Some(existing) = self.routes.get(kind) {
                return Err(DispatchError::DuplicateEvent {
                    event: kind.name(),
                    existing: existing.name(),
                    incoming: group.name(),
                });
            }
        }

        for kind in group.events() {
            self.routes.insert(*kind, Arc::clone(&group));
        }

        debug!(group = group.name(), events = group.events().len(), "handler group registered");
        Ok(())
    }

    /// Name of the group bound to `kind`, if any.
    pub fn route(&self, kind: ClientEventKind) -> Option<&'static str> {
        self.routes.get(&kind).map(|group| group.name())
    }

    pub async fn dispatch(&self, ctx: &EventContext, event: ClientEvent) -> Result<(), DispatchError> {
        let kind = event.kind();
        let group = self
            .routes
            .get(&kind)
            .ok_or(DispatchError::Unrouted(kind.name()))?;

        group
            .handle(ctx, event)
            .await
            .map_err(|source| DispatchError::Handler {
                event: kind.name(),
                source,
            })
    }

    /// Dispatch and report any failure back to the sender as an `error`
    /// event. Nothing propagates past the connection.
    pub async fn dispatch_or_report(&self, ctx: &EventContext, event: ClientEvent) {
        if let Err(e) = self.dispatch(ctx, event).await {
            warn!(client_id = %ctx.client_id, error = %e, "event failed");
            ctx.reply(ServerEvent::error(e.event_name(), e.to_string()));
        }
    }
}
