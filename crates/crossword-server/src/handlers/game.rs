//! Game handlers.
//!
//! Room membership and the session roster are deliberately separate:
//! - `join_game` subscribes the connection to the game room AND appends
//!   the user to the roster.
//! - `leave_game` only unsubscribes the connection. The user stays on
//!   the roster, which is a record of who played, not who is watching.

use std::sync::Arc;

use crossword_core::{
    ClientEvent, ClientEventKind, CreateGame, EventSink, JoinGame, LeaveGame, MakeMove, RoomKey,
    ServerEvent, SessionRegistry,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info};

use crate::dispatcher::{EventContext, HandlerError, HandlerGroup};
use crate::rooms::RoomTable;

const EVENTS: &[ClientEventKind] = &[
    ClientEventKind::CreateGame,
    ClientEventKind::JoinGame,
    ClientEventKind::MakeMove,
    ClientEventKind::LeaveGame,
];

pub struct GameHandlers {
    registry: Arc<SessionRegistry>,
    rooms: RoomTable,
    sink: Arc<dyn EventSink>,
}

impl GameHandlers {
    pub fn new(registry: Arc<SessionRegistry>, rooms: RoomTable, sink: Arc<dyn EventSink>) -> Self {
        GameHandlers {
            registry,
            rooms,
            sink,
        }
    }

    /// Creator gets `game_created`; nobody else is told.
    async fn on_create(&self, ctx: &EventContext, msg: CreateGame) {
        let game_id = self.registry.create_session(msg.puzzle_id).await;
        info!(
            client_id = %ctx.client_id,
            game_id = %game_id,
            username = msg.username.as_deref().unwrap_or("-"),
            "game created"
        );
        ctx.reply(ServerEvent::session_created(game_id));
    }

    /// A missing session is reported to the joiner and nothing is
    /// broadcast. The room subscription made first is kept.
    async fn on_join(&self, ctx: &EventContext, msg: JoinGame) -> Result<(), HandlerError> {
        let room = RoomKey::game(&msg.game_id);
        self.rooms.join(room.clone(), ctx.client_id).await;

        self.registry.join_session(&msg.game_id, &msg.username).await?;

        info!(client_id = %ctx.client_id, game_id = %msg.game_id, username = %msg.username, "player joined");
        self.sink.publish(room, ServerEvent::player_joined(msg.username));
        Ok(())
    }

    /// Stateless relay. No legality check: the payload goes out as it came in.
    fn on_move(&self, msg: MakeMove) {
        let room = RoomKey::game(&msg.game_id);
        self.sink.publish(room, ServerEvent::GameUpdate(msg));
    }

    async fn on_leave(&self, ctx: &EventContext, msg: LeaveGame) {
        self.rooms.leave(&RoomKey::game(&msg.game_id), ctx.client_id).await;
        debug!(client_id = %ctx.client_id, game_id = %msg.game_id, "left game room");
    }
}

impl HandlerGroup for GameHandlers {
    fn name(&self) -> &'static str {
        "game"
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
                ClientEvent::CreateGame(msg) => self.on_create(ctx, msg).await,
                ClientEvent::JoinGame(msg) => self.on_join(ctx, msg).await?,
                ClientEvent::MakeMove(msg) => self.on_move(msg),
                ClientEvent::LeaveGame(msg) => self.on_leave(ctx, msg).await,
                other => {
                    debug!(event = other.kind().name(), "game handlers ignoring event");
                }
            }
            Ok(())
        }
        .boxed()
    }
}
