//! Social notifications: chat messages and friend requests.
//!
//! Both go to the recipient's personal room only. Nothing is stored
//! here; if a message is persisted, that happened before it reached
//! this handler.

use std::sync::Arc;

use chrono::Utc;
use crossword_core::{
    ClientEvent, ClientEventKind, EventSink, FriendRequest, RoomKey, SendMessage, ServerEvent,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::dispatcher::{EventContext, HandlerError, HandlerGroup};

const EVENTS: &[ClientEventKind] = &[ClientEventKind::SendMessage, ClientEventKind::FriendRequest];

pub struct SocialHandlers {
    sink: Arc<dyn EventSink>,
}

impl SocialHandlers {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        SocialHandlers { sink }
    }

    fn on_send_message(&self, msg: SendMessage) {
        debug!(sender = %msg.sender, receiver = %msg.receiver, "relaying chat message");
        self.sink.publish(
            RoomKey::personal(msg.receiver),
            ServerEvent::new_message(msg.sender, msg.content, Utc::now().timestamp()),
        );
    }

    fn on_friend_request(&self, msg: FriendRequest) {
        debug!(from_user = %msg.from_user, to_user = %msg.to_user, "relaying friend request");
        self.sink.publish(
            RoomKey::personal(msg.to_user),
            ServerEvent::friend_request(msg.from_user),
        );
    }
}

impl HandlerGroup for SocialHandlers {
    fn name(&self) -> &'static str {
        "social"
    }

    fn events(&self) -> &'static [ClientEventKind] {
        EVENTS
    }

    fn handle<'a>(
        &'a self,
        _ctx: &'a EventContext,
        event: ClientEvent,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        async move {
            match event {
                ClientEvent::SendMessage(msg) => self.on_send_message(msg),
                ClientEvent::FriendRequest(msg) => self.on_friend_request(msg),
                other => {
                    debug!(event = other.kind().name(), "social handlers ignoring event");
                }
            }
            Ok(())
        }
        .boxed()
    }
}
