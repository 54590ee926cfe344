//! Per-session countdown task.
//!
//! One task per session, spawned by `SessionRegistry::create_session`.
//! Being a single task is what keeps the ticks of one session totally
//! ordered. The task ends when:
//! - the countdown reaches zero (emits `game_over` with `time_up`),
//! - its cancellation token fires (early end or registry shutdown),
//! - a tick finds the session missing or no longer active.

use std::sync::Arc;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::messages::{EndReason, ServerEvent};
use crate::registry::{EmitGate, SessionRegistry, Tick};
use crate::room::RoomKey;
use crate::session::SessionId;

pub(crate) async fn run_session_timer(
    registry: Arc<SessionRegistry>,
    id: SessionId,
    cancel: CancellationToken,
    gate: Arc<EmitGate>,
) {
    let period = registry.tick_interval();

    // First tick one full period after creation.
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let room = RoomKey::game(&id);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(game_id = %id, "session timer cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let remaining = match registry.tick(&id).await {
            Tick::Remaining(t) => t,
            Tick::Stopped => {
                debug!(game_id = %id, "session no longer active, timer exiting");
                return;
            }
        };

        // Stopped between the decrement and here: stay silent.
        if cancel.is_cancelled() {
            return;
        }

        let published =
            gate.emit_open(|| registry.publish(room.clone(), ServerEvent::time_update(remaining)));
        if !published {
            debug!(game_id = %id, "session ended before tick was published");
            return;
        }

        if remaining <= 0 {
            registry.finish(&id, EndReason::TimeUp).await;
            return;
        }
    }
}
