//! Per-connection I/O.
//!
//! Reader: splits the byte stream into `\n`-terminated JSON frames,
//! decodes each one and hands it to the dispatcher. A bad frame earns
//! the sender an `error` event and reading continues. A frame that
//! outgrows the limit is reported once and then skipped up to its
//! terminating newline.
//!
//! Writer: a separate task draining the connection's outbound channel,
//! one JSON line per event.

use std::io;
use std::sync::Arc;

use crossword_core::ServerEvent;
use crossword_protocol::wire_types::{validate_frame_len, FRAME_DELIMITER, FRAME_EVENT};
use crossword_protocol::{decode_client_event, encode_server_event, ProtocolError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use crate::dispatcher::EventContext;
use crate::server::ServerState;
use crate::types::{ClientId, OutboundRx};

/// Run the I/O loop for a single connection until it closes.
///
/// Always finishes with disconnect cleanup, whatever ended the loop.
pub async fn run_client(
    ctx: EventContext,
    stream: TcpStream,
    state: Arc<ServerState>,
    out_rx: OutboundRx,
) -> io::Result<()> {
    stream.set_nodelay(true)?;
    let (read_stream, write_stream) = stream.into_split();

    let client_id = ctx.client_id;
    tokio::spawn(run_writer(client_id, write_stream, out_rx));

    let result = run_reader(&ctx, read_stream, &state).await;

    state.disconnect_client(&ctx).await;
    result
}

async fn run_writer(client_id: ClientId, mut write_stream: OwnedWriteHalf, mut out_rx: OutboundRx) {
    while let Some(event) = out_rx.recv().await {
        if let Err(e) = write_event(&mut write_stream, &event).await {
            debug!(%client_id, error = %e, "write failed, stopping writer");
            break;
        }
    }
    trace!(%client_id, "writer finished");
}

async fn write_event(stream: &mut OwnedWriteHalf, event: &ServerEvent) -> io::Result<()> {
    let frame = match encode_server_event(event) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(event = event.kind().name(), error = %e, "dropping unencodable event");
            return Ok(());
        }
    };

    let mut data = frame.into_bytes();
    data.push(FRAME_DELIMITER);

    stream.write_all(&data).await?;
    stream.flush().await?;
    Ok(())
}

async fn run_reader(
    ctx: &EventContext,
    mut read_stream: OwnedReadHalf,
    state: &ServerState,
) -> io::Result<()> {
    let max_frame_len = state.max_frame_len();
    let mut buffer: Vec<u8> = Vec::new();
    let mut temp_buf = [0u8; 4096];

    // Inside an oversized frame, waiting for its newline.
    let mut discarding = false;

    loop {
        let n = read_stream.read(&mut temp_buf).await?;
        if n == 0 {
            // EOF - client disconnected
            return Ok(());
        }
        buffer.extend_from_slice(&temp_buf[..n]);

        // Process complete frames
        while let Some(pos) = buffer.iter().position(|&b| b == FRAME_DELIMITER) {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            if discarding {
                discarding = false;
                continue;
            }
            handle_frame(ctx, state, &line[..pos], max_frame_len).await;
        }

        if discarding {
            buffer.clear();
        } else if buffer.len() > max_frame_len {
            report(
                ctx,
                ProtocolError::FrameTooLong {
                    len: buffer.len(),
                    max: max_frame_len,
                },
            );
            buffer.clear();
            discarding = true;
        }
    }
}

async fn handle_frame(ctx: &EventContext, state: &ServerState, raw: &[u8], max_frame_len: usize) {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text.trim(),
        Err(_) => return report(ctx, ProtocolError::InvalidUtf8),
    };

    if text.is_empty() {
        return;
    }

    if !validate_frame_len(text.len(), max_frame_len) {
        return report(
            ctx,
            ProtocolError::FrameTooLong {
                len: text.len(),
                max: max_frame_len,
            },
        );
    }

    match decode_client_event(text) {
        Ok(event) => state.handle_event(ctx, event).await,
        Err(e) => report(ctx, e),
    }
}

fn report(ctx: &EventContext, err: ProtocolError) {
    debug!(client_id = %ctx.client_id, error = %err, "rejected frame");
    ctx.reply(ServerEvent::error(FRAME_EVENT, err.to_string()));
}
