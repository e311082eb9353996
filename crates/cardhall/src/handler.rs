//! Per-connection handler: decoding, joining and routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The loop waits on two things at once:
//!   1. inbound frames, decoded and forwarded to the connection's room
//!   2. outbound messages the room pushed into this connection's channel

use std::sync::Arc;

use cardhall_protocol::{ClientMessage, Codec, JoinRequest, PlayerId, ServerMessage};
use cardhall_room::{Link, PlayerSender, RoomError, RoomHandle};
use cardhall_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::CardhallError;
use crate::server::ServerState;

/// The room membership a connection holds after a successful `JOIN`.
///
/// Dropping it tells the room the connection is gone, which starts the
/// member's grace period. `Drop` is synchronous, so the notice is sent
/// from a spawned task.
struct Membership {
    handle: RoomHandle,
    player_id: PlayerId,
    conn: ConnectionId,
    armed: bool,
}

impl Membership {
    fn is_same(&self, other: &Membership) -> bool {
        self.handle.code() == other.handle.code() && self.player_id == other.player_id
    }

    /// Routes a post-join message to the room.
    async fn forward(&self, msg: ClientMessage) -> Result<(), RoomError> {
        let (player_id, conn) = (self.player_id.clone(), self.conn);
        match msg {
            ClientMessage::VoteMode { mode } => self.handle.vote(player_id, conn, mode).await,
            ClientMessage::StartGame => self.handle.start(player_id, conn).await,
            ClientMessage::RestartGame => self.handle.restart(player_id, conn).await,
            ClientMessage::EmojiEvent { emoji_code } => {
                self.handle.emoji(player_id, conn, emoji_code).await
            }
            ClientMessage::GameAction(action) => {
                self.handle.action(player_id, conn, action).await
            }
            ClientMessage::Join(_) => Ok(()),
        }
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let handle = self.handle.clone();
        let player_id = self.player_id.clone();
        let conn = self.conn;
        tokio::spawn(async move {
            let _ = handle.disconnect(player_id, conn).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), CardhallError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let mut membership: Option<Membership> = None;

    loop {
        tokio::select! {
            incoming = conn.recv() => {
                let data = match incoming {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };
                handle_frame(&conn, &state, &data, &outbound_tx, &mut membership).await?;
            }
            Some(msg) = outbound_rx.recv() => {
                send_message(&conn, &state.codec, &msg).await?;
            }
        }
    }

    // `membership` drops here → the room starts the grace period.
    Ok(())
}

async fn handle_frame(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
    data: &[u8],
    outbound: &PlayerSender,
    membership: &mut Option<Membership>,
) -> Result<(), CardhallError> {
    let msg = match ClientMessage::decode(&state.codec, data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(conn_id = %conn.id(), error = %e, "failed to decode frame");
            return match e.client_message() {
                Some(text) => send_message(conn, &state.codec, &ServerMessage::error(text)).await,
                None => Ok(()),
            };
        }
    };

    match msg {
        ClientMessage::Join(request) => {
            handle_join(conn, state, request, outbound, membership).await
        }
        other => {
            let Some(member) = membership.as_ref() else {
                tracing::debug!(conn_id = %conn.id(), "message before JOIN ignored");
                return Ok(());
            };
            if let Err(e) = member.forward(other).await {
                tracing::debug!(player_id = %member.player_id, error = %e, "room unreachable");
            }
            Ok(())
        }
    }
}

async fn handle_join(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
    request: JoinRequest,
    outbound: &PlayerSender,
    membership: &mut Option<Membership>,
) -> Result<(), CardhallError> {
    let link = Link::new(conn.id(), outbound.clone());
    let result = {
        let mut rooms = state.rooms.lock().await;
        rooms.join(request, link).await
    };

    match result {
        Ok((handle, joined)) => {
            tracing::info!(
                conn_id = %conn.id(),
                room = %handle.code(),
                player_id = %joined.player_id,
                is_host = joined.is_host,
                "joined room"
            );
            let next = Membership {
                handle,
                player_id: joined.player_id,
                conn: conn.id(),
                armed: true,
            };
            // Re-joining the same seat on this connection already rebound
            // the room's link; the old membership must not detach it.
            if let Some(mut previous) = membership.replace(next) {
                if membership.as_ref().is_some_and(|m| previous.is_same(m)) {
                    previous.armed = false;
                }
            }
            Ok(())
        }
        Err(e) => {
            tracing::debug!(conn_id = %conn.id(), error = %e, "join refused");
            match e.client_message() {
                Some(text) => send_message(conn, &state.codec, &ServerMessage::error(text)).await,
                None => Ok(()),
            }
        }
    }
}

/// Encodes and sends one message as a text frame.
async fn send_message(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    msg: &ServerMessage,
) -> Result<(), CardhallError> {
    let bytes = codec.encode(msg)?;
    conn.send(&bytes).await?;
    Ok(())
}
