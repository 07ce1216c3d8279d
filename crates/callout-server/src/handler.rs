//! Per-connection handler: admission, the quorum wait, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the player's outbox to the socket. The
//! flow is:
//!   1. Receive exactly one `PlayerName` → admit (or politely reject)
//!   2. Park on the quorum latch until the session is active
//!   3. Loop: relay chat, route decisions, until the session resolves or
//!      the peer goes away

use std::sync::Arc;

use callout_protocol::{Codec, Envelope, JsonCodec, PlayerId, ProtocolError, SERVER_SENDER};
use callout_transport::{FrameReader, FrameWriter, TcpConnection};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::error::{GameError, ServerError};
use crate::server::ServerState;

/// Drop guard that releases a player's roster outbox when the handler
/// exits — on resolution, peer disconnect, decode failure, or panic.
/// `Drop` is synchronous, so the async release is spawned fire-and-forget.
struct RosterGuard {
    player_id: PlayerId,
    state: Arc<ServerState>,
}

impl Drop for RosterGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.session.mark_disconnected(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: TcpConnection,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");
    let (mut reader, mut writer) = conn.into_split();

    // --- Step 1: admission ---
    let name = match receive_name(&mut reader, &state.codec).await {
        Ok(Some(name)) => name,
        Ok(None) => {
            tracing::debug!(%conn_id, "closed before giving a name");
            return Ok(());
        }
        Err(e) => {
            send_notice(&mut writer, &state.codec, "expected your name first, goodbye").await;
            return Err(e);
        }
    };

    let (outbound, outbox) = mpsc::unbounded_channel();
    let player_id = match state.session.admit(name.clone(), outbound).await {
        Ok(id) => id,
        Err(GameError::RegistryFull) => {
            tracing::info!(%conn_id, player = %name, "rejecting connection, session is full");
            send_notice(&mut writer, &state.codec, "the session is full, try again later").await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(%conn_id, %player_id, player = %name, "player joined");

    // From here on the writer task owns the write half; everything the
    // player should see goes through their roster outbox.
    let _writer_task = tokio::spawn(write_loop(writer, outbox, state.codec, player_id));
    let _guard = RosterGuard {
        player_id,
        state: Arc::clone(&state),
    };

    // --- Step 2: quorum ---
    state.session.wait_until_active().await;
    // The deal already queued this player's RoleReveal ahead of any chat.

    // --- Step 3: message loop ---
    let mut phase_rx = state.session.subscribe_phase();
    loop {
        tokio::select! {
            received = reader.recv() => {
                let payload = match received {
                    Ok(Some(payload)) => payload,
                    Ok(None) => {
                        tracing::info!(%player_id, "peer disconnected");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "receive failed");
                        break;
                    }
                };
                let envelope: Envelope = match state.codec.decode(&payload) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "malformed envelope, dropping connection");
                        state
                            .session
                            .notify(player_id, "that message made no sense, goodbye".into())
                            .await;
                        break;
                    }
                };
                if handle_envelope(&state, player_id, envelope).await? {
                    break;
                }
            }
            // Resolution ends the read loop even if the peer keeps typing.
            // Discard the watch `Ref` guard inside the async block so the
            // select's output type stays `Send` (the guard is `!Send`).
            _ = async { let _ = phase_rx.wait_for(|phase| phase.is_over()).await; } => {
                tracing::debug!(%player_id, "session over, handler stopping");
                break;
            }
        }
    }

    // _guard drops here → the roster outbox is released; the writer task
    // drains whatever is still queued and closes the socket.
    Ok(())
}

/// Receives and validates the admission envelope.
///
/// Returns `Ok(None)` if the peer hung up before sending anything.
async fn receive_name(
    reader: &mut FrameReader,
    codec: &JsonCodec,
) -> Result<Option<String>, ServerError> {
    let payload = match reader.recv().await? {
        Some(payload) => payload,
        None => return Ok(None),
    };
    let envelope: Envelope = codec.decode(&payload)?;
    match envelope {
        Envelope::PlayerName { name } if !name.trim().is_empty() => {
            Ok(Some(name.trim().to_string()))
        }
        Envelope::PlayerName { .. } => Err(ServerError::Protocol(
            ProtocolError::InvalidMessage("empty display name".into()),
        )),
        other => Err(GameError::UnexpectedEnvelope {
            kind: kind_name(&other),
        }
        .into()),
    }
}

/// Routes one decoded envelope. Returns `Ok(true)` when the connection
/// should close.
async fn handle_envelope(
    state: &Arc<ServerState>,
    player_id: PlayerId,
    envelope: Envelope,
) -> Result<bool, ServerError> {
    match envelope {
        Envelope::PlayerChat { message } => {
            if let Err(e) = state.session.chat(player_id, message).await {
                // Lost the race with resolution; the phase arm of the
                // select loop stops this handler on its next turn.
                tracing::debug!(%player_id, error = %e, "chat dropped");
            }
            Ok(false)
        }

        Envelope::PlayerDecision { target_name } => {
            match state.session.resolve(player_id, &target_name).await {
                Ok(()) => Ok(false),
                Err(e @ (GameError::Forbidden(_) | GameError::InvalidTarget(_))) => {
                    // Rejected but recoverable: tell the player, keep going.
                    state.session.notify(player_id, e.to_string()).await;
                    Ok(false)
                }
                Err(e) => {
                    tracing::debug!(%player_id, error = %e, "decision dropped");
                    Ok(false)
                }
            }
        }

        // A client re-sending its name, or sending server-to-client kinds,
        // is off-script: drop the connection after a final notice.
        other @ (Envelope::PlayerName { .. }
        | Envelope::ServerChat { .. }
        | Envelope::RoleReveal { .. }) => {
            let kind = kind_name(&other);
            state
                .session
                .notify(player_id, format!("unexpected {kind} message, goodbye"))
                .await;
            Err(GameError::UnexpectedEnvelope { kind }.into())
        }
    }
}

/// Drains a player's outbox to their socket. Runs until the outbox closes
/// (every sender dropped) or the socket dies.
async fn write_loop(
    mut writer: FrameWriter,
    mut outbox: UnboundedReceiver<Envelope>,
    codec: JsonCodec,
    player_id: PlayerId,
) {
    while let Some(envelope) = outbox.recv().await {
        let payload = match codec.encode(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(%player_id, error = %e, "encode failed, skipping message");
                continue;
            }
        };
        if let Err(e) = writer.send(&payload).await {
            tracing::debug!(%player_id, error = %e, "write failed, stopping writer");
            break;
        }
    }
    // Writer drops here, closing the write half of the socket.
}

/// Sends a one-off server notice directly, for connections that never made
/// it into the roster (or haven't yet).
async fn send_notice(writer: &mut FrameWriter, codec: &JsonCodec, message: &str) {
    let envelope = Envelope::ServerChat {
        message: message.to_string(),
        sender: SERVER_SENDER.to_string(),
    };
    if let Ok(payload) = codec.encode(&envelope) {
        let _ = writer.send(&payload).await;
    }
}

/// The wire tag of an envelope, for log lines and violation notices.
fn kind_name(envelope: &Envelope) -> &'static str {
    match envelope {
        Envelope::PlayerName { .. } => "PlayerName",
        Envelope::PlayerChat { .. } => "PlayerChat",
        Envelope::PlayerDecision { .. } => "PlayerDecision",
        Envelope::ServerChat { .. } => "ServerChat",
        Envelope::RoleReveal { .. } => "RoleReveal",
    }
}
