//! Per-connection handler: decode client events, route them to the rooms,
//! deliver acknowledgements and broadcasts.
//!
//! Each accepted connection gets its own task running [`handle_connection`].
//! A writer task drains the connection's event channel into the socket, so
//! room broadcasts flow out while the read loop sits in `recv`.

use std::sync::Arc;

use pairquiz_protocol::{ClientEvent, Codec, ErrorCode, ServerEvent};
use pairquiz_room::EventSender;
use pairquiz_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::PairquizError;
use crate::server::ServerState;

/// Drop guard that releases a connection's binding when the handler exits.
///
/// Ensures cleanup happens even if the handler panics. `Drop` is
/// synchronous, so the async release runs in a fire-and-forget task.
struct DisconnectGuard {
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            release_connection(conn_id, &state).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), PairquizError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");
    let conn = Arc::new(conn);

    // The connection's event channel. Room actors hold the sender; the
    // writer task turns events into outgoing frames.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<ServerEvent>();

    let writer = {
        let conn = Arc::clone(&conn);
        let codec = state.codec;
        tokio::spawn(async move {
            while let Some(ev) = events_rx.recv().await {
                let text = match codec.encode(&ev) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode server event");
                        continue;
                    }
                };
                if conn.send(&text).await.is_err() {
                    break;
                }
            }
        })
    };

    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        let text = match conn.recv().await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        match state.codec.decode::<ClientEvent>(&text) {
            Ok(event) => dispatch_event(event, conn_id, &events_tx, &state).await,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "undecodable client event");
                let _ = events_tx.send(ServerEvent::System {
                    message: format!("invalid event: {e}"),
                });
            }
        }
    }

    // _guard drops here → binding release and room leave fire.
    writer.abort();
    Ok(())
}

/// Routes one decoded client event.
///
/// Client protocol errors never propagate: they are answered with an
/// acknowledgement carrying the wire error code.
async fn dispatch_event(
    event: ClientEvent,
    conn_id: ConnectionId,
    events_tx: &EventSender,
    state: &Arc<ServerState>,
) {
    match event {
        ClientEvent::CreateRoom { mode } => {
            let room_id = state.registry.lock().await.create_room(mode);
            let _ = events_tx.send(ServerEvent::RoomCreated { room_id });
        }

        ClientEvent::JoinRoom { room_id } => {
            // One room per connection. Re-joining the same room is
            // acknowledged; joining another without leaving is refused.
            let bound = state.bindings.lock().await.room_of(conn_id);
            if let Some(existing) = bound {
                if existing == room_id {
                    let status = match state.registry.lock().await.get(&room_id) {
                        Some(handle) => handle.info().await.ok().map(|i| i.status),
                        None => None,
                    };
                    let _ = events_tx.send(ServerEvent::JoinResult {
                        ok: true,
                        role_assigned: None,
                        room_status: status,
                        error: None,
                    });
                } else {
                    let _ = events_tx.send(ServerEvent::System {
                        message: format!("already in room {existing}"),
                    });
                    let _ = events_tx.send(ServerEvent::JoinResult {
                        ok: false,
                        role_assigned: None,
                        room_status: None,
                        error: Some(ErrorCode::RoomFull),
                    });
                }
                return;
            }

            let result = {
                let mut registry = state.registry.lock().await;
                registry.join(&room_id, conn_id, events_tx.clone()).await
            };
            match result {
                Ok(status) => {
                    let bind = state
                        .bindings
                        .lock()
                        .await
                        .bind(conn_id, room_id.clone());
                    if let Err(e) = bind {
                        tracing::warn!(%conn_id, error = %e, "binding after join failed");
                    }
                    let _ = events_tx.send(ServerEvent::JoinResult {
                        ok: true,
                        role_assigned: None,
                        room_status: Some(status),
                        error: None,
                    });
                }
                Err(e) => {
                    let _ = events_tx.send(ServerEvent::JoinResult {
                        ok: false,
                        role_assigned: None,
                        room_status: None,
                        error: Some(e.code()),
                    });
                }
            }
        }

        ClientEvent::PlayerReady {
            preferred_role,
            mode,
        } => {
            // The room comes from the connection's binding, not the event.
            let room_id = state.bindings.lock().await.room_of(conn_id);
            let handle = match room_id {
                Some(room_id) => state.registry.lock().await.get(&room_id),
                None => None,
            };
            let Some(handle) = handle else {
                let _ = events_tx.send(ServerEvent::ReadyResult {
                    ok: false,
                    role_assigned: None,
                    started: false,
                    mode: None,
                    error: Some(ErrorCode::RoomNotFound),
                });
                return;
            };

            match handle.ready(conn_id, preferred_role, mode).await {
                Ok(outcome) => {
                    if let Err(e) = state.bindings.lock().await.set_role(conn_id, outcome.role) {
                        tracing::warn!(%conn_id, error = %e, "recording role failed");
                    }
                    let _ = events_tx.send(ServerEvent::ReadyResult {
                        ok: true,
                        role_assigned: Some(outcome.role),
                        started: outcome.started,
                        mode: Some(outcome.mode),
                        error: None,
                    });
                }
                Err(e) => {
                    let _ = events_tx.send(ServerEvent::ReadyResult {
                        ok: false,
                        role_assigned: None,
                        started: false,
                        mode: None,
                        error: Some(e.code()),
                    });
                }
            }
        }

        ClientEvent::SubmitAnswer {
            room_id,
            answer,
            remain_ms,
        } => {
            let handle = state.registry.lock().await.get(&room_id);
            let Some(handle) = handle else {
                let _ = events_tx.send(ServerEvent::AnswerAck {
                    ok: false,
                    correct: None,
                    score: None,
                    game_over: None,
                    error: Some(ErrorCode::RoomNotFound),
                });
                return;
            };

            match handle
                .submit(conn_id, answer.unwrap_or_default(), remain_ms)
                .await
            {
                Ok(outcome) => {
                    let _ = events_tx.send(ServerEvent::AnswerAck {
                        ok: true,
                        correct: Some(outcome.correct),
                        score: outcome.score,
                        game_over: Some(outcome.game_over),
                        error: None,
                    });
                }
                Err(e) => {
                    let _ = events_tx.send(ServerEvent::AnswerAck {
                        ok: false,
                        correct: None,
                        score: None,
                        game_over: None,
                        error: Some(e.code()),
                    });
                }
            }
        }

        ClientEvent::Chat { room_id, message } => {
            // No acknowledgement, by contract.
            if let Some(handle) = state.registry.lock().await.get(&room_id) {
                let _ = handle.chat(conn_id, message).await;
            }
        }

        ClientEvent::ContinueGame { room_id } => {
            if let Some(handle) = state.registry.lock().await.get(&room_id) {
                let _ = handle.continue_game().await;
            }
        }
    }
}

/// Releases the connection's binding and removes it from its room.
async fn release_connection(conn_id: ConnectionId, state: &Arc<ServerState>) {
    let released = state.bindings.lock().await.release(conn_id);
    if let Some(binding) = released {
        let handle = state.registry.lock().await.get(&binding.room);
        if let Some(handle) = handle {
            let _ = handle.leave(conn_id).await;
        }
    }
}
