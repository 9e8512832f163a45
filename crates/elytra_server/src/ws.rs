// SPDX-License-Identifier: MIT

//! Channel Surface (spec.md §4.3, §4.7, §6): the WebSocket upgrade at
//! `GET /ws`, the handshake that classifies a connection by role, and the
//! per-connection read loop that *is* the Message Router — it dispatches
//! each inbound frame by kind to the Job Coordinator or to a broadcast
//! fan-out, and never lets a malformed frame kill the connection.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use elytra_protocol::WorkerFrame;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::registry::{ConnectionHandle, Role};
use crate::state::AppState;

/// Handshake query parameters (spec.md §6): `role` defaults to worker,
/// `isMobile` is advisory and only ever logged, never acted on.
#[derive(Debug, Deserialize)]
pub struct HandshakeQuery {
    role: Option<String>,
    #[serde(rename = "isMobile")]
    is_mobile: Option<bool>,
}

pub async fn channel_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<HandshakeQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let role = match query.role.as_deref() {
        Some("observer") => Role::Observer,
        _ => Role::Worker,
    };
    let is_mobile = query.is_mobile.unwrap_or(false);
    ws.on_upgrade(move |socket| handle_socket(socket, role, is_mobile, state))
}

async fn handle_socket(socket: WebSocket, role: Role, is_mobile: bool, state: AppState) {
    let (handle, mut outbound) = state.registry.accept(role);
    tracing::info!(connection_id = %handle.id, ?role, is_mobile, "channel connection accepted");

    let (mut sink, mut stream) = socket.split();

    // The writer owns the socket's write half and only ever drains the
    // connection's mailbox; it never blocks dispatch elsewhere on a slow
    // peer (spec.md §5).
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        let Ok(message) = message else { break };
        match message {
            Message::Text(raw) => route_frame(&state, &handle, role, &raw),
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    writer.abort();
    state.registry.drop_connection(handle.id);
    tracing::info!(connection_id = %handle.id, "channel connection closed");
}

/// Dispatch one inbound frame by kind (spec.md §4.3's table). Unknown
/// kinds and malformed messages are logged and dropped; they never
/// terminate the connection and no per-message acknowledgement is sent.
fn route_frame(state: &AppState, handle: &ConnectionHandle, role: Role, raw: &str) {
    match WorkerFrame::parse(raw) {
        Ok(WorkerFrame::ChunkResult(frame)) => {
            state.coordinator.ingest_result(frame.job_id, frame.chunk_id, frame.result);
        }
        Ok(WorkerFrame::ChunkError(frame)) => {
            state.coordinator.ingest_error(frame.job_id, frame.chunk_id, frame.error);
        }
        Ok(WorkerFrame::Progress(_)) => {
            // Rebroadcast the original bytes rather than a re-serialized
            // copy: observers see exactly what the worker sent, and a
            // single reader loop processing frames one at a time already
            // gives per-sender ordering for free (spec.md §5).
            if role == Role::Worker {
                state.registry.broadcast_to_observers(raw);
            }
        }
        Ok(WorkerFrame::Pong) => handle.mark_alive(),
        Err(e) => {
            tracing::warn!(connection_id = %handle.id, error = %e, "dropping malformed channel frame");
        }
    }
}
