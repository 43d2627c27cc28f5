/**
 * WebSocket Gateway
 *
 * Owns one live connection per socket and speaks the event contract:
 * every frame is `{"event": <name>, "data": <payload>}`.
 *
 * # Connection Lifecycle
 *
 * 1. Upgrade, register the outbound channel with the presence router
 * 2. Split the socket; a writer task drains the outbound channel
 * 3. The reader loop decodes frames and dispatches them
 * 4. On close or read error, leave every room and stop the writer
 *
 * Undecodable frames are answered with `message-error` and the connection
 * stays open.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::backend::error::types::BackendError;
use crate::backend::realtime::presence::{ConnectionId, Outbound};
use crate::backend::server::state::AppState;
use crate::shared::event::{ClientEvent, JoinPayload};
use crate::shared::messaging::UserSummary;
use crate::shared::ServerEvent;

/// `GET /ws`
pub async fn handle_socket_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let connection = state.presence.connect(tx.clone()).await;

    let (mut sender, mut receiver) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("[Socket] Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(next) = receiver.next().await {
        match next {
            Ok(Message::Text(text)) => dispatch(&state, connection, &tx, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("[Socket] Read error on {}: {}", connection, e);
                break;
            }
        }
    }

    state.presence.leave(connection).await;
    writer.abort();
}

/// Decode one text frame and route it to the component that handles it
pub async fn dispatch(state: &AppState, connection: ConnectionId, outbound: &Outbound, frame: &str) {
    let event = match ClientEvent::from_frame(frame) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("[Socket] Undecodable frame on {}: {}", connection, e);
            let error = BackendError::protocol("Unrecognised event");
            let _ = outbound.send(ServerEvent::error(error.client_summary(), Some(e.to_string()), None));
            return;
        }
    };

    tracing::debug!("[Socket] {} on {}", event.name(), connection);

    match event {
        ClientEvent::Join(JoinPayload { id, name, role }) => {
            if let Err(e) = state.directory.observe_join(&UserSummary::new(id.clone(), name)).await {
                tracing::warn!("[Socket] Directory rejected join of {}: {}", id, e);
            }
            state.presence.join(connection, &id, role.as_deref()).await;
        }
        ClientEvent::PrivateMessage(payload) => {
            let client_id = payload.client_id.clone();
            if let Err(e) = state.broker.deliver(payload.into_intent()).await {
                let _ = outbound.send(e.to_event(client_id));
            }
        }
        ClientEvent::SharePost(payload) => {
            let client_id = payload.client_id.clone();
            if let Err(e) = state.broker.deliver(payload.into_intent()).await {
                let _ = outbound.send(e.to_event(client_id));
            }
        }
        ClientEvent::MarkMessagesRead(payload) => {
            if let Err(e) = state
                .read_tracker
                .acknowledge_read(&payload.user_id, &payload.sender_id)
                .await
            {
                tracing::error!("[Socket] Failed to mark messages read: {}", e);
            }
        }
    }
}
