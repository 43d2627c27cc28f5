//! Messaging HTTP Handlers
//!
//! REST read path (conversation list, history) and the REST write path,
//! which runs the same delivery pipeline as the socket.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::error::types::BackendResult;
use crate::backend::messaging::broker::DeliveryBroker;
use crate::backend::messaging::directory::{attach_posts, enrich_conversations};
use crate::backend::middleware::identity::SessionUser;
use crate::backend::server::state::AppState;
use crate::shared::messaging::{Conversation, DirectMessage, MessageKind, NewMessage};

/// Body of `POST /api/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(alias = "recipientId")]
    pub recipient: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Body of `POST /api/messages/share`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePostRequest {
    #[serde(alias = "recipientId")]
    pub recipient: String,
    pub post_id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Query of `GET /api/messages/{counterpart}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Only return messages at or after this instant
    pub since: Option<DateTime<Utc>>,
}

/// `GET /api/messages`: the caller's conversations, most recent first
pub async fn list_conversations(
    State(state): State<AppState>,
    SessionUser(me): SessionUser,
) -> BackendResult<Json<Vec<Conversation>>> {
    let mut conversations = state.store.conversations_for(&me).await?;
    enrich_conversations(state.directory.as_ref(), &mut conversations).await?;
    for conversation in conversations.iter_mut() {
        attach_posts(state.posts.as_ref(), std::slice::from_mut(&mut conversation.last_message)).await?;
    }
    Ok(Json(conversations))
}

/// `GET /api/messages/{counterpart}`: history with one user, oldest first.
///
/// Fetching the full history acknowledges it: the counterpart's messages to
/// the caller are marked read and the counterpart is notified. A `since`
/// delta is a background catch-up and leaves read state alone.
pub async fn get_history(
    State(state): State<AppState>,
    SessionUser(me): SessionUser,
    Path(counterpart): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> BackendResult<Json<Vec<DirectMessage>>> {
    let mut messages = match query.since {
        Some(since) => state.store.history_since(&me, &counterpart, since).await?,
        None => state.store.history(&me, &counterpart).await?,
    };
    attach_posts(state.posts.as_ref(), &mut messages).await?;

    if query.since.is_none() {
        state.read_tracker.acknowledge_read(&me, &counterpart).await?;
    }

    Ok(Json(messages))
}

/// `POST /api/messages`
pub async fn send_message(
    State(broker): State<DeliveryBroker>,
    SessionUser(me): SessionUser,
    Json(request): Json<SendMessageRequest>,
) -> BackendResult<(StatusCode, Json<DirectMessage>)> {
    let intent = NewMessage {
        sender: me,
        recipient: request.recipient,
        content: request.content,
        kind: request.kind,
        post_id: request.post_id,
        client_id: request.client_id,
    };
    let report = broker.deliver(intent).await?;
    Ok((StatusCode::CREATED, Json(report.message)))
}

/// `POST /api/messages/share`
pub async fn share_post(
    State(broker): State<DeliveryBroker>,
    SessionUser(me): SessionUser,
    Json(request): Json<SharePostRequest>,
) -> BackendResult<(StatusCode, Json<DirectMessage>)> {
    let report = broker
        .share_post(&me, &request.recipient, &request.post_id, request.message, request.client_id)
        .await?;
    Ok((StatusCode::CREATED, Json(report.message)))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
