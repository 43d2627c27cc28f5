//! REST API integration tests
//!
//! Drives the full router with `tower::ServiceExt::oneshot`.

#![cfg(feature = "ssr")]

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use campus_dm::backend::create_app;
use campus_dm::backend::middleware::USER_ID_HEADER;
use campus_dm::shared::event::MarkedReadPayload;
use campus_dm::shared::{Conversation, DirectMessage, MessageKind, ServerEvent};
use common::{drain, seeded_state, Session};

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn get(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(USER_ID_HEADER, user)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, user: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(USER_ID_HEADER, user)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_app(seeded_state());
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = create_app(seeded_state());
    let request = Request::builder().uri("/api/messages").body(Body::empty()).unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_app(seeded_state());
    let (status, _) = call(&app, get("/api/nothing/here/at/all", "u1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_send_then_list_and_read() {
    let state = seeded_state();
    let app = create_app(state.clone());
    let mut ada = Session::join(&state, "u1").await;

    let (status, body) = call(
        &app,
        post("/api/messages", "u1", json!({"recipient": "u2", "content": "hello", "clientId": "temp_r_1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let sent: DirectMessage = serde_json::from_slice(&body).unwrap();
    assert_eq!(sent.client_id.as_deref(), Some("temp_r_1"));
    assert!(!sent.read);
    // The REST write path echoes to the sender's live connection too
    assert_eq!(drain(&mut ada.inbox), vec![ServerEvent::NewMessage(sent.clone())]);

    let (status, body) = call(&app, get("/api/messages", "u2")).await;
    assert_eq!(status, StatusCode::OK);
    let conversations: Vec<Conversation> = serde_json::from_slice(&body).unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].user.name, "Ada");
    assert!(conversations[0].unread);

    // Fetching history returns the pre-read view and then marks it read
    let (status, body) = call(&app, get("/api/messages/u1", "u2")).await;
    assert_eq!(status, StatusCode::OK);
    let history: Vec<DirectMessage> = serde_json::from_slice(&body).unwrap();
    assert_eq!(history, vec![sent]);
    assert_eq!(
        drain(&mut ada.inbox),
        vec![ServerEvent::MessagesMarkedRead(MarkedReadPayload { by: "u2".into() })]
    );

    let (_, body) = call(&app, get("/api/messages", "u2")).await;
    let conversations: Vec<Conversation> = serde_json::from_slice(&body).unwrap();
    assert!(!conversations[0].unread);
}

#[tokio::test]
async fn test_history_since_is_inclusive() {
    let state = seeded_state();
    let app = create_app(state.clone());

    let mut sent = Vec::new();
    for content in ["one", "two", "three"] {
        let (_, body) = call(&app, post("/api/messages", "u1", json!({"recipient": "u2", "content": content}))).await;
        sent.push(serde_json::from_slice::<DirectMessage>(&body).unwrap());
    }

    let since = sent[1].created_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
    let uri = format!("/api/messages/u2?since={}", since.replace('+', "%2B"));
    let (status, body) = call(&app, get(&uri, "u1")).await;
    assert_eq!(status, StatusCode::OK);
    let delta: Vec<String> = serde_json::from_slice::<Vec<DirectMessage>>(&body)
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(delta, vec!["two", "three"]);
}

#[tokio::test]
async fn test_history_delta_leaves_read_state_alone() {
    let state = seeded_state();
    let app = create_app(state.clone());
    let mut ada = Session::join(&state, "u1").await;

    let (_, body) = call(&app, post("/api/messages", "u1", json!({"recipient": "u2", "content": "ping"}))).await;
    let sent: DirectMessage = serde_json::from_slice(&body).unwrap();
    drain(&mut ada.inbox);

    let since = sent.created_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
    let (status, body) = call(&app, get(&format!("/api/messages/u1?since={since}"), "u2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Vec<DirectMessage>>(&body).unwrap(), vec![sent]);

    assert!(drain(&mut ada.inbox).is_empty());
    let (_, body) = call(&app, get("/api/messages", "u2")).await;
    let conversations: Vec<Conversation> = serde_json::from_slice(&body).unwrap();
    assert!(conversations[0].unread);
}

#[tokio::test]
async fn test_rejections_map_to_status_codes() {
    let app = create_app(seeded_state());

    let (status, body) = call(&app, post("/api/messages", "u1", json!({"recipient": "nobody", "content": "hi"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], 404);
    assert!(body["error"].is_string());

    let (status, _) = call(&app, post("/api/messages", "u1", json!({"recipient": "u2", "content": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, post("/api/messages", "ghost", json!({"recipient": "u2", "content": "boo"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        post("/api/messages/share", "u1", json!({"recipient": "u2", "postId": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_post_carries_snapshot() {
    let state = seeded_state();
    let app = create_app(state.clone());
    let mut grace = Session::join(&state, "u2").await;

    let (status, body) = call(
        &app,
        post("/api/messages/share", "u1", json!({"recipient": "u2", "postId": "p1", "message": "you in?"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let shared: DirectMessage = serde_json::from_slice(&body).unwrap();
    assert_eq!(shared.kind, MessageKind::SharedPost);
    assert_eq!(shared.content, "you in?");
    assert_eq!(shared.post.as_ref().map(|p| p.content.as_str()), Some("Hackathon this weekend"));

    assert_eq!(drain(&mut grace.inbox), vec![ServerEvent::NewMessage(shared)]);

    // History attaches the snapshot again on read
    let (_, body) = call(&app, get("/api/messages/u1", "u2")).await;
    let history: Vec<DirectMessage> = serde_json::from_slice(&body).unwrap();
    assert_eq!(history[0].post_id.as_deref(), Some("p1"));
    assert!(history[0].post.is_some());
}

#[tokio::test]
async fn test_conversation_list_carries_post_snapshot() {
    let app = create_app(seeded_state());
    let (status, _) = call(&app, post("/api/messages/share", "u1", json!({"recipient": "u2", "postId": "p1"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = call(&app, get("/api/messages", "u2")).await;
    let conversations: Vec<Conversation> = serde_json::from_slice(&body).unwrap();
    let last = &conversations[0].last_message;
    assert_eq!(last.post_id.as_deref(), Some("p1"));
    assert_eq!(last.post.as_ref().map(|p| p.author.id.as_str()), Some("u2"));
}
