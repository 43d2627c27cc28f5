//! Campus DM - Main Library
//!
//! One-to-one direct messaging core for a campus social feed: durable
//! message storage, real-time delivery over a persistent connection, read
//! receipts, conversation summaries, post sharing, and a client cache with
//! optimistic sends.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between client and server
//!   - Message, conversation, user and post shapes
//!   - The named real-time event contract
//!   - Error and client configuration types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server with a WebSocket gateway
//!   - Message store (Postgres or in-memory), presence router, delivery broker
//!   - Read-state tracking and the REST read/write path
//!
//! - **`client`** - Client-side conversation cache
//!   - Optimistic sends reconciled against server echoes
//!   - Disconnect/reconnect handling with history catch-up
//!   - REST client for hydration
//!
//! # Feature Flags
//!
//! - **`ssr`** - Enables the backend modules and the server binary (default)
//!
//! # Usage
//!
//! ## Server-Side
//!
//! ```rust,no_run
//! use campus_dm::backend::server::{create_app, AppState};
//!
//! # async fn example() {
//! let app = create_app(AppState::in_memory());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```
//!
//! ## Client-Side
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use campus_dm::client::{ChannelTransport, ConversationCache};
//! use campus_dm::shared::{AppConfig, UserSummary};
//!
//! let (transport, _frames) = ChannelTransport::pair();
//! let mut cache = ConversationCache::new(
//!     UserSummary::new("u1", "Ada"),
//!     None,
//!     &AppConfig::default(),
//!     Arc::new(transport),
//! );
//! cache.connect().unwrap();
//! let temp_id = cache.send_text("u2", "hello").unwrap();
//! // feed incoming frames with cache.handle_event(event)
//! ```
//!
//! # Error Handling
//!
//! - `shared::SharedError` for validation and lookup failures
//! - `backend::BackendError` wraps those plus database and protocol errors
//! - `client::ClientError` for transport, HTTP and retry failures

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Client conversation cache
pub mod client;
