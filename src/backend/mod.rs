//! Backend Module
//!
//! This module contains all server-side code for the direct-messaging core.
//! It provides an Axum HTTP server with a WebSocket gateway, a REST read and
//! write path, and the components behind them.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization, shutdown
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`messaging`** - Message store, directory adapters, delivery broker,
//!   read-state tracker, REST handlers
//! - **`realtime`** - Presence router and WebSocket gateway
//! - **`middleware`** - Caller identity extraction
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── messaging/      - Store, broker, read state, handlers
//! ├── realtime/       - Presence and WebSocket gateway
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Delivery Flow
//!
//! ```text
//! private-message ──► DeliveryBroker ──► MessageStore::append
//!                          │
//!                          ├──► Presence::send(recipient, new-message)
//!                          └──► Presence::send(sender,    new-message)
//! ```
//!
//! A message is always persisted before anything is pushed. Pushes to users
//! without a live connection are dropped; the store is where they catch up.
//!
//! # Thread Safety
//!
//! - Presence state lives behind one `tokio::sync::RwLock`
//! - Store, directory and post adapters are `Arc<dyn Trait + Send + Sync>`
//! - Each socket runs a reader loop and a writer task joined by an mpsc channel
//!
//! # Example
//!
//! ```rust,no_run
//! use campus_dm::backend::server::{create_app, AppState};
//!
//! # async fn example() {
//! let app = create_app(AppState::in_memory());
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//! axum::serve(listener, app).await.unwrap();
//! # }
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Direct messaging core
pub mod messaging;

/// Real-time connections
pub mod realtime;

/// Backend error types
pub mod error;

/// Middleware for request processing
pub mod middleware;

/// Re-export commonly used types
pub use error::BackendError;
pub use messaging::{DeliveryBroker, DeliveryReport, MessageStore, ReadStateTracker};
pub use realtime::{Presence, PresenceRouter};
pub use server::{create_app, AppState};
