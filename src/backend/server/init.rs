/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation, database loading, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Load the optional database
 * 2. Pick PostgreSQL or in-memory components
 * 3. Create the presence router and wire the broker around it
 * 4. Create and configure the router
 *
 * # Shutdown
 *
 * `shutdown` clears the presence router so no further events are routed to
 * connections that are still draining.
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::messaging::db::{PgMessageStore, PgPostSnapshots, PgUserDirectory};
use crate::backend::realtime::presence::PresenceRouter;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Build the application state for a configuration
///
/// # Error Handling
///
/// The function is designed to be resilient:
/// - Missing database: in-memory store, users learned on join
/// - Migration failures: logged but don't prevent startup
pub async fn build_state(config: &ServerConfig) -> AppState {
    tracing::info!("Initializing campus-dm messaging server");

    // Step 1: Load optional database
    let db_pool = load_database(config).await;

    // Step 2: Choose storage and adapters
    let state = match db_pool {
        Some(pool) => {
            tracing::info!("Using PostgreSQL message store");
            AppState::new(
                Arc::new(PgMessageStore::new(pool.clone())),
                Arc::new(PgUserDirectory::new(pool.clone())),
                Arc::new(PgPostSnapshots::new(pool)),
                PresenceRouter::new(),
            )
        }
        None => {
            tracing::info!("Using in-memory message store");
            AppState::in_memory()
        }
    };

    tracing::info!("Presence router and delivery broker initialized");
    state
}

/// Create the Axum application around existing state
pub fn create_app(state: AppState) -> Router<()> {
    let app = create_router(state);
    tracing::info!("Router configured");
    app
}

/// Release process-wide resources before exit
pub async fn shutdown(state: &AppState) {
    let dropped = state.presence.clear().await;
    tracing::info!("Shutdown complete, closed {} connection(s)", dropped);
}

/// Resolves when the process receives Ctrl+C (or SIGTERM on Unix)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
