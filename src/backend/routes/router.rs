/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Health check
 * 2. WebSocket gateway
 * 3. API routes
 * 4. Fallback handler (404)
 */

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::messaging::handlers::health;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::socket_routes::configure_socket_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state holding the messaging components
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/health", axum::routing::get(health));

    let router = configure_socket_routes(router);
    let router = configure_api_routes(router);

    let router = router.fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") });

    router.layer(TraceLayer::new_for_http()).with_state(app_state)
}
