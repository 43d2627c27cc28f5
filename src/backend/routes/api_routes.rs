/**
 * API Route Handlers
 *
 * # Routes
 *
 * ## Read path
 * - `GET /api/messages` - Conversations of the caller
 * - `GET /api/messages/{counterpart}` - History with one user (`?since=` for a delta)
 *
 * ## Write path
 * - `POST /api/messages` - Send a message
 * - `POST /api/messages/share` - Share a post
 *
 * Every route requires the `x-user-id` header.
 */

use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::messaging::handlers::{get_history, list_conversations, send_message, share_post};
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// # Arguments
///
/// * `router` - The router to add routes to
///
/// # Returns
///
/// Router with API routes configured
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/messages", get(list_conversations).post(send_message))
        .route("/api/messages/share", post(share_post))
        .route("/api/messages/{counterpart}", get(get_history))
}
