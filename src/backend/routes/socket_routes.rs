//! WebSocket route
//!
//! - `GET /ws` - Upgrade to the real-time event connection

use axum::{routing::get, Router};

use crate::backend::realtime::socket::handle_socket_upgrade;
use crate::backend::server::state::AppState;

pub fn configure_socket_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/ws", get(handle_socket_upgrade))
}
