//! Routes Module
//!
//! HTTP route configuration.
//!
//! - **`router`** - Main router assembly
//! - **`api_routes`** - REST messaging endpoints
//! - **`socket_routes`** - WebSocket endpoint

/// Main router creation
pub mod router;

/// API route configuration
pub mod api_routes;

/// WebSocket route configuration
pub mod socket_routes;

pub use router::create_router;
