//! Real-time Module
//!
//! Live connections and the event contract spoken over them.
//!
//! # Architecture
//!
//! - **`presence`** - which user is reachable on which connection, and rooms
//! - **`socket`** - the `/ws` WebSocket gateway
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports and documentation
//! ├── presence.rs  - Presence trait and PresenceRouter
//! └── socket.rs    - Upgrade handler, reader/writer loops, dispatch
//! ```
//!
//! # Delivery Semantics
//!
//! Events are pushed only to users with a live connection. Nothing is queued
//! for offline users; they catch up through the REST read path.

pub mod presence;
pub mod socket;

pub use presence::{ConnectionId, Presence, PresenceRouter, Room};
pub use socket::handle_socket_upgrade;
