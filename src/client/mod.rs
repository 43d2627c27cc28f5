//! Client Module
//!
//! Client-side half of the messaging core: a per-user conversation cache
//! with optimistic sends, the outbound transport seam, and a REST client
//! for hydration and reconnect catch-up.
//!
//! # Reconnect Flow
//!
//! ```text
//! disconnect() ──► pending sends orphaned
//! reconnect()  ──► join re-emitted, catch-up cursors returned
//! MessagesApi::catch_up(cursors) ──► merge_history per conversation
//! retry(temp_id) ──► orphaned send emitted again
//! ```

pub mod api;
pub mod cache;
pub mod error;
pub mod optimistic;
pub mod transport;

pub use api::MessagesApi;
pub use cache::{CachedMessage, CatchUpCursor, ConversationCache};
pub use error::ClientError;
pub use optimistic::{DeliveryState, OptimisticLedger, PendingSend};
pub use transport::{ChannelTransport, ClientTransport};
