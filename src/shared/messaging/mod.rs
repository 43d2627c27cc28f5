//! Messaging Module
//!
//! This module contains all the data structures for direct messaging:
//!
//! - `DirectMessage` - A message between two users
//! - `Conversation` - The derived per-counterpart view
//! - `UserSummary` / `PostSnapshot` - Shapes from the external directory and post service
//!
//! # Usage
//!
//! ```rust
//! use campus_dm::shared::messaging::{DirectMessage, Conversation, NewMessage};
//! ```

pub mod conversation;
pub mod message;
pub mod user;

// Re-export all types
pub use conversation::{derive_conversations, Conversation};
pub use message::{is_temporary_id, DirectMessage, MessageKind, NewMessage, TEMP_ID_PREFIX};
pub use user::{PostSnapshot, UserSummary};
