//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the client cache and the server. They are used for serialization over the
//! WebSocket event contract and the REST read path.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for serialization
//! and transmission as JSON.

/// Real-time event contract
pub mod event;

/// Shared error types
pub mod error;

/// Client configuration
pub mod config;

/// Direct messaging types
pub mod messaging;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::SharedError;
pub use event::{ClientEvent, ServerEvent};
pub use messaging::{Conversation, DirectMessage, MessageKind, NewMessage, PostSnapshot, UserSummary};
