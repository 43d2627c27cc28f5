//! Middleware Module
//!
//! Request processing shared by the REST handlers.

/// Caller identity extraction
pub mod identity;

pub use identity::{SessionUser, USER_ID_HEADER};
