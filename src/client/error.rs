//! Client error types

use thiserror::Error;

use crate::shared::{ConfigError, SharedError};

/// Errors raised by the client cache, transport and REST API
#[derive(Debug, Error)]
pub enum ClientError {
    /// The event could not be handed to the connection
    #[error("Transport error: {0}")]
    Transport(String),

    /// The REST request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// No pending send with this temporary id
    #[error("Unknown message: {0}")]
    UnknownMessage(String),

    /// Only orphaned sends can be retried
    #[error("Message {0} is not in a failed state")]
    NotOrphaned(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Shared(#[from] SharedError),
}
