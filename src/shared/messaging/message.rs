//! Direct Message Data Structure
//!
//! Represents a one-to-one message between two users. The server assigns the
//! `id` and `created_at`; everything else comes from the send intent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::PostSnapshot;
use crate::shared::error::SharedError;

/// Prefix carried by every client-fabricated (optimistic) message id.
///
/// Server ids are hyphenated UUIDs, so an id with this prefix can never be
/// mistaken for a persisted message.
pub const TEMP_ID_PREFIX: &str = "temp_";

/// Returns true if `id` was fabricated client-side and has not been persisted.
pub fn is_temporary_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Kind of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MessageKind {
    /// Plain text message
    #[default]
    #[serde(rename = "text")]
    Text,
    /// A feed post shared into the conversation
    #[serde(rename = "post", alias = "sharedPost")]
    SharedPost,
}

impl MessageKind {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::SharedPost => "post",
        }
    }

    /// Parse from string (database)
    pub fn from_db(s: &str) -> Self {
        match s {
            "post" | "sharedPost" => MessageKind::SharedPost,
            _ => MessageKind::Text,
        }
    }
}

/// A persisted (or optimistic) direct message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    /// Server-assigned id, or a `temp_` id while optimistic
    pub id: String,
    /// User who sent the message
    pub sender: String,
    /// User the message was sent to
    pub recipient: String,
    /// Text body (may be empty for shared posts)
    #[serde(default)]
    pub content: String,
    /// Kind of message
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Referenced post for shared-post messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    /// Resolved post snapshot, attached at fan-out/read time only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<PostSnapshot>,
    /// Whether the recipient has read the message
    #[serde(default)]
    pub read: bool,
    /// Authoritative ordering key
    pub created_at: DateTime<Utc>,
    /// Correlation id chosen by the sending client, echoed unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl DirectMessage {
    /// The participant of this message that is not `me`.
    ///
    /// For a message a user sent to themselves this is `me` again.
    pub fn counterpart_of(&self, me: &str) -> &str {
        if self.sender == me {
            &self.recipient
        } else {
            &self.sender
        }
    }

    /// Whether the message was exchanged between `a` and `b` in either direction.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.sender == a && self.recipient == b) || (self.sender == b && self.recipient == a)
    }

    /// Whether the message still carries a client-fabricated id
    pub fn is_temporary(&self) -> bool {
        is_temporary_id(&self.id)
    }

    /// Get a preview of the message (first N characters)
    pub fn preview(&self, max_len: usize) -> String {
        if self.content.chars().count() <= max_len {
            self.content.clone()
        } else {
            let mut preview: String = self.content.chars().take(max_len.saturating_sub(3)).collect();
            preview.push_str("...");
            preview
        }
    }
}

/// A send intent, validated before anything is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender: String,
    pub recipient: String,
    pub content: String,
    pub kind: MessageKind,
    pub post_id: Option<String>,
    pub client_id: Option<String>,
}

impl NewMessage {
    /// Create a text message intent
    pub fn text(sender: impl Into<String>, recipient: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            content: content.into(),
            kind: MessageKind::Text,
            post_id: None,
            client_id: None,
        }
    }

    /// Create a shared-post intent; the optional note becomes the content
    pub fn shared_post(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        post_id: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            content: note.unwrap_or_default(),
            kind: MessageKind::SharedPost,
            post_id: Some(post_id.into()),
            client_id: None,
        }
    }

    /// Attach the client's correlation id
    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }

    /// Check the content/kind constraints of a message
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.sender.trim().is_empty() {
            return Err(SharedError::validation("senderId", "Sender is required"));
        }
        if self.recipient.trim().is_empty() {
            return Err(SharedError::validation("recipientId", "Recipient is required"));
        }
        match self.kind {
            MessageKind::Text => {
                if self.content.trim().is_empty() {
                    return Err(SharedError::validation("content", "Message content cannot be empty"));
                }
            }
            MessageKind::SharedPost => {
                let has_post = self.post_id.as_deref().is_some_and(|p| !p.trim().is_empty());
                if !has_post {
                    return Err(SharedError::validation("postId", "Shared post messages require a post reference"));
                }
            }
        }
        Ok(())
    }

    /// Turn a validated intent into a canonical message
    pub fn into_message(self, id: String, created_at: DateTime<Utc>) -> DirectMessage {
        DirectMessage {
            id,
            sender: self.sender,
            recipient: self.recipient,
            content: self.content,
            kind: self.kind,
            post_id: self.post_id,
            post: None,
            read: false,
            created_at,
            client_id: self.client_id,
        }
    }
}
