/**
 * Real-time Event Contract
 *
 * This module defines the named events exchanged over the persistent
 * connection. Every frame is a JSON object of the form
 * `{"event": "<name>", "data": <payload>}`.
 *
 * Client → Server: `join`, `private-message`, `mark-messages-read`, `share-post`
 * Server → Client: `new-message`, `messages-marked-read`, `message-error`
 */
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::messaging::{DirectMessage, MessageKind, NewMessage};

/// Events sent by a client session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Bind this connection to a user and its rooms
    Join(JoinPayload),
    /// Send a direct message
    PrivateMessage(PrivateMessagePayload),
    /// Acknowledge every unread message from `sender_id`
    MarkMessagesRead(MarkReadPayload),
    /// Share a feed post into a conversation
    SharePost(SharePostPayload),
}

/// Events pushed by the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Canonical message, sent to the recipient and echoed to the sender
    NewMessage(DirectMessage),
    /// The counterpart read the messages we sent them
    MessagesMarkedRead(MarkedReadPayload),
    /// A send from this connection failed
    MessageError(MessageErrorPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessagePayload {
    pub sender_id: String,
    pub recipient_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl PrivateMessagePayload {
    pub fn into_intent(self) -> NewMessage {
        NewMessage {
            sender: self.sender_id,
            recipient: self.recipient_id,
            content: self.content,
            kind: self.kind,
            post_id: self.post_id,
            client_id: self.client_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadPayload {
    /// The reader
    pub user_id: String,
    /// Whose messages are being acknowledged
    pub sender_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SharePostPayload {
    pub sender_id: String,
    pub recipient_id: String,
    pub post_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl SharePostPayload {
    pub fn into_intent(self) -> NewMessage {
        NewMessage::shared_post(self.sender_id, self.recipient_id, self.post_id, self.message)
            .with_client_id(self.client_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkedReadPayload {
    pub by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageErrorPayload {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl ClientEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join(_) => "join",
            ClientEvent::PrivateMessage(_) => "private-message",
            ClientEvent::MarkMessagesRead(_) => "mark-messages-read",
            ClientEvent::SharePost(_) => "share-post",
        }
    }

    /// Decode a text frame
    pub fn from_frame(frame: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Encode as a text frame
    pub fn to_frame(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::NewMessage(_) => "new-message",
            ServerEvent::MessagesMarkedRead(_) => "messages-marked-read",
            ServerEvent::MessageError(_) => "message-error",
        }
    }

    /// Create a `message-error` event
    pub fn error(error: impl Into<String>, details: Option<String>, client_id: Option<String>) -> Self {
        ServerEvent::MessageError(MessageErrorPayload {
            error: error.into(),
            details,
            client_id,
        })
    }

    /// Decode a text frame
    pub fn from_frame(frame: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Encode as a text frame
    pub fn to_frame(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}
