//! Conversation Data Structure
//!
//! A conversation is derived, never stored: the latest message exchanged with
//! one counterpart plus an unread flag.

use serde::{Deserialize, Serialize};

use super::message::DirectMessage;
use super::user::UserSummary;

/// Represents the conversation between the current user and one counterpart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// The other participant
    pub user: UserSummary,
    /// Most recent message exchanged with `user`
    pub last_message: DirectMessage,
    /// True iff the last message was sent to the current user and is unread
    pub unread: bool,
}

impl Conversation {
    /// Derive the entry for `me` from the latest message of a pair
    pub fn from_latest(me: &str, last_message: DirectMessage) -> Self {
        let counterpart = last_message.counterpart_of(me).to_string();
        let unread = last_message.recipient == me && !last_message.read;
        Self {
            user: UserSummary::bare(counterpart),
            last_message,
            unread,
        }
    }

    /// Id of the other participant
    pub fn counterpart(&self) -> &str {
        &self.user.id
    }
}

/// Collapse a message log into one conversation per counterpart.
///
/// `messages_newest_first` must be sorted by descending `created_at`; the
/// result keeps that order, so the most recently active conversation is first.
pub fn derive_conversations<'a, I>(me: &str, messages_newest_first: I) -> Vec<Conversation>
where
    I: IntoIterator<Item = &'a DirectMessage>,
{
    let mut seen = std::collections::HashSet::new();
    let mut conversations = Vec::new();
    for message in messages_newest_first {
        if message.sender != me && message.recipient != me {
            continue;
        }
        let counterpart = message.counterpart_of(me);
        if seen.insert(counterpart.to_string()) {
            conversations.push(Conversation::from_latest(me, message.clone()));
        }
    }
    conversations
}
