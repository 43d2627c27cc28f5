/**
 * Message Store
 *
 * Durable persistence of one-to-one messages. The store is the source of
 * truth: nothing is fanned out before `append` has returned.
 *
 * # Ordering
 *
 * Messages are ordered by `created_at`. Timestamps handed out by the
 * in-memory store are strictly increasing, so two appends in a row always
 * come back in the same order from `history`.
 *
 * # Read State
 *
 * `history` never changes read flags. Callers that want "fetch and
 * acknowledge" call `mark_read` themselves.
 */

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::types::{BackendError, BackendResult};
use crate::backend::messaging::directory::UserDirectory;
use crate::shared::messaging::{derive_conversations, Conversation, DirectMessage, NewMessage};

/// Persistence seam for direct messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Validate and persist a send intent, returning the canonical message
    async fn append(&self, intent: NewMessage) -> BackendResult<DirectMessage>;

    /// Every message between the unordered pair, oldest first
    async fn history(&self, a: &str, b: &str) -> BackendResult<Vec<DirectMessage>>;

    /// Messages between the pair with `created_at >= since`, oldest first
    async fn history_since(&self, a: &str, b: &str, since: DateTime<Utc>) -> BackendResult<Vec<DirectMessage>>;

    /// One entry per counterpart, most recent activity first
    async fn conversations_for(&self, user: &str) -> BackendResult<Vec<Conversation>>;

    /// Mark everything `counterpart` sent to `user` as read; returns how many changed
    async fn mark_read(&self, user: &str, counterpart: &str) -> BackendResult<u64>;
}

/// In-memory message store
///
/// Used by tests and by the server when no database is configured.
pub struct MemoryMessageStore {
    messages: RwLock<Vec<DirectMessage>>,
    directory: Arc<dyn UserDirectory>,
}

impl MemoryMessageStore {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            directory,
        }
    }

    /// Number of persisted messages
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn append(&self, intent: NewMessage) -> BackendResult<DirectMessage> {
        intent.validate()?;
        if self.directory.resolve_user(&intent.recipient).await?.is_none() {
            return Err(BackendError::not_found("recipient", intent.recipient));
        }

        let mut messages = self.messages.write().await;
        let now = Utc::now();
        let created_at = match messages.last() {
            Some(last) if last.created_at >= now => last.created_at + Duration::microseconds(1),
            _ => now,
        };
        let message = intent.into_message(Uuid::new_v4().to_string(), created_at);
        messages.push(message.clone());

        tracing::debug!(
            "[Store] Appended {} from {} to {} ({} total)",
            message.id,
            message.sender,
            message.recipient,
            messages.len()
        );
        Ok(message)
    }

    async fn history(&self, a: &str, b: &str) -> BackendResult<Vec<DirectMessage>> {
        let messages = self.messages.read().await;
        Ok(messages.iter().filter(|m| m.is_between(a, b)).cloned().collect())
    }

    async fn history_since(&self, a: &str, b: &str, since: DateTime<Utc>) -> BackendResult<Vec<DirectMessage>> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.is_between(a, b) && m.created_at >= since)
            .cloned()
            .collect())
    }

    async fn conversations_for(&self, user: &str) -> BackendResult<Vec<Conversation>> {
        let messages = self.messages.read().await;
        Ok(derive_conversations(user, messages.iter().rev()))
    }

    async fn mark_read(&self, user: &str, counterpart: &str) -> BackendResult<u64> {
        let mut messages = self.messages.write().await;
        let mut changed = 0;
        for message in messages
            .iter_mut()
            .filter(|m| m.recipient == user && m.sender == counterpart && !m.read)
        {
            message.read = true;
            changed += 1;
        }
        if changed > 0 {
            tracing::debug!("[Store] {} read {} message(s) from {}", user, changed, counterpart);
        }
        Ok(changed)
    }
}
