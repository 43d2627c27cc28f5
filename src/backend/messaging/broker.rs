/**
 * Delivery Broker
 *
 * Turns a send intent into a persisted message and pushes it to both
 * participants.
 *
 * # Pipeline
 *
 * 1. Resolve sender and recipient through the user directory
 * 2. Resolve the post for shared-post messages
 * 3. Append to the message store (nothing is sent if this fails)
 * 4. Send `new-message` to the recipient, then echo it to the sender
 *
 * There are no retries. An offline recipient is not an error; the message is
 * in the store and will be picked up on the next history fetch.
 */

use std::sync::Arc;

use crate::backend::error::types::{BackendError, BackendResult};
use crate::backend::messaging::directory::{PostSnapshots, UserDirectory};
use crate::backend::messaging::store::MessageStore;
use crate::backend::realtime::presence::Presence;
use crate::shared::messaging::{DirectMessage, MessageKind, NewMessage};
use crate::shared::ServerEvent;

/// Outcome of a successful delivery
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    /// The canonical, persisted message (with its post snapshot attached)
    pub message: DirectMessage,
    /// Whether the recipient had a live connection
    pub recipient_online: bool,
    /// Whether the sender's own connection received the echo
    pub sender_echoed: bool,
}

/// Persists messages and fans them out
#[derive(Clone)]
pub struct DeliveryBroker {
    store: Arc<dyn MessageStore>,
    directory: Arc<dyn UserDirectory>,
    posts: Arc<dyn PostSnapshots>,
    presence: Arc<dyn Presence>,
}

impl DeliveryBroker {
    pub fn new(
        store: Arc<dyn MessageStore>,
        directory: Arc<dyn UserDirectory>,
        posts: Arc<dyn PostSnapshots>,
        presence: Arc<dyn Presence>,
    ) -> Self {
        Self {
            store,
            directory,
            posts,
            presence,
        }
    }

    /// Persist and fan out a message
    pub async fn deliver(&self, intent: NewMessage) -> BackendResult<DeliveryReport> {
        if self.directory.resolve_user(&intent.sender).await?.is_none() {
            tracing::warn!("[Broker] Unknown sender {}", intent.sender);
            return Err(BackendError::not_found("sender", intent.sender));
        }
        if self.directory.resolve_user(&intent.recipient).await?.is_none() {
            tracing::warn!("[Broker] Unknown recipient {}", intent.recipient);
            return Err(BackendError::not_found("recipient", intent.recipient));
        }
        intent.validate()?;

        let post = match (intent.kind, intent.post_id.as_deref()) {
            (MessageKind::SharedPost, Some(post_id)) => match self.posts.resolve_post(post_id).await? {
                Some(post) => Some(post),
                None => {
                    tracing::warn!("[Broker] Unknown post {}", post_id);
                    return Err(BackendError::not_found("post", post_id));
                }
            },
            _ => None,
        };

        let mut message = self.store.append(intent).await.inspect_err(|e| {
            tracing::error!("[Broker] Failed to persist message: {}", e);
        })?;
        message.post = post;

        let event = ServerEvent::NewMessage(message.clone());
        let recipient_online = self.presence.send(&message.recipient, event.clone()).await;
        let sender_echoed = self.presence.send(&message.sender, event).await;

        tracing::info!(
            "[Broker] {} -> {} delivered as {} (recipient online: {}, echoed: {})",
            message.sender,
            message.recipient,
            message.id,
            recipient_online,
            sender_echoed
        );

        Ok(DeliveryReport {
            message,
            recipient_online,
            sender_echoed,
        })
    }

    /// Share a feed post into a conversation, with an optional note
    pub async fn share_post(
        &self,
        sender: &str,
        recipient: &str,
        post_id: &str,
        note: Option<String>,
        client_id: Option<String>,
    ) -> BackendResult<DeliveryReport> {
        self.deliver(NewMessage::shared_post(sender, recipient, post_id, note).with_client_id(client_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::messaging::directory::{MemoryPostSnapshots, MemoryUserDirectory};
    use crate::backend::messaging::store::MemoryMessageStore;
    use crate::backend::realtime::presence::PresenceRouter;
    use crate::shared::messaging::{PostSnapshot, UserSummary};
    use crate::shared::SharedError;
    use assert_matches::assert_matches;
    use tokio::sync::mpsc;

    struct Fixture {
        broker: DeliveryBroker,
        store: Arc<MemoryMessageStore>,
        presence: PresenceRouter,
    }

    fn fixture() -> Fixture {
        let directory: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::with_users([
            UserSummary::new("u1", "Ada"),
            UserSummary::new("u2", "Grace"),
        ]));
        let posts = Arc::new(MemoryPostSnapshots::with_posts([PostSnapshot {
            id: "p1".into(),
            author: UserSummary::new("u2", "Grace"),
            content: "Hackathon this weekend".into(),
            image: Some("hackathon.png".into()),
        }]));
        let store = Arc::new(MemoryMessageStore::new(directory.clone()));
        let presence = PresenceRouter::new();
        let broker = DeliveryBroker::new(store.clone(), directory, posts, Arc::new(presence.clone()));
        Fixture { broker, store, presence }
    }

    #[tokio::test]
    async fn test_delivers_to_recipient_then_sender() {
        let f = fixture();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let c1 = f.presence.connect(tx1).await;
        let c2 = f.presence.connect(tx2).await;
        f.presence.join(c1, "u1", None).await;
        f.presence.join(c2, "u2", None).await;

        let report = f
            .broker
            .deliver(NewMessage::text("u1", "u2", "hello").with_client_id(Some("temp_s_1".into())))
            .await
            .unwrap();

        assert!(report.recipient_online);
        assert!(report.sender_echoed);
        let expected = ServerEvent::NewMessage(report.message.clone());
        assert_eq!(rx2.recv().await, Some(expected.clone()));
        assert_eq!(rx1.recv().await, Some(expected));
        assert_eq!(report.message.client_id.as_deref(), Some("temp_s_1"));
    }

    #[tokio::test]
    async fn test_offline_recipient_is_not_an_error() {
        let f = fixture();
        let report = f.broker.deliver(NewMessage::text("u1", "u2", "hello")).await.unwrap();
        assert!(!report.recipient_online);
        assert!(!report.sender_echoed);
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_parties_are_rejected_in_order() {
        let f = fixture();

        let err = f.broker.deliver(NewMessage::text("u9", "u8", "hi")).await.unwrap_err();
        assert_eq!(err.client_summary(), "Sender not found");

        let err = f.broker.deliver(NewMessage::text("u1", "u8", "hi")).await.unwrap_err();
        assert_eq!(err.client_summary(), "Recipient not found");

        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let f = fixture();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = f.presence.connect(tx).await;
        f.presence.join(conn, "u1", None).await;

        let err = f.broker.deliver(NewMessage::text("u1", "u2", "  ")).await.unwrap_err();
        assert_matches!(err, BackendError::SharedError(SharedError::ValidationError { .. }));
        assert!(rx.try_recv().is_err());
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_share_post_attaches_snapshot() {
        let f = fixture();
        let report = f
            .broker
            .share_post("u1", "u2", "p1", Some("look".into()), None)
            .await
            .unwrap();

        assert_eq!(report.message.kind, MessageKind::SharedPost);
        assert_eq!(report.message.content, "look");
        assert_eq!(report.message.post.as_ref().map(|p| p.author.id.as_str()), Some("u2"));

        let err = f.broker.share_post("u1", "u2", "missing", None, None).await.unwrap_err();
        assert_eq!(err.client_summary(), "Post not found");
    }
}
