//! Read-state tracking
//!
//! Marks a counterpart's messages read and tells the counterpart about it, so
//! their sent messages can flip to "seen".

use std::sync::Arc;

use crate::backend::error::types::BackendResult;
use crate::backend::messaging::store::MessageStore;
use crate::backend::realtime::presence::Presence;
use crate::shared::event::MarkedReadPayload;
use crate::shared::ServerEvent;

#[derive(Clone)]
pub struct ReadStateTracker {
    store: Arc<dyn MessageStore>,
    presence: Arc<dyn Presence>,
}

impl ReadStateTracker {
    pub fn new(store: Arc<dyn MessageStore>, presence: Arc<dyn Presence>) -> Self {
        Self { store, presence }
    }

    /// `reader` has seen everything `counterpart` sent them.
    ///
    /// The notification goes out even when nothing changed, which keeps a
    /// counterpart that reconnected in sync. Returns the number of messages
    /// newly marked read.
    pub async fn acknowledge_read(&self, reader: &str, counterpart: &str) -> BackendResult<u64> {
        let changed = self.store.mark_read(reader, counterpart).await?;
        let notified = self
            .presence
            .send(
                counterpart,
                ServerEvent::MessagesMarkedRead(MarkedReadPayload { by: reader.to_string() }),
            )
            .await;

        tracing::debug!(
            "[ReadState] {} read {} message(s) from {} (notified: {})",
            reader,
            changed,
            counterpart,
            notified
        );
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::messaging::directory::MemoryUserDirectory;
    use crate::backend::messaging::store::MemoryMessageStore;
    use crate::backend::realtime::presence::PresenceRouter;
    use crate::shared::messaging::{NewMessage, UserSummary};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_acknowledge_marks_and_notifies_counterpart() {
        let directory = Arc::new(MemoryUserDirectory::with_users([
            UserSummary::new("u1", "Ada"),
            UserSummary::new("u2", "Grace"),
        ]));
        let store = Arc::new(MemoryMessageStore::new(directory));
        let presence = PresenceRouter::new();
        let tracker = ReadStateTracker::new(store.clone(), Arc::new(presence.clone()));

        store.append(NewMessage::text("u1", "u2", "hello")).await.unwrap();
        store.append(NewMessage::text("u1", "u2", "are you there")).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = presence.connect(tx).await;
        presence.join(conn, "u1", None).await;

        assert_eq!(tracker.acknowledge_read("u2", "u1").await.unwrap(), 2);
        assert_eq!(
            rx.recv().await,
            Some(ServerEvent::MessagesMarkedRead(MarkedReadPayload { by: "u2".into() }))
        );

        let conversations = store.conversations_for("u2").await.unwrap();
        assert!(!conversations[0].unread);
        assert_eq!(tracker.acknowledge_read("u2", "u1").await.unwrap(), 0);
    }
}
