//! Common test utilities and helpers
//!
//! - Seeded in-memory application state
//! - Connection helpers that join users through the socket dispatcher
//! - A presence double that reports every user offline
//! - Client cache fixtures

#![allow(dead_code)]

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use campus_dm::client::{ChannelTransport, ConversationCache};
use campus_dm::shared::{AppConfig, ClientEvent, PostSnapshot, ServerEvent, UserSummary};

#[cfg(feature = "ssr")]
pub use backend::*;

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

pub fn ada() -> UserSummary {
    UserSummary::new("u1", "Ada").with_avatar("ada.png")
}

pub fn grace() -> UserSummary {
    UserSummary::new("u2", "Grace")
}

pub fn hackathon_post() -> PostSnapshot {
    PostSnapshot {
        id: "p1".into(),
        author: grace(),
        content: "Hackathon this weekend".into(),
        image: Some("hackathon.png".into()),
    }
}

/// A connected cache for `me` and the receiver of everything it emits.
///
/// The initial `join` is already drained.
pub fn connected_cache(me: UserSummary) -> (ConversationCache, UnboundedReceiver<ClientEvent>) {
    let (transport, mut outbound) = ChannelTransport::pair();
    let mut cache = ConversationCache::new(me, Some("student".into()), &AppConfig::default(), Arc::new(transport));
    assert_ok!(cache.connect());
    match outbound.try_recv() {
        Ok(ClientEvent::Join(_)) => {}
        other => panic!("Expected join, got {:?}", other),
    }
    (cache, outbound)
}

/// Drain everything currently queued on a receiver
pub fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}

pub fn server_channel() -> (mpsc::UnboundedSender<ServerEvent>, UnboundedReceiver<ServerEvent>) {
    mpsc::unbounded_channel()
}

#[cfg(feature = "ssr")]
mod backend {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use campus_dm::backend::messaging::{MemoryPostSnapshots, MemoryUserDirectory, UserDirectory};
    use campus_dm::backend::realtime::socket::dispatch;
    use campus_dm::backend::realtime::{ConnectionId, Presence};
    use campus_dm::backend::AppState;
    use campus_dm::shared::ServerEvent;

    use super::{ada, grace, hackathon_post};

    /// In-memory state with Ada (`u1`) and Grace (`u2`) registered and one post
    pub fn seeded_state() -> AppState {
        let directory: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::with_users([ada(), grace()]));
        AppState::in_memory_with(directory, Arc::new(MemoryPostSnapshots::with_posts([hackathon_post()])))
    }

    /// A live socket session, driven through the same dispatcher as `/ws`
    pub struct Session {
        pub connection: ConnectionId,
        pub outbound: mpsc::UnboundedSender<ServerEvent>,
        pub inbox: UnboundedReceiver<ServerEvent>,
    }

    impl Session {
        pub async fn join(state: &AppState, user: &str) -> Self {
            let (outbound, inbox) = mpsc::unbounded_channel();
            let connection = state.presence.connect(outbound.clone()).await;
            let frame = format!(r#"{{"event":"join","data":{{"id":"{user}","name":"{user}"}}}}"#);
            dispatch(state, connection, &outbound, &frame).await;
            Self {
                connection,
                outbound,
                inbox,
            }
        }

        pub async fn send_frame(&self, state: &AppState, frame: &str) {
            dispatch(state, self.connection, &self.outbound, frame).await;
        }

        pub async fn leave(self, state: &AppState) {
            state.presence.leave(self.connection).await;
        }
    }

    /// Presence that never has anyone connected
    pub struct OfflinePresence;

    #[async_trait]
    impl Presence for OfflinePresence {
        async fn send(&self, _user_id: &str, _event: ServerEvent) -> bool {
            false
        }

        async fn is_online(&self, _user_id: &str) -> bool {
            false
        }
    }
}
