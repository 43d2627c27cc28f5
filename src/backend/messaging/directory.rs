//! User directory and post snapshot adapters
//!
//! Profiles and feed posts are owned by other parts of the platform. The
//! messaging core only needs to resolve an id to a summary, so both are
//! reached through small traits with an in-memory implementation here and a
//! PostgreSQL implementation in [`super::db`].

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::error::types::BackendResult;
use crate::shared::messaging::{Conversation, DirectMessage, MessageKind, PostSnapshot, UserSummary};

/// Resolves user ids to public profiles
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user; `Ok(None)` means the user does not exist
    async fn resolve_user(&self, id: &str) -> BackendResult<Option<UserSummary>>;

    /// Called when a connection joins as `user`.
    ///
    /// Authoritative directories ignore this; the in-memory directory can use
    /// it to learn users in single-process setups.
    async fn observe_join(&self, _user: &UserSummary) -> BackendResult<()> {
        Ok(())
    }
}

/// Resolves post ids to renderable snapshots
#[async_trait]
pub trait PostSnapshots: Send + Sync {
    /// Look up a post; `Ok(None)` means the post does not exist
    async fn resolve_post(&self, id: &str) -> BackendResult<Option<PostSnapshot>>;
}

/// In-memory user directory
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<String, UserSummary>>,
    register_on_join: bool,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory that adds every joining user it has not seen before
    pub fn registering() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            register_on_join: true,
        }
    }

    pub fn with_users(users: impl IntoIterator<Item = UserSummary>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
            register_on_join: false,
        }
    }

    pub async fn insert(&self, user: UserSummary) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn resolve_user(&self, id: &str) -> BackendResult<Option<UserSummary>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn observe_join(&self, user: &UserSummary) -> BackendResult<()> {
        if !self.register_on_join {
            return Ok(());
        }
        let mut users = self.users.write().await;
        if !users.contains_key(&user.id) {
            tracing::debug!("[Directory] Registered {} on join", user.id);
            users.insert(user.id.clone(), user.clone());
        }
        Ok(())
    }
}

/// In-memory post snapshot service
#[derive(Debug, Default)]
pub struct MemoryPostSnapshots {
    posts: RwLock<HashMap<String, PostSnapshot>>,
}

impl MemoryPostSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(posts: impl IntoIterator<Item = PostSnapshot>) -> Self {
        Self {
            posts: RwLock::new(posts.into_iter().map(|p| (p.id.clone(), p)).collect()),
        }
    }

    pub async fn insert(&self, post: PostSnapshot) {
        self.posts.write().await.insert(post.id.clone(), post);
    }
}

#[async_trait]
impl PostSnapshots for MemoryPostSnapshots {
    async fn resolve_post(&self, id: &str) -> BackendResult<Option<PostSnapshot>> {
        Ok(self.posts.read().await.get(id).cloned())
    }
}

/// Fill in counterpart names the store could not provide.
///
/// Unknown counterparts keep their bare summary.
pub async fn enrich_conversations(
    directory: &dyn UserDirectory,
    conversations: &mut [Conversation],
) -> BackendResult<()> {
    for conversation in conversations.iter_mut() {
        if !conversation.user.name.is_empty() {
            continue;
        }
        if let Some(user) = directory.resolve_user(&conversation.user.id).await? {
            conversation.user = user;
        }
    }
    Ok(())
}

/// Attach post snapshots to shared-post messages that lack one.
///
/// Posts deleted since the share stay as a bare reference.
pub async fn attach_posts(posts: &dyn PostSnapshots, messages: &mut [DirectMessage]) -> BackendResult<()> {
    let mut resolved: HashMap<String, Option<PostSnapshot>> = HashMap::new();
    for message in messages.iter_mut() {
        if message.kind != MessageKind::SharedPost || message.post.is_some() {
            continue;
        }
        let Some(post_id) = message.post_id.clone() else {
            continue;
        };
        if !resolved.contains_key(&post_id) {
            let snapshot = posts.resolve_post(&post_id).await?;
            resolved.insert(post_id.clone(), snapshot);
        }
        message.post = resolved.get(&post_id).cloned().flatten();
    }
    Ok(())
}
