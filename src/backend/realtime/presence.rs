/**
 * Presence Router
 *
 * Maps user identities to live connections. Every connection registers its
 * outbound channel with `connect`, then binds itself to a user with `join`,
 * which places it in three rooms:
 *
 * - the user's personal room (targeted delivery)
 * - the all-users room
 * - the room of the user's role, if any
 *
 * A personal room holds at most one connection. When the same user joins
 * again from another connection, the newer connection takes the personal
 * room over and the older one keeps only its group memberships.
 *
 * Delivery is best effort: sending to a user without a live connection is a
 * silent no-op. Nothing is queued or retried.
 *
 * # Thread Safety
 *
 * State lives behind a single `tokio::sync::RwLock`; the router itself is a
 * cheap `Arc` handle and can be cloned into every connection task.
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::shared::ServerEvent;

/// Identifier of one live connection
pub type ConnectionId = Uuid;

/// Outbound half of a connection; the socket writer task drains the receiver
pub type Outbound = mpsc::UnboundedSender<ServerEvent>;

/// Delivery groups a connection can belong to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// Exactly one user's live connection
    Personal(String),
    /// Every joined connection
    AllUsers,
    /// Every joined connection of a role (e.g. "student", "faculty")
    Role(String),
}

/// Targeted delivery seam used by the broker and the read-state tracker
#[async_trait]
pub trait Presence: Send + Sync {
    /// Deliver `event` to the user's personal room; returns whether a live
    /// connection accepted it
    async fn send(&self, user_id: &str, event: ServerEvent) -> bool;

    /// Whether the user currently has a live connection
    async fn is_online(&self, user_id: &str) -> bool;
}

#[derive(Debug)]
struct ConnectionEntry {
    outbound: Outbound,
    user_id: Option<String>,
    rooms: HashSet<Room>,
}

#[derive(Debug, Default)]
struct PresenceState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<Room, HashSet<ConnectionId>>,
}

impl PresenceState {
    fn add_to_room(&mut self, connection: ConnectionId, room: Room) {
        self.rooms.entry(room.clone()).or_default().insert(connection);
        if let Some(entry) = self.connections.get_mut(&connection) {
            entry.rooms.insert(room);
        }
    }

    fn remove_from_room(&mut self, connection: ConnectionId, room: &Room) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(&connection);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
        if let Some(entry) = self.connections.get_mut(&connection) {
            entry.rooms.remove(room);
        }
    }

    fn drop_memberships(&mut self, connection: ConnectionId) {
        let rooms: Vec<Room> = self
            .connections
            .get(&connection)
            .map(|entry| entry.rooms.iter().cloned().collect())
            .unwrap_or_default();
        for room in rooms {
            self.remove_from_room(connection, &room);
        }
    }

    fn personal_connection(&self, user_id: &str) -> Option<ConnectionId> {
        self.rooms
            .get(&Room::Personal(user_id.to_string()))
            .and_then(|members| members.iter().next().copied())
    }
}

/// Process-local presence registry
#[derive(Debug, Clone, Default)]
pub struct PresenceRouter {
    state: Arc<RwLock<PresenceState>>,
}

impl PresenceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and its outbound channel
    pub async fn connect(&self, outbound: Outbound) -> ConnectionId {
        let id = Uuid::new_v4();
        let mut state = self.state.write().await;
        state.connections.insert(
            id,
            ConnectionEntry {
                outbound,
                user_id: None,
                rooms: HashSet::new(),
            },
        );
        tracing::debug!("[Presence] Connection {} opened ({} live)", id, state.connections.len());
        id
    }

    /// Bind a connection to a user and its rooms.
    ///
    /// Joining again with the same user is a no-op; joining with a different
    /// user moves the connection over.
    pub async fn join(&self, connection: ConnectionId, user_id: &str, role: Option<&str>) -> bool {
        let mut state = self.state.write().await;
        let Some(entry) = state.connections.get(&connection) else {
            tracing::warn!("[Presence] Join for unknown connection {}", connection);
            return false;
        };

        let already_joined = entry.user_id.as_deref() == Some(user_id);
        let expected_role = role.map(|r| Room::Role(r.to_string()));
        if already_joined
            && expected_role.as_ref().is_none_or(|room| entry.rooms.contains(room))
            && state.personal_connection(user_id) == Some(connection)
        {
            return true;
        }

        state.drop_memberships(connection);

        let personal = Room::Personal(user_id.to_string());
        if let Some(previous) = state.personal_connection(user_id) {
            if previous != connection {
                tracing::info!(
                    "[Presence] {} joined again; connection {} takes over from {}",
                    user_id,
                    connection,
                    previous
                );
                state.remove_from_room(previous, &personal);
            }
        }

        state.add_to_room(connection, personal);
        state.add_to_room(connection, Room::AllUsers);
        if let Some(room) = expected_role {
            state.add_to_room(connection, room);
        }
        if let Some(entry) = state.connections.get_mut(&connection) {
            entry.user_id = Some(user_id.to_string());
        }

        tracing::info!("[Presence] {} joined on {}", user_id, connection);
        true
    }

    /// Remove a connection and every membership it holds
    pub async fn leave(&self, connection: ConnectionId) {
        let mut state = self.state.write().await;
        state.drop_memberships(connection);
        if let Some(entry) = state.connections.remove(&connection) {
            tracing::info!(
                "[Presence] Connection {} closed (user {:?}, {} live)",
                connection,
                entry.user_id,
                state.connections.len()
            );
        }
    }

    /// Fan an event out to every connection in a room; returns how many accepted it
    pub async fn broadcast(&self, room: &Room, event: ServerEvent) -> usize {
        let state = self.state.read().await;
        let Some(members) = state.rooms.get(room) else {
            return 0;
        };
        members
            .iter()
            .filter_map(|id| state.connections.get(id))
            .filter(|entry| entry.outbound.send(event.clone()).is_ok())
            .count()
    }

    /// Drop every connection; returns how many were live
    pub async fn clear(&self) -> usize {
        let mut state = self.state.write().await;
        let count = state.connections.len();
        state.connections.clear();
        state.rooms.clear();
        tracing::info!("[Presence] Cleared {} connection(s)", count);
        count
    }

    /// Number of registered connections, joined or not
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    /// User bound to a connection, if it has joined
    pub async fn user_of(&self, connection: ConnectionId) -> Option<String> {
        self.state
            .read()
            .await
            .connections
            .get(&connection)
            .and_then(|entry| entry.user_id.clone())
    }
}

#[async_trait]
impl Presence for PresenceRouter {
    async fn send(&self, user_id: &str, event: ServerEvent) -> bool {
        let state = self.state.read().await;
        let Some(entry) = state
            .personal_connection(user_id)
            .and_then(|id| state.connections.get(&id))
        else {
            tracing::debug!("[Presence] {} offline, dropping {}", user_id, event.name());
            return false;
        };
        entry.outbound.send(event).is_ok()
    }

    async fn is_online(&self, user_id: &str) -> bool {
        self.state.read().await.personal_connection(user_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::event::MarkedReadPayload;

    fn event(by: &str) -> ServerEvent {
        ServerEvent::MessagesMarkedRead(MarkedReadPayload { by: by.to_string() })
    }

    #[tokio::test]
    async fn test_send_reaches_joined_user_only() {
        let router = PresenceRouter::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = router.connect(tx).await;

        // Connected but not joined: not reachable
        assert!(!router.send("u1", event("u2")).await);

        assert!(router.join(conn, "u1", Some("student")).await);
        assert!(router.is_online("u1").await);
        assert!(router.send("u1", event("u2")).await);
        assert_eq!(rx.recv().await, Some(event("u2")));

        assert!(!router.send("u2", event("u1")).await);
    }

    #[tokio::test]
    async fn test_leave_removes_all_memberships() {
        let router = PresenceRouter::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = router.connect(tx).await;
        router.join(conn, "u1", Some("faculty")).await;

        router.leave(conn).await;
        assert!(!router.is_online("u1").await);
        assert_eq!(router.connection_count().await, 0);
        assert_eq!(router.broadcast(&Room::AllUsers, event("x")).await, 0);
        assert_eq!(router.broadcast(&Room::Role("faculty".into()), event("x")).await, 0);
    }

    #[tokio::test]
    async fn test_latest_join_takes_over_personal_room() {
        let router = PresenceRouter::new();
        let (old_tx, mut old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();
        let old = router.connect(old_tx).await;
        let new = router.connect(new_tx).await;

        router.join(old, "u1", None).await;
        router.join(new, "u1", None).await;

        assert!(router.send("u1", event("u2")).await);
        assert_eq!(new_rx.recv().await, Some(event("u2")));
        assert!(old_rx.try_recv().is_err());

        // The old connection still receives room broadcasts
        assert_eq!(router.broadcast(&Room::AllUsers, event("all")).await, 2);
        assert_eq!(old_rx.recv().await, Some(event("all")));

        // Closing the old connection does not take the user offline
        router.leave(old).await;
        assert!(router.is_online("u1").await);
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let router = PresenceRouter::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = router.connect(tx).await;

        router.join(conn, "u1", Some("student")).await;
        router.join(conn, "u1", Some("student")).await;

        assert_eq!(router.broadcast(&Room::Role("student".into()), event("s")).await, 1);
        assert_eq!(rx.recv().await, Some(event("s")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejoin_as_other_user_moves_connection() {
        let router = PresenceRouter::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = router.connect(tx).await;

        router.join(conn, "u1", None).await;
        router.join(conn, "u2", None).await;

        assert!(!router.is_online("u1").await);
        assert!(router.is_online("u2").await);
        assert_eq!(router.user_of(conn).await.as_deref(), Some("u2"));
    }

    #[tokio::test]
    async fn test_closed_receiver_counts_as_offline_delivery() {
        let router = PresenceRouter::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = router.connect(tx).await;
        router.join(conn, "u1", None).await;
        drop(rx);

        assert!(!router.send("u1", event("u2")).await);
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let router = PresenceRouter::new();
        for user in ["u1", "u2", "u3"] {
            let (tx, _rx) = mpsc::unbounded_channel();
            let conn = router.connect(tx).await;
            router.join(conn, user, None).await;
        }

        assert_eq!(router.clear().await, 3);
        assert_eq!(router.connection_count().await, 0);
        assert!(!router.is_online("u1").await);
    }
}
