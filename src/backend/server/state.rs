/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct is the one place where the messaging components are
 * wired together:
 * - Message store (in-memory or PostgreSQL)
 * - User directory and post snapshot adapters
 * - Presence router (process-local, created here, cleared on shutdown)
 * - Delivery broker and read-state tracker built on top of them
 *
 * # Thread Safety
 *
 * Every field is a cheap clone: trait objects behind `Arc`, and the presence
 * router is itself an `Arc<RwLock<..>>` handle.
 *
 * # Example
 *
 * ```rust
 * use campus_dm::backend::server::state::AppState;
 * use axum::extract::State;
 *
 * async fn handler(State(state): State<AppState>) {
 *     let live = state.presence.connection_count().await;
 *     // ...
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::messaging::broker::DeliveryBroker;
use crate::backend::messaging::directory::{MemoryPostSnapshots, MemoryUserDirectory, PostSnapshots, UserDirectory};
use crate::backend::messaging::read_state::ReadStateTracker;
use crate::backend::messaging::store::{MemoryMessageStore, MessageStore};
use crate::backend::realtime::presence::PresenceRouter;

/// Application state shared by every handler and socket task
#[derive(Clone)]
pub struct AppState {
    /// Source of truth for messages
    pub store: Arc<dyn MessageStore>,

    /// Resolves user ids to profiles
    pub directory: Arc<dyn UserDirectory>,

    /// Resolves post ids to snapshots
    pub posts: Arc<dyn PostSnapshots>,

    /// Live connections and rooms
    pub presence: PresenceRouter,

    /// Persist-then-fan-out pipeline
    pub broker: DeliveryBroker,

    /// Read acknowledgements
    pub read_tracker: ReadStateTracker,
}

impl AppState {
    /// Wire the components around a presence router
    pub fn new(
        store: Arc<dyn MessageStore>,
        directory: Arc<dyn UserDirectory>,
        posts: Arc<dyn PostSnapshots>,
        presence: PresenceRouter,
    ) -> Self {
        let broker = DeliveryBroker::new(
            store.clone(),
            directory.clone(),
            posts.clone(),
            Arc::new(presence.clone()),
        );
        let read_tracker = ReadStateTracker::new(store.clone(), Arc::new(presence.clone()));

        Self {
            store,
            directory,
            posts,
            presence,
            broker,
            read_tracker,
        }
    }

    /// Single-process state with no database.
    ///
    /// Users become known to the directory when they join.
    pub fn in_memory() -> Self {
        let directory: Arc<dyn UserDirectory> = Arc::new(MemoryUserDirectory::registering());
        Self::in_memory_with(directory, Arc::new(MemoryPostSnapshots::new()))
    }

    /// In-memory store around the given directory and post adapters
    pub fn in_memory_with(directory: Arc<dyn UserDirectory>, posts: Arc<dyn PostSnapshots>) -> Self {
        let store = Arc::new(MemoryMessageStore::new(directory.clone()));
        Self::new(store, directory, posts, PresenceRouter::new())
    }
}

/// Implement FromRef for DeliveryBroker
///
/// This allows write handlers to extract the broker directly with
/// `State(broker): State<DeliveryBroker>`.
impl FromRef<AppState> for DeliveryBroker {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.broker.clone()
    }
}
