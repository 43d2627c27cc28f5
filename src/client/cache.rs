//! # Conversation Cache
//!
//! Per-user, in-memory view of conversations and of the open conversation's
//! messages. It applies sends optimistically, reconciles server echoes,
//! drops duplicates and keeps the conversation list ordered by activity.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use campus_dm::client::{ChannelTransport, ConversationCache};
//! use campus_dm::shared::{AppConfig, UserSummary};
//!
//! let (transport, _outbound) = ChannelTransport::pair();
//! let mut cache = ConversationCache::new(
//!     UserSummary::new("u1", "Ada"),
//!     Some("student".into()),
//!     &AppConfig::default(),
//!     Arc::new(transport),
//! );
//! cache.connect().unwrap();
//! let temp_id = cache.send_text("u2", "hello").unwrap();
//! ```
//!
//! Server events are fed in with [`ConversationCache::handle_event`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::client::optimistic::{DeliveryState, OptimisticLedger, PendingSend};
use crate::client::transport::ClientTransport;
use crate::shared::config::{AppConfig, DEFAULT_RECONCILE_WINDOW_SECS};
use crate::shared::event::{
    ClientEvent, JoinPayload, MarkReadPayload, MessageErrorPayload, PrivateMessagePayload, SharePostPayload,
};
use crate::shared::messaging::{Conversation, DirectMessage, MessageKind, NewMessage, UserSummary};
use crate::shared::ServerEvent;

/// A message in the open conversation, with its delivery state
#[derive(Debug, Clone, PartialEq)]
pub struct CachedMessage {
    pub message: DirectMessage,
    pub state: DeliveryState,
    /// Error text of a failed send, for inline display
    pub error: Option<String>,
}

impl CachedMessage {
    fn confirmed(message: DirectMessage) -> Self {
        Self {
            message,
            state: DeliveryState::Confirmed,
            error: None,
        }
    }

    fn from_pending(pending: &PendingSend) -> Self {
        Self {
            message: pending.message.clone(),
            state: pending.state,
            error: pending.error.clone(),
        }
    }
}

/// Where to resume a conversation after a reconnect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchUpCursor {
    pub counterpart: String,
    /// Creation time of the newest canonical message seen for the pair
    pub since: DateTime<Utc>,
}

/// Heuristic matching window; out-of-range values fall back to the default
fn reconcile_window(secs: i64) -> Duration {
    Duration::try_seconds(secs)
        .filter(|window| *window > Duration::zero())
        .unwrap_or_else(|| Duration::seconds(DEFAULT_RECONCILE_WINDOW_SECS))
}

pub struct ConversationCache {
    me: UserSummary,
    role: Option<String>,
    window: Duration,
    transport: Arc<dyn ClientTransport>,
    ledger: OptimisticLedger,
    conversations: Vec<Conversation>,
    active: Option<String>,
    messages: Vec<CachedMessage>,
    last_seen: HashMap<String, DateTime<Utc>>,
    connected: bool,
}

impl ConversationCache {
    pub fn new(
        me: UserSummary,
        role: Option<String>,
        config: &AppConfig,
        transport: Arc<dyn ClientTransport>,
    ) -> Self {
        let session: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        Self {
            me,
            role,
            window: reconcile_window(config.reconcile_window_secs),
            transport,
            ledger: OptimisticLedger::new(session),
            conversations: Vec::new(),
            active: None,
            messages: Vec::new(),
            last_seen: HashMap::new(),
            connected: false,
        }
    }

    // ---- accessors ----

    pub fn me(&self) -> &UserSummary {
        &self.me
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Conversations, most recent activity first
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, counterpart: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.counterpart() == counterpart)
    }

    /// Messages of the open conversation, in arrival order
    pub fn messages(&self) -> &[CachedMessage] {
        &self.messages
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Number of conversations flagged unread
    pub fn unread_count(&self) -> usize {
        self.conversations.iter().filter(|c| c.unread).count()
    }

    /// State of a send that has not been confirmed yet
    pub fn delivery_state(&self, temp_id: &str) -> Option<DeliveryState> {
        self.ledger.get(temp_id).map(|p| p.state)
    }

    /// Every unconfirmed send, oldest first, across all conversations
    pub fn pending(&self) -> Vec<&PendingSend> {
        self.ledger.entries()
    }

    // ---- connection lifecycle ----

    /// Announce this session on a fresh connection
    pub fn connect(&mut self) -> Result<(), ClientError> {
        self.transport.emit(ClientEvent::Join(JoinPayload {
            id: self.me.id.clone(),
            name: self.me.name.clone(),
            role: self.role.clone(),
        }))?;
        self.connected = true;
        tracing::debug!("[Cache] {} joined", self.me.id);
        Ok(())
    }

    /// The connection dropped; every send still in flight is orphaned.
    ///
    /// Returns the temporary ids that were orphaned.
    pub fn disconnect(&mut self) -> Vec<String> {
        self.connected = false;
        let orphaned = self.ledger.orphan_all_pending("Connection lost");
        for temp_id in &orphaned {
            self.sync_entry(temp_id);
        }
        if !orphaned.is_empty() {
            tracing::warn!("[Cache] Disconnected with {} send(s) in flight", orphaned.len());
        }
        orphaned
    }

    /// Re-join after a disconnect and report where each conversation left off
    pub fn reconnect(&mut self) -> Result<Vec<CatchUpCursor>, ClientError> {
        self.connect()?;
        Ok(self.catch_up_cursors())
    }

    /// Newest canonical timestamp per counterpart, most recent first
    pub fn catch_up_cursors(&self) -> Vec<CatchUpCursor> {
        let mut cursors: Vec<CatchUpCursor> = self
            .last_seen
            .iter()
            .map(|(counterpart, since)| CatchUpCursor {
                counterpart: counterpart.clone(),
                since: *since,
            })
            .collect();
        cursors.sort_by(|a, b| b.since.cmp(&a.since).then_with(|| a.counterpart.cmp(&b.counterpart)));
        cursors
    }

    // ---- sending ----

    /// Send a text message; returns its temporary id.
    ///
    /// The message shows up immediately. If it cannot be handed to the
    /// connection it is orphaned right away and can be retried.
    pub fn send_text(&mut self, recipient: &str, content: &str) -> Result<String, ClientError> {
        self.submit(NewMessage::text(self.me.id.clone(), recipient, content))
    }

    /// Share a feed post with an optional note; returns the temporary id
    pub fn share_post(&mut self, recipient: &str, post_id: &str, note: Option<String>) -> Result<String, ClientError> {
        self.submit(NewMessage::shared_post(self.me.id.clone(), recipient, post_id, note))
    }

    fn submit(&mut self, intent: NewMessage) -> Result<String, ClientError> {
        intent.validate()?;

        let temp_id = self.ledger.next_temp_id();
        let intent = intent.with_client_id(Some(temp_id.clone()));
        let event = match intent.kind {
            MessageKind::Text => ClientEvent::PrivateMessage(PrivateMessagePayload {
                sender_id: intent.sender.clone(),
                recipient_id: intent.recipient.clone(),
                content: intent.content.clone(),
                kind: intent.kind,
                post_id: intent.post_id.clone(),
                client_id: intent.client_id.clone(),
            }),
            MessageKind::SharedPost => ClientEvent::SharePost(SharePostPayload {
                sender_id: intent.sender.clone(),
                recipient_id: intent.recipient.clone(),
                post_id: intent.post_id.clone().unwrap_or_default(),
                message: (!intent.content.is_empty()).then(|| intent.content.clone()),
                client_id: intent.client_id.clone(),
            }),
        };

        let message = intent.into_message(temp_id.clone(), Utc::now());
        let recipient = message.recipient.clone();

        if self.active.as_deref() == Some(recipient.as_str()) {
            self.messages.push(CachedMessage {
                message: message.clone(),
                state: DeliveryState::Optimistic,
                error: None,
            });
        }
        self.upsert_conversation(&recipient, message.clone(), false, None);
        self.ledger.record(message, event.clone());

        if !self.connected {
            self.mark_orphaned(&temp_id, "Not connected");
            return Ok(temp_id);
        }
        if let Err(e) = self.transport.emit(event) {
            tracing::warn!("[Cache] Send {} failed: {}", temp_id, e);
            self.mark_orphaned(&temp_id, e.to_string());
        }
        Ok(temp_id)
    }

    /// Emit an orphaned send again under the same correlation id
    pub fn retry(&mut self, temp_id: &str) -> Result<(), ClientError> {
        match self.ledger.get(temp_id) {
            None => return Err(ClientError::UnknownMessage(temp_id.to_string())),
            Some(entry) if entry.state != DeliveryState::Orphaned => {
                return Err(ClientError::NotOrphaned(temp_id.to_string()))
            }
            Some(_) => {}
        }
        let event = self
            .ledger
            .retry(temp_id)
            .ok_or_else(|| ClientError::NotOrphaned(temp_id.to_string()))?;
        self.sync_entry(temp_id);

        if !self.connected {
            self.mark_orphaned(temp_id, "Not connected");
            return Err(ClientError::Transport("Not connected".to_string()));
        }
        match self.transport.emit(event) {
            Ok(()) => {
                tracing::debug!("[Cache] Retrying {}", temp_id);
                Ok(())
            }
            Err(e) => {
                self.mark_orphaned(temp_id, e.to_string());
                Err(e)
            }
        }
    }

    // ---- server events ----

    /// Apply one server event
    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::NewMessage(message) => {
                self.receive(message, true);
            }
            ServerEvent::MessagesMarkedRead(payload) => self.on_marked_read(&payload.by),
            ServerEvent::MessageError(payload) => {
                self.on_message_error(payload);
            }
        }
    }

    /// Ingest one canonical message; returns false if it was already known
    fn receive(&mut self, message: DirectMessage, acknowledge: bool) -> bool {
        let me = self.me.id.clone();
        if message.sender != me && message.recipient != me {
            tracing::debug!("[Cache] Ignoring message {} not addressed to {}", message.id, me);
            return false;
        }
        let counterpart = message.counterpart_of(&me).to_string();
        let is_open = self.active.as_deref() == Some(counterpart.as_str());

        let reconciled = if message.sender == me {
            self.ledger.match_echo(&message, self.window)
        } else {
            None
        };
        if let Some(temp_id) = &reconciled {
            self.ledger.confirm(temp_id);
            tracing::debug!("[Cache] Reconciled {} as {}", temp_id, message.id);
        }

        let known = self
            .conversation(&counterpart)
            .is_some_and(|c| c.last_message.id == message.id)
            || (is_open && self.messages.iter().any(|c| c.message.id == message.id));

        if is_open {
            let optimistic = reconciled
                .as_deref()
                .and_then(|temp_id| self.messages.iter().position(|c| c.message.id == temp_id));
            match (optimistic, known) {
                (Some(pos), true) => {
                    self.messages.remove(pos);
                }
                // The canonical copy takes its arrival position, not the send position
                (Some(pos), false) => {
                    self.messages.remove(pos);
                    self.messages.push(CachedMessage::confirmed(message.clone()));
                }
                (None, false) => self.messages.push(CachedMessage::confirmed(message.clone())),
                (None, true) => {}
            }
        }

        self.note_seen(&counterpart, message.created_at);

        if !known {
            let unread = message.recipient == me && message.sender != me && !message.read && !is_open;
            self.upsert_conversation(&counterpart, message.clone(), unread, reconciled.as_deref());
        }

        if acknowledge && !known && is_open && message.recipient == me && message.sender != me && !message.read {
            self.acknowledge(&counterpart);
        }

        !known
    }

    fn on_marked_read(&mut self, by: &str) {
        let me = self.me.id.clone();
        if self.active.as_deref() == Some(by) {
            for cached in self.messages.iter_mut() {
                if cached.message.sender == me && cached.message.recipient == by {
                    cached.message.read = true;
                }
            }
        }
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.counterpart() == by) {
            if conversation.last_message.sender == me {
                conversation.last_message.read = true;
            }
        }
    }

    /// Orphan the send a `message-error` refers to; returns its temporary id
    fn on_message_error(&mut self, payload: MessageErrorPayload) -> Option<String> {
        let target = match payload.client_id.as_deref() {
            Some(client_id) => self.ledger.contains(client_id).then(|| client_id.to_string()),
            None => self.ledger.oldest_pending(),
        };
        match target {
            Some(temp_id) => {
                tracing::warn!("[Cache] Send {} rejected: {}", temp_id, payload.error);
                self.mark_orphaned(&temp_id, payload.error);
                Some(temp_id)
            }
            None => {
                tracing::warn!("[Cache] Unmatched message-error: {}", payload.error);
                None
            }
        }
    }

    // ---- hydration and gap-fill ----

    /// Replace the conversation list with the server's view.
    ///
    /// Unconfirmed sends stay visible on top of it.
    pub fn hydrate_conversations(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
        let seen: Vec<(String, DateTime<Utc>)> = self
            .conversations
            .iter()
            .map(|c| (c.counterpart().to_string(), c.last_message.created_at))
            .collect();
        for (counterpart, at) in seen {
            self.note_seen(&counterpart, at);
        }

        let me = self.me.id.clone();
        let pending: Vec<DirectMessage> = self.ledger.entries().into_iter().map(|p| p.message.clone()).collect();
        for message in pending {
            let counterpart = message.counterpart_of(&me).to_string();
            self.upsert_conversation(&counterpart, message, false, None);
        }

        if let Some(active) = self.active.clone() {
            self.clear_unread(&active);
        }
    }

    /// Open a conversation with freshly fetched history (oldest first).
    ///
    /// Fetching history marks it read on the server, so the entry is cleared
    /// locally as well.
    pub fn open_conversation(&mut self, counterpart: &str, history: Vec<DirectMessage>) {
        let me = self.me.id.clone();
        self.active = Some(counterpart.to_string());
        self.messages.clear();

        for message in history.into_iter().filter(|m| m.is_between(&me, counterpart)) {
            if self.messages.iter().any(|c| c.message.id == message.id) {
                continue;
            }
            if message.sender == me {
                if let Some(temp_id) = self.ledger.match_echo(&message, self.window) {
                    self.ledger.confirm(&temp_id);
                }
            }
            self.note_seen(counterpart, message.created_at);
            self.messages.push(CachedMessage::confirmed(message));
        }

        let pending: Vec<CachedMessage> = self
            .ledger
            .for_counterpart(&me, counterpart)
            .into_iter()
            .map(CachedMessage::from_pending)
            .collect();
        self.messages.extend(pending);

        if let Some(last) = self.messages.iter().rev().find(|c| c.state == DeliveryState::Confirmed) {
            let last = last.message.clone();
            self.upsert_conversation(counterpart, last, false, None);
        }
        self.clear_unread(counterpart);
    }

    pub fn close_conversation(&mut self) {
        self.active = None;
        self.messages.clear();
    }

    /// Merge a history delta fetched after a reconnect.
    ///
    /// Already-known messages are skipped and echoes of our own sends are
    /// reconciled. Returns how many messages were new.
    pub fn merge_history(&mut self, counterpart: &str, messages: Vec<DirectMessage>) -> usize {
        let me = self.me.id.clone();
        let mut added = 0;
        let mut unread_for_me = false;

        for message in messages.into_iter().filter(|m| m.is_between(&me, counterpart)) {
            let incoming_unread = message.recipient == me && message.sender != me && !message.read;
            if self.receive(message, false) {
                added += 1;
                unread_for_me |= incoming_unread;
            }
        }

        if self.active.as_deref() == Some(counterpart) {
            self.messages
                .sort_by_key(|c| (c.state != DeliveryState::Confirmed, c.message.created_at));
            if unread_for_me {
                self.acknowledge(counterpart);
            }
        }

        tracing::debug!("[Cache] Merged {} new message(s) with {}", added, counterpart);
        added
    }

    // ---- internals ----

    fn acknowledge(&self, counterpart: &str) {
        let event = ClientEvent::MarkMessagesRead(MarkReadPayload {
            user_id: self.me.id.clone(),
            sender_id: counterpart.to_string(),
        });
        if let Err(e) = self.transport.emit(event) {
            tracing::warn!("[Cache] Could not acknowledge {}: {}", counterpart, e);
        }
    }

    fn mark_orphaned(&mut self, temp_id: &str, error: impl Into<String>) {
        if self.ledger.orphan(temp_id, error) {
            self.sync_entry(temp_id);
        }
    }

    /// Copy a ledger entry's state onto its row in the open conversation
    fn sync_entry(&mut self, temp_id: &str) {
        let Some(pending) = self.ledger.get(temp_id) else {
            return;
        };
        if let Some(row) = self.messages.iter_mut().find(|c| c.message.id == temp_id) {
            row.state = pending.state;
            row.error = pending.error.clone();
        }
    }

    fn note_seen(&mut self, counterpart: &str, at: DateTime<Utc>) {
        let entry = self.last_seen.entry(counterpart.to_string()).or_insert(at);
        if at > *entry {
            *entry = at;
        }
    }

    fn clear_unread(&mut self, counterpart: &str) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.counterpart() == counterpart) {
            conversation.unread = false;
        }
    }

    /// Make `message` the last message of the conversation with `counterpart`
    /// if it is at least as recent, and move that conversation to the front.
    fn upsert_conversation(&mut self, counterpart: &str, message: DirectMessage, unread: bool, replaces: Option<&str>) {
        match self.conversations.iter().position(|c| c.counterpart() == counterpart) {
            Some(pos) => {
                let current = &self.conversations[pos].last_message;
                let newer = replaces == Some(current.id.as_str()) || message.created_at >= current.created_at;
                if !newer {
                    return;
                }
                let mut conversation = self.conversations.remove(pos);
                conversation.last_message = message;
                conversation.unread = unread;
                self.conversations.insert(0, conversation);
            }
            None => {
                self.conversations.insert(
                    0,
                    Conversation {
                        user: UserSummary::bare(counterpart),
                        last_message: message,
                        unread,
                    },
                );
            }
        }
    }
}
