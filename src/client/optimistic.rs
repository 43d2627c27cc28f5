//! # Optimistic Sends
//!
//! Tracks messages shown to the user before the server has confirmed them.
//!
//! Every send gets a temporary id (`temp_<session>_<n>`). The same string
//! goes out as the `clientId` of the intent, so the server echo can be
//! matched back exactly. Echoes without a `clientId` fall back to a
//! sender/recipient/content match within a time window.
//!
//! ## Lifecycle
//!
//! ```text
//! Optimistic ──echo──► Confirmed
//!     │  ▲
//!  error retry
//!     ▼  │
//!   Orphaned
//! ```

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::event::ClientEvent;
use crate::shared::messaging::{DirectMessage, TEMP_ID_PREFIX};

/// Where a locally shown message stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryState {
    /// Shown locally, waiting for the server echo
    Optimistic,
    /// Replaced by (or received as) the canonical message
    Confirmed,
    /// The send failed; the user may retry
    Orphaned,
}

/// One send that has not been confirmed yet
#[derive(Debug, Clone)]
pub struct PendingSend {
    /// The optimistic message as shown to the user
    pub message: DirectMessage,
    /// Event to emit again on retry
    pub intent: ClientEvent,
    pub state: DeliveryState,
    /// Last error reported for this send
    pub error: Option<String>,
    seq: u64,
}

impl PendingSend {
    pub fn temp_id(&self) -> &str {
        &self.message.id
    }
}

/// Pending sends of one session, keyed by temporary id
#[derive(Debug)]
pub struct OptimisticLedger {
    session: String,
    next_seq: u64,
    pending: HashMap<String, PendingSend>,
}

impl OptimisticLedger {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            next_seq: 0,
            pending: HashMap::new(),
        }
    }

    /// Next temporary id; unique within this ledger
    pub fn next_temp_id(&mut self) -> String {
        self.next_seq += 1;
        format!("{}{}_{}", TEMP_ID_PREFIX, self.session, self.next_seq)
    }

    /// Start tracking a send whose message carries a temporary id
    pub fn record(&mut self, message: DirectMessage, intent: ClientEvent) {
        self.next_seq += 1;
        let entry = PendingSend {
            message,
            intent,
            state: DeliveryState::Optimistic,
            error: None,
            seq: self.next_seq,
        };
        self.pending.insert(entry.message.id.clone(), entry);
    }

    pub fn get(&self, temp_id: &str) -> Option<&PendingSend> {
        self.pending.get(temp_id)
    }

    pub fn contains(&self, temp_id: &str) -> bool {
        self.pending.contains_key(temp_id)
    }

    /// Find the pending send an echo answers.
    ///
    /// An echo carrying a `clientId` only ever matches that id. Otherwise the
    /// oldest send with the same parties and content, created within
    /// `window` of the echo, is chosen.
    pub fn match_echo(&self, echo: &DirectMessage, window: Duration) -> Option<String> {
        if let Some(client_id) = echo.client_id.as_deref() {
            return self.pending.contains_key(client_id).then(|| client_id.to_string());
        }

        self.pending
            .values()
            .filter(|p| {
                p.message.sender == echo.sender
                    && p.message.recipient == echo.recipient
                    && p.message.content == echo.content
                    && p.message.kind == echo.kind
                    && (echo.created_at - p.message.created_at).abs() <= window
            })
            .min_by_key(|p| p.seq)
            .map(|p| p.message.id.clone())
    }

    /// Stop tracking a send the server confirmed
    pub fn confirm(&mut self, temp_id: &str) -> Option<PendingSend> {
        self.pending.remove(temp_id)
    }

    /// Mark a send failed; returns false for unknown ids
    pub fn orphan(&mut self, temp_id: &str, error: impl Into<String>) -> bool {
        match self.pending.get_mut(temp_id) {
            Some(entry) => {
                entry.state = DeliveryState::Orphaned;
                entry.error = Some(error.into());
                true
            }
            None => false,
        }
    }

    /// Orphan every send still waiting for an echo; returns their ids
    pub fn orphan_all_pending(&mut self, error: &str) -> Vec<String> {
        let mut orphaned: Vec<&mut PendingSend> = self
            .pending
            .values_mut()
            .filter(|p| p.state == DeliveryState::Optimistic)
            .collect();
        orphaned.sort_by_key(|p| p.seq);
        orphaned
            .into_iter()
            .map(|p| {
                p.state = DeliveryState::Orphaned;
                p.error = Some(error.to_string());
                p.message.id.clone()
            })
            .collect()
    }

    /// Oldest send still waiting for an echo
    pub fn oldest_pending(&self) -> Option<String> {
        self.pending
            .values()
            .filter(|p| p.state == DeliveryState::Optimistic)
            .min_by_key(|p| p.seq)
            .map(|p| p.message.id.clone())
    }

    /// Move an orphaned send back to optimistic; returns the event to emit
    pub fn retry(&mut self, temp_id: &str) -> Option<ClientEvent> {
        let entry = self.pending.get_mut(temp_id)?;
        if entry.state != DeliveryState::Orphaned {
            return None;
        }
        entry.state = DeliveryState::Optimistic;
        entry.error = None;
        entry.message.created_at = Utc::now();
        Some(entry.intent.clone())
    }

    /// Sends to or from `counterpart`, oldest first
    pub fn for_counterpart(&self, me: &str, counterpart: &str) -> Vec<&PendingSend> {
        let mut entries: Vec<&PendingSend> = self
            .pending
            .values()
            .filter(|p| p.message.counterpart_of(me) == counterpart)
            .collect();
        entries.sort_by_key(|p| p.seq);
        entries
    }

    /// Every tracked send, oldest first
    pub fn entries(&self) -> Vec<&PendingSend> {
        let mut entries: Vec<&PendingSend> = self.pending.values().collect();
        entries.sort_by_key(|p| p.seq);
        entries
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
