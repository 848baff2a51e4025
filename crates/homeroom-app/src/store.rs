//! Message store for the active chat.
//!
//! The store is the only mutator of the message list. Every mutation goes
//! through a named operation, which is what keeps the reconciliation
//! invariants checkable:
//!
//! - at most one optimistic entry per correlation id
//! - a confirmed identifier appears at most once
//! - entries are append-ordered by arrival and never re-sorted

use homeroom_proto::{InboundMessage, UserId};

use crate::state::{DeliveryStatus, MessageView};

/// Outcome of reconciling an inbound message against the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// An optimistic entry was confirmed in place.
    Confirmed {
        /// Correlation id of the entry that was confirmed, when it had one.
        client_ref: Option<String>,
    },
    /// A new entry was appended.
    Appended,
    /// The identifier was already present; the list is untouched.
    Duplicate,
}

/// Ordered message list for the currently open chat.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<MessageView>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The message list, in arrival order.
    pub fn messages(&self) -> &[MessageView] {
        &self.messages
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all entries. Called on chat switch.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Replace the list with fetched history, deduplicating by confirmed
    /// identifier.
    pub fn set_history(&mut self, history: &[InboundMessage], viewer: &UserId) {
        self.messages.clear();
        for message in history {
            if let Some(id) = &message.id {
                if self.contains_id(id) {
                    continue;
                }
            }
            self.messages.push(MessageView::confirmed(message, viewer));
        }
    }

    /// Append a locally authored entry before its network round-trip.
    pub fn push_optimistic(&mut self, entry: MessageView) {
        self.messages.push(entry);
    }

    /// Reconcile an inbound message against the list.
    ///
    /// Correlation-id matching is the primary path; content matching is the
    /// fallback for servers that do not echo `clientRef`. A message that
    /// matches neither is appended unless its identifier is already present.
    pub fn reconcile(&mut self, inbound: &InboundMessage, viewer: &UserId) -> Reconciliation {
        // Duplicate suppression comes first: a repeated echo must never
        // match a newer optimistic entry and smuggle its id in twice.
        if let Some(id) = &inbound.id {
            if self.contains_id(id) {
                return Reconciliation::Duplicate;
            }
        }

        let confirmed = MessageView::confirmed(inbound, viewer);

        if let Some(client_ref) = &inbound.client_ref {
            if let Some(position) = self
                .messages
                .iter()
                .position(|m| m.is_optimistic() && m.client_ref.as_deref() == Some(client_ref))
            {
                // Replace in place; the entry keeps its list position
                self.messages[position] = MessageView {
                    client_ref: Some(client_ref.clone()),
                    ..confirmed
                };
                return Reconciliation::Confirmed { client_ref: Some(client_ref.clone()) };
            }
        }

        if confirmed.from_self {
            if let Some(position) = self.messages.iter().position(|m| {
                m.is_optimistic()
                    && m.from_self
                    && m.sender_id == inbound.sender.id
                    && m.body == inbound.body_text()
            }) {
                let client_ref = self.messages[position].client_ref.clone();
                self.messages[position] = MessageView { client_ref: client_ref.clone(), ..confirmed };
                return Reconciliation::Confirmed { client_ref };
            }
        }

        self.messages.push(confirmed);
        Reconciliation::Appended
    }

    /// Mark an optimistic entry as failed. Returns whether one matched.
    pub fn mark_failed(&mut self, client_ref: &str) -> bool {
        self.with_optimistic(client_ref, |m| m.status = DeliveryStatus::Failed)
    }

    /// Flip a failed entry back to sending for a retry. Returns the entry
    /// body when one matched.
    pub fn begin_retry(&mut self, client_ref: &str) -> Option<String> {
        let entry = self
            .messages
            .iter_mut()
            .find(|m| m.is_optimistic() && m.client_ref.as_deref() == Some(client_ref))?;
        if entry.status != DeliveryStatus::Failed {
            return None;
        }
        entry.status = DeliveryStatus::Sending;
        Some(entry.body.clone())
    }

    /// The most recent failed entry, if any.
    pub fn last_failed(&self) -> Option<&MessageView> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.status == DeliveryStatus::Failed)
    }

    fn contains_id(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id.as_deref() == Some(id))
    }

    fn with_optimistic(&mut self, client_ref: &str, apply: impl FnOnce(&mut MessageView)) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| m.is_optimistic() && m.client_ref.as_deref() == Some(client_ref))
        {
            Some(entry) => {
                apply(entry);
                true
            },
            None => false,
        }
    }
}
