//! Observable application state types.
//!
//! These structures are the "view model" for the chat feature: the subset
//! of session and message state a frontend needs for rendering, without
//! exposing transport mechanics.

use chrono::{DateTime, Utc};
use homeroom_proto::{InboundMessage, MessageKind, UserId};

/// Connection state, surfaced to the UI as an online indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to the chat endpoint.
    Disconnected,
    /// Connection requested, link not yet up.
    Connecting,
    /// Link is up and the identity is registered.
    Connected {
        /// The registered user.
        user_id: UserId,
    },
}

/// Delivery state of a message authored in this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Optimistically shown; not yet confirmed by the server. Covers both
    /// in-flight and queued-while-offline sends.
    Sending,
    /// Confirmed by a server echo or loaded from history.
    Delivered,
    /// No confirmation arrived within the timeout. Retryable.
    Failed,
}

/// One entry in the active chat's message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    /// Server-assigned identifier. `None` while the entry is optimistic.
    pub id: Option<String>,
    /// Client-generated correlation id. Set on locally authored entries;
    /// kept after confirmation for traceability.
    pub client_ref: Option<String>,
    /// Sender's user identifier.
    pub sender_id: UserId,
    /// Sender's display name, when known.
    pub sender_name: Option<String>,
    /// Normalized body text.
    pub body: String,
    /// Whether this message originated from the viewing session's user.
    pub from_self: bool,
    /// Message kind.
    pub kind: MessageKind,
    /// Delivery state. Always `Delivered` for messages from others.
    pub status: DeliveryStatus,
    /// Server-side creation time. `None` until an optimistic entry is
    /// confirmed; adopted from the echo, never from the local clock.
    pub sent_at: Option<DateTime<Utc>>,
}

impl MessageView {
    /// Build a confirmed entry from a server message.
    pub fn confirmed(message: &InboundMessage, viewer: &UserId) -> Self {
        Self {
            id: message.id.clone(),
            client_ref: message.client_ref.clone(),
            sender_id: message.sender.id.clone(),
            sender_name: message.sender.name.clone(),
            body: message.body_text().to_string(),
            from_self: message.is_from_self(viewer),
            kind: message.kind,
            status: DeliveryStatus::Delivered,
            sent_at: message.created_at,
        }
    }

    /// Identifier to display: the server id once confirmed, the correlation
    /// id before that.
    pub fn display_id(&self) -> &str {
        self.id
            .as_deref()
            .or(self.client_ref.as_deref())
            .unwrap_or_default()
    }

    /// Whether this entry still awaits server confirmation.
    pub fn is_optimistic(&self) -> bool {
        self.id.is_none()
    }
}
