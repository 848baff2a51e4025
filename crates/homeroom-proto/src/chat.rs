//! Chat and participant entities.
//!
//! These mirror the REST API's JSON shapes: Mongo-style `_id` keys,
//! camelCase field names, and a lowercase `type` discriminator.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned chat identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    /// Build an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Build an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Conversation shape: two participants or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    /// Two-party conversation. Display name is derived from the peer.
    Direct,
    /// Named conversation with any number of participants.
    Group,
}

/// A chat member with denormalized display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// User identifier.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Contact address, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Summary of the most recent message, shown in chat lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    /// Message text.
    pub text: String,
    /// Who sent it.
    pub sender_id: UserId,
    /// When it was sent.
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
}

/// A conversation entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: ChatId,
    /// Explicit display name. `None` for direct chats, which derive theirs
    /// from the peer participant.
    #[serde(default)]
    pub name: Option<String>,
    /// Conversation shape.
    #[serde(rename = "type")]
    pub kind: ChatKind,
    /// Ordered member list.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Most recent message summary, if any message exists.
    #[serde(default)]
    pub last_message: Option<LastMessage>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time (bumped when a message arrives).
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Chat {
    /// Name to display for `viewer`: the explicit name when set, otherwise
    /// the first other participant's name for direct chats.
    pub fn display_name(&self, viewer: &UserId) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.participants
            .iter()
            .find(|p| p.id != *viewer)
            .map_or_else(|| self.id.to_string(), |p| p.name.clone())
    }
}
