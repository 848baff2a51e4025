//! Message payloads and tolerant body normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::chat::{ChatId, UserId};

/// Placeholder body shown when a message arrives without a usable body.
/// A degraded display beats breaking the whole message stream.
pub const UNSUPPORTED_BODY: &str = "[unsupported message]";

/// Message kind. Only text exists today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text message.
    #[default]
    Text,
}

/// Body shapes the server is known to emit: a bare string, or a
/// `{"text": ...}` object from older server versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    /// Plain string body.
    Text(String),
    /// Structured body.
    Structured {
        /// The text content.
        text: String,
    },
}

impl MessageBody {
    /// The text content regardless of shape.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Structured { text } => text,
        }
    }
}

/// Accept either known body shape; map anything else to `None` instead of
/// failing the whole event.
fn lenient_body<'de, D>(deserializer: D) -> Result<Option<MessageBody>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Sender reference carried on broadcast messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderRef {
    /// Sender's user identifier.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Sender's display name, when denormalized onto the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A message as broadcast by the server (`msg-recieve` payload) and as
/// returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Server-assigned identifier. Absent on some legacy echoes.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Owning chat.
    pub chat_id: ChatId,
    /// Who sent it.
    pub sender: SenderRef,
    /// Body in whichever shape the server used. `None` when absent or
    /// unrecognized; [`InboundMessage::body_text`] substitutes a placeholder.
    #[serde(default, deserialize_with = "lenient_body")]
    pub message: Option<MessageBody>,
    /// Message kind.
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// Server-side creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the server when the message originated from this session's
    /// user. Computed relative to the viewing client, never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_self: Option<bool>,
    /// Echo of the client-generated correlation id from `send-msg`.
    /// Servers that predate correlation ids omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
}

impl InboundMessage {
    /// Normalized body text. Falls back to [`UNSUPPORTED_BODY`] when the
    /// body is missing or had an unknown shape.
    pub fn body_text(&self) -> &str {
        self.message.as_ref().map_or(UNSUPPORTED_BODY, MessageBody::as_text)
    }

    /// Whether this message originated from `viewer`'s session. Prefers the
    /// server's explicit flag, falling back to sender comparison.
    pub fn is_from_self(&self, viewer: &UserId) -> bool {
        self.from_self.unwrap_or(self.sender.id == *viewer)
    }
}
