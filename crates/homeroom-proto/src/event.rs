//! Socket event vocabulary.
//!
//! Events ride as JSON text frames shaped `{"event": "<name>", "data": ...}`.
//! The names match the production server verbatim — including the
//! `msg-recieve` misspelling, which is the actual wire event name.

use serde::{Deserialize, Serialize};

use crate::{
    chat::{ChatId, UserId},
    error::ProtocolError,
    message::InboundMessage,
};

/// Payload of the `send-msg` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMsg {
    /// Target chat.
    pub chat_id: ChatId,
    /// Sending user.
    pub sender_id: UserId,
    /// Message text.
    pub message: String,
    /// Client-generated correlation id, echoed back on the broadcast so the
    /// sender can match its optimistic entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ref: Option<String>,
}

/// Events the client emits to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum OutboundEvent {
    /// Bind this connection to a user identity for server-side routing.
    #[serde(rename = "add-user")]
    AddUser {
        /// Identity to register.
        #[serde(rename = "userId")]
        user_id: UserId,
    },

    /// Subscribe to a chat's broadcasts.
    #[serde(rename = "join-chat")]
    JoinChat {
        /// Chat to subscribe to.
        #[serde(rename = "chatId")]
        chat_id: ChatId,
    },

    /// Unsubscribe from a chat's broadcasts.
    #[serde(rename = "leave-chat")]
    LeaveChat {
        /// Chat to unsubscribe from.
        #[serde(rename = "chatId")]
        chat_id: ChatId,
    },

    /// Send a message.
    #[serde(rename = "send-msg")]
    SendMsg(SendMsg),
}

impl OutboundEvent {
    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode { reason: e.to_string() })
    }
}

/// Events the server pushes to the client.
///
/// Connection lifecycle (connect, disconnect, connect errors) is carried by
/// the transport layer, not as wire events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum InboundEvent {
    /// A chat message broadcast.
    #[serde(rename = "msg-recieve")]
    MsgReceive(InboundMessage),
}

impl InboundEvent {
    /// Decode from a JSON text frame.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Decode { reason: e.to_string() })
    }
}
