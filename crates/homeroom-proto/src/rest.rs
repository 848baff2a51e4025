//! Request and response bodies for the chat REST endpoints.
//!
//! - `GET /chats` → [`ChatsResponse`]
//! - `POST /chats` [`CreateChatRequest`] → [`ChatResponse`]
//! - `POST /messages/getmsg` [`HistoryRequest`] → `Vec<InboundMessage>`
//! - `POST /messages/addmsg` [`PostMessageRequest`] — fallback delivery
//!   path; the primary send path is the socket.

use serde::{Deserialize, Serialize};

use crate::chat::{Chat, ChatId, ChatKind, UserId};

/// Response of `GET /chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatsResponse {
    /// All chats visible to the requesting user.
    pub chats: Vec<Chat>,
}

/// Body of `POST /chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    /// Display name. Omitted for direct chats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Members of the new chat.
    pub participant_ids: Vec<UserId>,
    /// Conversation shape.
    #[serde(rename = "type")]
    pub kind: ChatKind,
}

/// Response of `POST /chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The created chat with its server-assigned identifier.
    pub chat: Chat,
}

/// Body of `POST /messages/getmsg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    /// Chat whose history to fetch.
    pub chat_id: ChatId,
    /// Requesting user; the server computes per-message `fromSelf` flags
    /// relative to this identity.
    pub user_id: UserId,
}

/// Body of `POST /messages/addmsg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    /// Target chat.
    pub chat_id: ChatId,
    /// Sending user.
    pub sender_id: UserId,
    /// Message text.
    pub message: String,
}
