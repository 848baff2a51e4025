//! Application side-effects and intents.
//!
//! Instructions produced by the [`crate::App`] state machine for the
//! runtime to execute, either against the session (via the bridge) or
//! against the REST API (via the driver).

use homeroom_proto::{ChatId, UserId, rest::CreateChatRequest};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the current state.
    Render,

    /// Quit the application.
    Quit,

    /// Open the chat session (idempotent).
    Connect,

    /// Close the chat session (idempotent).
    Disconnect,

    /// Register the user identity on the session.
    Register {
        /// Identity to register.
        user_id: UserId,
    },

    /// Subscribe to a chat's broadcasts.
    JoinChat {
        /// Chat to subscribe to.
        chat_id: ChatId,
    },

    /// Unsubscribe from a chat's broadcasts.
    LeaveChat {
        /// Chat to unsubscribe from.
        chat_id: ChatId,
    },

    /// Send a message over the session. The optimistic entry is already in
    /// the store when this action is emitted.
    SendMessage {
        /// Target chat.
        chat_id: ChatId,
        /// Sending user.
        sender_id: UserId,
        /// Message text.
        body: String,
        /// Correlation id shared with the optimistic entry.
        client_ref: String,
    },

    /// Fetch the chat list from the REST API.
    FetchChats,

    /// Fetch message history for a chat from the REST API.
    FetchHistory {
        /// Chat whose history to fetch.
        chat_id: ChatId,
    },

    /// Create a chat via the REST API.
    CreateChat(CreateChatRequest),
}
