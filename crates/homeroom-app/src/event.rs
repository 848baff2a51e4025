//! Application input events.
//!
//! Events originate from two sources: REST results executed by the
//! runtime, and session notifications translated by the [`crate::Bridge`].

use homeroom_proto::{Chat, ChatId, InboundMessage};

/// Events processed by the [`crate::App`] state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The link is up and the identity registered.
    Connected,

    /// The link is down; the transport keeps reconnecting.
    Disconnected,

    /// Chat list fetched from the REST API.
    ChatsLoaded(Vec<Chat>),

    /// A chat was created via the REST API.
    ChatCreated(Chat),

    /// Message history fetched for a chat.
    HistoryLoaded {
        /// Chat the history belongs to.
        chat_id: ChatId,
        /// Messages in server order.
        messages: Vec<InboundMessage>,
    },

    /// A message arrived on the link.
    MessageReceived(InboundMessage),

    /// A send was not confirmed within the timeout.
    MessageFailed {
        /// Chat the send targeted.
        chat_id: ChatId,
        /// Correlation id of the failed send.
        client_ref: String,
    },

    /// Error to surface inline.
    Error {
        /// Human-readable description.
        message: String,
    },
}
