//! Session events and actions.

use homeroom_proto::{ChatId, InboundEvent, InboundMessage, OutboundEvent, UserId};

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Forwarding application intents (connect, join, send, ...)
/// - Forwarding transport notices (link up/down, decoded server events)
/// - Driving time forward via ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Application wants a live connection. Idempotent — a second connect
    /// while one is desired is a no-op.
    Connect,

    /// Application is leaving the chat feature. Idempotent and safe to call
    /// on a session that never connected.
    Disconnect,

    /// Register the user identity this connection represents.
    ///
    /// Replayed automatically on every reconnect.
    Register {
        /// Identity to register.
        user_id: UserId,
    },

    /// Subscribe to a chat's broadcasts.
    Join {
        /// Chat to subscribe to.
        chat_id: ChatId,
    },

    /// Unsubscribe from a chat's broadcasts.
    Leave {
        /// Chat to unsubscribe from.
        chat_id: ChatId,
    },

    /// Send a message. The caller has already inserted the optimistic entry
    /// into its message store; the session only handles delivery.
    Send {
        /// Target chat.
        chat_id: ChatId,
        /// Sending user.
        sender_id: UserId,
        /// Message text.
        body: String,
        /// Caller-generated correlation id, unique per send attempt.
        client_ref: String,
    },

    /// The transport link came up (first connect or reconnect).
    TransportUp,

    /// The transport link was lost. Reconnection is the transport's job.
    TransportDown,

    /// Decoded event arrived from the server.
    EventReceived(InboundEvent),

    /// Time tick for timeout processing.
    ///
    /// The caller should send ticks periodically so the session can expire
    /// sends whose confirmation never arrived.
    Tick,
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open the transport link to the given endpoint.
    StartTransport {
        /// Socket endpoint URL.
        url: String,
    },

    /// Tear the transport link down.
    StopTransport,

    /// Emit an event on the transport link.
    Emit(OutboundEvent),

    /// Deliver an inbound message to the application layer. Reconciliation
    /// against optimistic entries is the message store's job.
    Deliver(InboundMessage),

    /// A send was not confirmed within the timeout. The caller should mark
    /// the optimistic entry failed and offer a retry.
    SendFailed {
        /// Chat the send targeted.
        chat_id: ChatId,
        /// Correlation id of the failed send.
        client_ref: String,
    },

    /// Diagnostic message, surfaced as an action so simulations can assert
    /// on it.
    Log {
        /// Log message.
        message: String,
    },
}

/// Notices the transport layer delivers to the session's caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportNotice {
    /// Link established (first connect or reconnect).
    Up,

    /// Link lost; the transport keeps reconnecting on its own.
    Down,

    /// Decoded server event.
    Event(InboundEvent),
}

impl From<TransportNotice> for SessionEvent {
    fn from(notice: TransportNotice) -> Self {
        match notice {
            TransportNotice::Up => Self::TransportUp,
            TransportNotice::Down => Self::TransportDown,
            TransportNotice::Event(event) => Self::EventReceived(event),
        }
    }
}
