//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific
//! I/O implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use homeroom_client::TransportNotice;
use homeroom_proto::{Chat, ChatId, InboundMessage, OutboundEvent, UserId, rest::CreateChatRequest};

use crate::App;

/// User intents surfaced by the driver's input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// Open a chat (make it active).
    OpenChat(ChatId),
    /// Send a text message to the active chat.
    SendText(String),
    /// Retry the most recent failed send.
    RetryLastFailed,
    /// Create a chat.
    NewChat(CreateChatRequest),
    /// Reload the chat list.
    RefreshChats,
    /// Leave the chat feature.
    Quit,
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic, so the same
/// orchestration code runs in production and in simulation.
///
/// `poll_event` and `recv_notice` should return promptly (after a short
/// poll interval) when nothing is ready — the runtime alternates between
/// them on a single task.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for the next user intent. `None` if no input is ready.
    fn poll_event(&mut self)
    -> impl Future<Output = Result<Option<UserIntent>, Self::Error>> + Send;

    /// Open the socket to the given endpoint.
    ///
    /// Reconnection after link loss is the transport's own job; this is
    /// only called when the session asks for a transport.
    fn connect_link(&mut self, url: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the socket. Safe to call when no socket is open.
    fn close_link(&mut self);

    /// Emit an event on the socket.
    fn send_event(
        &mut self,
        event: OutboundEvent,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive the next transport notice. `None` if nothing is ready.
    fn recv_notice(&mut self) -> impl Future<Output = Option<TransportNotice>> + Send;

    /// Fetch the chat list (`GET /chats`).
    fn fetch_chats(&mut self) -> impl Future<Output = Result<Vec<Chat>, Self::Error>> + Send;

    /// Fetch message history (`POST /messages/getmsg`).
    fn fetch_history(
        &mut self,
        chat_id: &ChatId,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<InboundMessage>, Self::Error>> + Send;

    /// Create a chat (`POST /chats`).
    fn create_chat(
        &mut self,
        request: &CreateChatRequest,
    ) -> impl Future<Output = Result<Chat, Self::Error>> + Send;

    /// Render the application state.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
