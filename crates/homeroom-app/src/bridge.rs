//! Session-to-application translation layer.
//!
//! The [`Bridge`] wraps the low-level [`homeroom_client::Session`] and
//! adapts it to the application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts session-bound [`crate::AppAction`]s into [`SessionEvent`]s
//!   and executes them.
//! - Accumulates outgoing [`OutboundEvent`]s and link commands for the
//!   driver to execute in the next I/O cycle.
//! - Interprets [`SessionAction`]s and converts them back into
//!   [`crate::AppEvent`]s to update the UI.

use homeroom_client::{Clock, Session, SessionAction, SessionError, SessionEvent, TransportNotice};
use homeroom_proto::OutboundEvent;

use crate::{AppAction, AppEvent};

/// Transport lifecycle commands for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand {
    /// Open the socket to the given endpoint.
    Start {
        /// Socket endpoint URL.
        url: String,
    },
    /// Close the socket.
    Stop,
}

/// Bridge between App and Session protocol logic.
///
/// Generic over [`Clock`] to support both production and simulated time.
pub struct Bridge<C: Clock> {
    session: Session<C>,
    outgoing: Vec<OutboundEvent>,
    link_commands: Vec<LinkCommand>,
}

impl<C: Clock> Bridge<C> {
    /// Create a new bridge around the given session.
    pub fn new(session: Session<C>) -> Self {
        Self { session, outgoing: Vec::new(), link_commands: Vec::new() }
    }

    /// The wrapped session (read-only).
    pub fn session(&self) -> &Session<C> {
        &self.session
    }

    /// Process a session-bound App action and return resulting App events.
    ///
    /// Actions the session does not handle (rendering, REST calls) return
    /// no events; the runtime executes those directly.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        let event = match action {
            AppAction::Connect => SessionEvent::Connect,
            AppAction::Disconnect => SessionEvent::Disconnect,
            AppAction::Register { user_id } => SessionEvent::Register { user_id },
            AppAction::JoinChat { chat_id } => SessionEvent::Join { chat_id },
            AppAction::LeaveChat { chat_id } => SessionEvent::Leave { chat_id },
            AppAction::SendMessage { chat_id, sender_id, body, client_ref } => {
                SessionEvent::Send { chat_id, sender_id, body, client_ref }
            },
            AppAction::Render
            | AppAction::Quit
            | AppAction::FetchChats
            | AppAction::FetchHistory { .. }
            | AppAction::CreateChat(_) => return vec![],
        };

        let result = self.session.handle(event);
        self.handle_session_result(result)
    }

    /// Feed a transport notice into the session.
    ///
    /// Link transitions also surface as connection events for the UI
    /// indicator.
    pub fn handle_notice(&mut self, notice: TransportNotice) -> Vec<AppEvent> {
        let connection_event = match &notice {
            TransportNotice::Up => Some(AppEvent::Connected),
            TransportNotice::Down => Some(AppEvent::Disconnected),
            TransportNotice::Event(_) => None,
        };

        let result = self.session.handle(SessionEvent::from(notice));
        let mut events = self.handle_session_result(result);
        if let Some(event) = connection_event {
            events.push(event);
        }
        events
    }

    /// Process a time tick for send-timeout housekeeping.
    pub fn handle_tick(&mut self) -> Vec<AppEvent> {
        let result = self.session.handle(SessionEvent::Tick);
        self.handle_session_result(result)
    }

    /// Take pending outgoing events.
    pub fn take_outgoing(&mut self) -> Vec<OutboundEvent> {
        std::mem::take(&mut self.outgoing)
    }

    /// Take pending link commands.
    pub fn take_link_commands(&mut self) -> Vec<LinkCommand> {
        std::mem::take(&mut self.link_commands)
    }

    fn handle_session_result(
        &mut self,
        result: Result<Vec<SessionAction>, SessionError>,
    ) -> Vec<AppEvent> {
        match result {
            Ok(actions) => self.process_session_actions(actions),
            Err(e) => vec![AppEvent::Error { message: e.to_string() }],
        }
    }

    fn process_session_actions(&mut self, actions: Vec<SessionAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                SessionAction::StartTransport { url } => {
                    self.link_commands.push(LinkCommand::Start { url });
                },
                SessionAction::StopTransport => {
                    self.link_commands.push(LinkCommand::Stop);
                },
                SessionAction::Emit(event) => {
                    self.outgoing.push(event);
                },
                SessionAction::Deliver(message) => {
                    events.push(AppEvent::MessageReceived(message));
                },
                SessionAction::SendFailed { chat_id, client_ref } => {
                    events.push(AppEvent::MessageFailed { chat_id, client_ref });
                },
                SessionAction::Log { message } => {
                    tracing::debug!(%message, "session");
                },
            }
        }

        events
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use homeroom_client::test_utils::MockClock;
    use homeroom_proto::{ChatId, InboundEvent, InboundMessage, MessageBody, SenderRef, UserId};

    use super::*;

    const URL: &str = "ws://localhost:5000";

    fn bridge() -> Bridge<MockClock> {
        Bridge::new(Session::new(MockClock::new(), URL))
    }

    fn online_bridge() -> Bridge<MockClock> {
        let mut bridge = bridge();
        bridge.process_app_action(AppAction::Connect);
        bridge.process_app_action(AppAction::Register { user_id: UserId::new("u1") });
        bridge.handle_notice(TransportNotice::Up);
        bridge.take_outgoing();
        bridge.take_link_commands();
        bridge
    }

    #[test]
    fn connect_produces_a_start_command() {
        let mut bridge = bridge();
        let events = bridge.process_app_action(AppAction::Connect);
        assert!(events.is_empty());
        assert_eq!(bridge.take_link_commands(), vec![LinkCommand::Start { url: URL.into() }]);
    }

    #[test]
    fn link_up_surfaces_a_connected_event() {
        let mut bridge = bridge();
        bridge.process_app_action(AppAction::Connect);

        let events = bridge.handle_notice(TransportNotice::Up);
        assert!(events.contains(&AppEvent::Connected));
    }

    #[test]
    fn send_produces_an_outgoing_event() {
        let mut bridge = online_bridge();

        let events = bridge.process_app_action(AppAction::SendMessage {
            chat_id: ChatId::new("c1"),
            sender_id: UserId::new("u1"),
            body: "hi".into(),
            client_ref: "tmp-1".into(),
        });
        assert!(events.is_empty());
        assert_eq!(bridge.take_outgoing().len(), 1);
    }

    #[test]
    fn send_before_register_surfaces_an_error_event() {
        let mut bridge = bridge();
        bridge.process_app_action(AppAction::Connect);
        bridge.handle_notice(TransportNotice::Up);

        let events = bridge.process_app_action(AppAction::SendMessage {
            chat_id: ChatId::new("c1"),
            sender_id: UserId::new("u1"),
            body: "hi".into(),
            client_ref: "tmp-1".into(),
        });
        assert!(matches!(events.as_slice(), [AppEvent::Error { .. }]));
    }

    #[test]
    fn inbound_broadcast_becomes_a_message_event() {
        let mut bridge = online_bridge();

        let message = InboundMessage {
            id: Some("m1".into()),
            chat_id: ChatId::new("c1"),
            sender: SenderRef { id: UserId::new("u2"), name: None },
            message: Some(MessageBody::Text("hi".into())),
            kind: homeroom_proto::MessageKind::Text,
            created_at: None,
            from_self: Some(false),
            client_ref: None,
        };
        let events = bridge.handle_notice(TransportNotice::Event(InboundEvent::MsgReceive(message)));

        assert!(matches!(events.as_slice(), [AppEvent::MessageReceived(_)]));
    }
}
