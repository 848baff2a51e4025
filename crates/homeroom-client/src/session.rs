//! Session state machine.
//!
//! The `Session` is the top-level state machine for one user's chat
//! session: it owns the transport lifecycle, the registered identity, room
//! membership, the outbound send queue, and the pending-send registry.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    time::Duration,
};

use homeroom_proto::{ChatId, InboundEvent, InboundMessage, OutboundEvent, SendMsg, UserId};

use crate::{
    clock::Clock,
    error::SessionError,
    event::{SessionAction, SessionEvent},
};

/// How long a send may remain unconfirmed before it is failed.
pub const SEND_CONFIRM_TIMEOUT: Duration = Duration::from_secs(20);

/// A send awaiting its server echo.
#[derive(Debug, Clone)]
struct PendingSend<I> {
    chat_id: ChatId,
    body: String,
    sent_at: I,
}

/// Session manager for one authenticated user.
///
/// Pure state machine: consumes [`SessionEvent`]s, returns
/// [`SessionAction`]s for the caller to execute. Identity and room
/// membership are session state, not transport state — they survive link
/// loss and are replayed on every reconnect.
pub struct Session<C: Clock> {
    clock: C,

    /// Socket endpoint handed to `StartTransport`.
    socket_url: String,

    /// True between `Connect` and `Disconnect`, regardless of link health.
    transport_desired: bool,

    /// True while the underlying link is up.
    connected: bool,

    /// Registered identity. Replayed as `add-user` on reconnect.
    user: Option<UserId>,

    /// Desired room subscriptions. Replayed as `join-chat` on reconnect.
    joined: BTreeSet<ChatId>,

    /// Sends made while the link was down, flushed in order on reconnect.
    outbound: VecDeque<SendMsg>,

    /// Sends awaiting confirmation, keyed by correlation id.
    pending: BTreeMap<String, PendingSend<C::Instant>>,
}

impl<C: Clock> Session<C> {
    /// Create a session that will connect to `socket_url`.
    pub fn new(clock: C, socket_url: impl Into<String>) -> Self {
        Self {
            clock,
            socket_url: socket_url.into(),
            transport_desired: false,
            connected: false,
            user: None,
            joined: BTreeSet::new(),
            outbound: VecDeque::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Whether the link is currently up.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Registered identity, if any.
    pub fn registered_user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// Rooms this session wants to be subscribed to.
    pub fn joined(&self) -> impl Iterator<Item = &ChatId> {
        self.joined.iter()
    }

    /// Number of sends awaiting confirmation.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of sends queued for a link that is currently down.
    pub fn queued_count(&self) -> usize {
        self.outbound.len()
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Connect => Ok(self.handle_connect()),
            SessionEvent::Disconnect => Ok(self.handle_disconnect()),
            SessionEvent::Register { user_id } => Ok(self.handle_register(user_id)),
            SessionEvent::Join { chat_id } => Ok(self.handle_join(chat_id)),
            SessionEvent::Leave { chat_id } => Ok(self.handle_leave(&chat_id)),
            SessionEvent::Send { chat_id, sender_id, body, client_ref } => {
                self.handle_send(chat_id, sender_id, body, client_ref)
            },
            SessionEvent::TransportUp => Ok(self.handle_transport_up()),
            SessionEvent::TransportDown => Ok(self.handle_transport_down()),
            SessionEvent::EventReceived(event) => Ok(self.handle_event_received(event)),
            SessionEvent::Tick => Ok(self.handle_tick()),
        }
    }

    fn handle_connect(&mut self) -> Vec<SessionAction> {
        if self.transport_desired {
            // Already connecting or connected
            return vec![];
        }
        self.transport_desired = true;
        vec![SessionAction::StartTransport { url: self.socket_url.clone() }]
    }

    fn handle_disconnect(&mut self) -> Vec<SessionAction> {
        if !self.transport_desired {
            return vec![];
        }
        self.transport_desired = false;
        self.connected = false;
        vec![SessionAction::StopTransport]
    }

    fn handle_register(&mut self, user_id: UserId) -> Vec<SessionAction> {
        self.user = Some(user_id.clone());
        if self.connected {
            vec![SessionAction::Emit(OutboundEvent::AddUser { user_id })]
        } else {
            // Not dropped: the identity is replayed on the next TransportUp.
            vec![SessionAction::Log {
                message: format!("link down, identity {user_id} held for replay"),
            }]
        }
    }

    fn handle_join(&mut self, chat_id: ChatId) -> Vec<SessionAction> {
        self.joined.insert(chat_id.clone());
        if self.connected {
            vec![SessionAction::Emit(OutboundEvent::JoinChat { chat_id })]
        } else {
            vec![]
        }
    }

    fn handle_leave(&mut self, chat_id: &ChatId) -> Vec<SessionAction> {
        let was_joined = self.joined.remove(chat_id);
        if was_joined && self.connected {
            vec![SessionAction::Emit(OutboundEvent::LeaveChat { chat_id: chat_id.clone() })]
        } else {
            vec![]
        }
    }

    fn handle_send(
        &mut self,
        chat_id: ChatId,
        sender_id: UserId,
        body: String,
        client_ref: String,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if self.user.is_none() {
            return Err(SessionError::NotRegistered);
        }

        self.pending.insert(client_ref.clone(), PendingSend {
            chat_id: chat_id.clone(),
            body: body.clone(),
            sent_at: self.clock.now(),
        });

        let payload = SendMsg {
            chat_id,
            sender_id,
            message: body,
            client_ref: Some(client_ref.clone()),
        };

        if self.connected {
            Ok(vec![SessionAction::Emit(OutboundEvent::SendMsg(payload))])
        } else {
            // A retry may re-queue the same correlation id; keep one copy.
            self.outbound.retain(|queued| queued.client_ref.as_deref() != Some(&client_ref));
            self.outbound.push_back(payload);
            tracing::warn!(%client_ref, "link down, queued message for replay");
            Ok(vec![SessionAction::Log {
                message: format!("link down, message {client_ref} queued"),
            }])
        }
    }

    /// Replay session state against a freshly established link: identity
    /// first (the server routes by it), then room subscriptions, then any
    /// sends queued while the link was down, in submission order.
    fn handle_transport_up(&mut self) -> Vec<SessionAction> {
        self.connected = true;

        let mut actions = Vec::new();

        if let Some(user_id) = &self.user {
            actions.push(SessionAction::Emit(OutboundEvent::AddUser { user_id: user_id.clone() }));
        }

        for chat_id in &self.joined {
            actions.push(SessionAction::Emit(OutboundEvent::JoinChat { chat_id: chat_id.clone() }));
        }

        let queued = self.outbound.len();
        while let Some(payload) = self.outbound.pop_front() {
            actions.push(SessionAction::Emit(OutboundEvent::SendMsg(payload)));
        }

        actions.push(SessionAction::Log {
            message: format!(
                "link up, replayed identity and {} room(s), flushed {queued} queued send(s)",
                self.joined.len()
            ),
        });

        actions
    }

    fn handle_transport_down(&mut self) -> Vec<SessionAction> {
        self.connected = false;
        vec![SessionAction::Log { message: "link down".to_string() }]
    }

    fn handle_event_received(&mut self, event: InboundEvent) -> Vec<SessionAction> {
        match event {
            InboundEvent::MsgReceive(message) => {
                self.clear_confirmed_pending(&message);
                vec![SessionAction::Deliver(message)]
            },
        }
    }

    /// Drop the pending entry a broadcast confirms, so the timeout sweep
    /// does not later fail a message that was delivered.
    ///
    /// Matches by correlation id when the server echoes one; otherwise
    /// falls back to (chat, body) matching for own messages, mirroring the
    /// store's legacy reconciliation path.
    fn clear_confirmed_pending(&mut self, message: &InboundMessage) {
        if let Some(client_ref) = &message.client_ref {
            self.pending.remove(client_ref);
            return;
        }

        let from_self = self
            .user
            .as_ref()
            .is_some_and(|user| message.is_from_self(user));
        if !from_self {
            return;
        }

        let matched = self.pending.iter().find_map(|(client_ref, send)| {
            (send.chat_id == message.chat_id && send.body == message.body_text())
                .then(|| client_ref.clone())
        });
        if let Some(client_ref) = matched {
            self.pending.remove(&client_ref);
        }
    }

    /// Expire sends whose confirmation never arrived. Expired sends are
    /// removed from the pending registry and the outbound queue, and
    /// reported as failed for the caller to surface.
    fn handle_tick(&mut self) -> Vec<SessionAction> {
        let now = self.clock.now();

        let expired: Vec<(String, ChatId)> = self
            .pending
            .iter()
            .filter(|(_, send)| now - send.sent_at > SEND_CONFIRM_TIMEOUT)
            .map(|(client_ref, send)| (client_ref.clone(), send.chat_id.clone()))
            .collect();

        let mut actions = Vec::new();
        for (client_ref, chat_id) in expired {
            self.pending.remove(&client_ref);
            self.outbound.retain(|queued| queued.client_ref.as_deref() != Some(&client_ref));

            actions.push(SessionAction::Log {
                message: format!("send {client_ref} unconfirmed after timeout, marking failed"),
            });
            actions.push(SessionAction::SendFailed { chat_id, client_ref });
        }

        actions
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use homeroom_proto::SenderRef;

    use super::*;
    use crate::clock::test_utils::MockClock;

    const URL: &str = "ws://localhost:5000";

    fn session() -> (Session<MockClock>, MockClock) {
        let clock = MockClock::new();
        (Session::new(clock.clone(), URL), clock)
    }

    fn registered_session() -> (Session<MockClock>, MockClock) {
        let (mut session, clock) = session();
        session.handle(SessionEvent::Connect).unwrap();
        session.handle(SessionEvent::Register { user_id: UserId::new("u1") }).unwrap();
        session.handle(SessionEvent::TransportUp).unwrap();
        (session, clock)
    }

    fn send_event(body: &str, client_ref: &str) -> SessionEvent {
        SessionEvent::Send {
            chat_id: ChatId::new("c1"),
            sender_id: UserId::new("u1"),
            body: body.to_string(),
            client_ref: client_ref.to_string(),
        }
    }

    fn echo(body: &str, client_ref: Option<&str>) -> InboundEvent {
        InboundEvent::MsgReceive(InboundMessage {
            id: Some("m1".into()),
            chat_id: ChatId::new("c1"),
            sender: SenderRef { id: UserId::new("u1"), name: None },
            message: Some(homeroom_proto::MessageBody::Text(body.into())),
            kind: homeroom_proto::MessageKind::Text,
            created_at: None,
            from_self: Some(true),
            client_ref: client_ref.map(String::from),
        })
    }

    fn emitted(actions: &[SessionAction]) -> Vec<&OutboundEvent> {
        actions
            .iter()
            .filter_map(|a| match a {
                SessionAction::Emit(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn connect_is_idempotent() {
        let (mut session, _) = session();

        let first = session.handle(SessionEvent::Connect).unwrap();
        assert_eq!(first, vec![SessionAction::StartTransport { url: URL.into() }]);

        let second = session.handle(SessionEvent::Connect).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn disconnect_is_idempotent_and_safe_when_never_connected() {
        let (mut session, _) = session();

        assert!(session.handle(SessionEvent::Disconnect).unwrap().is_empty());

        session.handle(SessionEvent::Connect).unwrap();
        let actions = session.handle(SessionEvent::Disconnect).unwrap();
        assert_eq!(actions, vec![SessionAction::StopTransport]);

        assert!(session.handle(SessionEvent::Disconnect).unwrap().is_empty());
    }

    #[test]
    fn register_while_down_is_held_not_dropped() {
        let (mut session, _) = session();
        session.handle(SessionEvent::Connect).unwrap();

        let actions =
            session.handle(SessionEvent::Register { user_id: UserId::new("u1") }).unwrap();
        assert!(emitted(&actions).is_empty());

        let actions = session.handle(SessionEvent::TransportUp).unwrap();
        assert_eq!(emitted(&actions)[0], &OutboundEvent::AddUser { user_id: UserId::new("u1") });
    }

    #[test]
    fn replay_order_is_identity_then_rooms_then_queue() {
        let (mut session, _) = session();
        session.handle(SessionEvent::Connect).unwrap();
        session.handle(SessionEvent::Register { user_id: UserId::new("u1") }).unwrap();
        session.handle(SessionEvent::Join { chat_id: ChatId::new("c1") }).unwrap();
        session.handle(send_event("hello", "tmp-1")).unwrap();
        session.handle(send_event("world", "tmp-2")).unwrap();

        let actions = session.handle(SessionEvent::TransportUp).unwrap();
        let events = emitted(&actions);
        assert!(matches!(events[0], OutboundEvent::AddUser { .. }));
        assert!(matches!(events[1], OutboundEvent::JoinChat { .. }));
        let OutboundEvent::SendMsg(first) = events[2] else { panic!("expected send") };
        let OutboundEvent::SendMsg(second) = events[3] else { panic!("expected send") };
        assert_eq!(first.client_ref.as_deref(), Some("tmp-1"));
        assert_eq!(second.client_ref.as_deref(), Some("tmp-2"));
        assert_eq!(session.queued_count(), 0);
    }

    #[test]
    fn join_and_leave_emit_only_while_connected() {
        let (mut session, _) = registered_session();

        let actions = session.handle(SessionEvent::Join { chat_id: ChatId::new("c1") }).unwrap();
        assert_eq!(emitted(&actions).len(), 1);

        session.handle(SessionEvent::TransportDown).unwrap();
        let actions = session.handle(SessionEvent::Leave { chat_id: ChatId::new("c1") }).unwrap();
        assert!(emitted(&actions).is_empty());
        assert_eq!(session.joined().count(), 0);
    }

    #[test]
    fn leave_of_unjoined_room_is_a_no_op() {
        let (mut session, _) = registered_session();
        let actions = session.handle(SessionEvent::Leave { chat_id: ChatId::new("c9") }).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn send_before_register_is_rejected() {
        let (mut session, _) = session();
        session.handle(SessionEvent::Connect).unwrap();
        session.handle(SessionEvent::TransportUp).unwrap();

        let result = session.handle(send_event("hello", "tmp-1"));
        assert_eq!(result, Err(SessionError::NotRegistered));
    }

    #[test]
    fn send_while_connected_emits_with_client_ref() {
        let (mut session, _) = registered_session();

        let actions = session.handle(send_event("hello", "tmp-1")).unwrap();
        let events = emitted(&actions);
        let OutboundEvent::SendMsg(payload) = events[0] else { panic!("expected send") };
        assert_eq!(payload.client_ref.as_deref(), Some("tmp-1"));
        assert_eq!(session.pending_count(), 1);
    }

    #[test]
    fn send_while_down_queues_and_keeps_pending() {
        let (mut session, _) = registered_session();
        session.handle(SessionEvent::TransportDown).unwrap();

        let actions = session.handle(send_event("hello", "tmp-1")).unwrap();
        assert!(emitted(&actions).is_empty());
        assert_eq!(session.queued_count(), 1);
        assert_eq!(session.pending_count(), 1);
    }

    #[test]
    fn confirmation_by_client_ref_clears_pending() {
        let (mut session, _) = registered_session();
        session.handle(send_event("hello", "tmp-1")).unwrap();

        let actions = session.handle(SessionEvent::EventReceived(echo("hello", Some("tmp-1")))).unwrap();
        assert!(matches!(actions[0], SessionAction::Deliver(_)));
        assert_eq!(session.pending_count(), 0);
    }

    #[test]
    fn confirmation_without_client_ref_falls_back_to_content_match() {
        let (mut session, _) = registered_session();
        session.handle(send_event("hello", "tmp-1")).unwrap();

        session.handle(SessionEvent::EventReceived(echo("hello", None))).unwrap();
        assert_eq!(session.pending_count(), 0);
    }

    #[test]
    fn foreign_message_leaves_pending_untouched() {
        let (mut session, _) = registered_session();
        session.handle(send_event("hello", "tmp-1")).unwrap();

        let mut event = echo("hello", None);
        let InboundEvent::MsgReceive(message) = &mut event;
        message.sender.id = UserId::new("u2");
        message.from_self = Some(false);

        session.handle(SessionEvent::EventReceived(event)).unwrap();
        assert_eq!(session.pending_count(), 1);
    }

    #[test]
    fn unconfirmed_send_fails_after_timeout() {
        let (mut session, clock) = registered_session();
        session.handle(send_event("hello", "tmp-1")).unwrap();

        clock.advance(SEND_CONFIRM_TIMEOUT + Duration::from_secs(1));
        let actions = session.handle(SessionEvent::Tick).unwrap();

        assert!(actions.iter().any(|a| matches!(
            a,
            SessionAction::SendFailed { client_ref, .. } if client_ref == "tmp-1"
        )));
        assert_eq!(session.pending_count(), 0);
    }

    #[test]
    fn timeout_also_drops_the_queued_copy() {
        let (mut session, clock) = registered_session();
        session.handle(SessionEvent::TransportDown).unwrap();
        session.handle(send_event("hello", "tmp-1")).unwrap();
        assert_eq!(session.queued_count(), 1);

        clock.advance(SEND_CONFIRM_TIMEOUT + Duration::from_secs(1));
        session.handle(SessionEvent::Tick).unwrap();
        assert_eq!(session.queued_count(), 0);
    }

    #[test]
    fn tick_before_timeout_reports_nothing() {
        let (mut session, clock) = registered_session();
        session.handle(send_event("hello", "tmp-1")).unwrap();

        clock.advance(Duration::from_secs(5));
        assert!(session.handle(SessionEvent::Tick).unwrap().is_empty());
        assert_eq!(session.pending_count(), 1);
    }

    #[test]
    fn retry_while_down_keeps_one_queued_copy() {
        let (mut session, _) = registered_session();
        session.handle(SessionEvent::TransportDown).unwrap();
        session.handle(send_event("hello", "tmp-1")).unwrap();
        session.handle(send_event("hello", "tmp-1")).unwrap();

        assert_eq!(session.queued_count(), 1);
        assert_eq!(session.pending_count(), 1);
    }
}
