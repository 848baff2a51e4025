//! End-to-end scenarios for App + Bridge + Session, without real I/O.
//!
//! A small harness plays the runtime's role: it routes session-bound
//! actions through the bridge, feeds resulting events back into the app,
//! and records outgoing wire events and REST requests so tests can assert
//! on them. REST responses are injected manually as app events.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use homeroom_app::{App, AppAction, AppEvent, Bridge, ConnectionState, DeliveryStatus};
use homeroom_client::{
    SEND_CONFIRM_TIMEOUT, Session, TransportNotice, test_utils::MockClock,
};
use homeroom_proto::{
    Chat, ChatId, ChatKind, InboundEvent, InboundMessage, MessageBody, MessageKind, OutboundEvent,
    Participant, SenderRef, UserId,
};

const URL: &str = "ws://localhost:5000";

struct Harness {
    app: App,
    bridge: Bridge<MockClock>,
    clock: MockClock,
    /// Wire events the session emitted, in order.
    outgoing: Vec<OutboundEvent>,
    /// REST actions the app requested, in order.
    rest: Vec<AppAction>,
}

impl Harness {
    fn new() -> Self {
        let clock = MockClock::new();
        let session = Session::new(clock.clone(), URL);
        let user = Participant { id: UserId::new("u1"), name: "Ada".into(), email: None };
        Self {
            app: App::new(user),
            bridge: Bridge::new(session),
            clock,
            outgoing: Vec::new(),
            rest: Vec::new(),
        }
    }

    /// Process actions the way the runtime would, without a driver.
    fn run(&mut self, initial: Vec<AppAction>) {
        let mut pending = initial;
        while !pending.is_empty() {
            for action in std::mem::take(&mut pending) {
                match action {
                    AppAction::Render | AppAction::Quit => {},
                    AppAction::FetchChats
                    | AppAction::FetchHistory { .. }
                    | AppAction::CreateChat(_) => self.rest.push(action),
                    session_bound => {
                        let events = self.bridge.process_app_action(session_bound);
                        self.collect_session_output();
                        for event in events {
                            pending.extend(self.app.handle(event));
                        }
                    },
                }
            }
        }
    }

    fn notice(&mut self, notice: TransportNotice) {
        let events = self.bridge.handle_notice(notice);
        self.collect_session_output();
        for event in events {
            let actions = self.app.handle(event);
            self.run(actions);
        }
    }

    fn tick(&mut self) {
        let events = self.bridge.handle_tick();
        self.collect_session_output();
        for event in events {
            let actions = self.app.handle(event);
            self.run(actions);
        }
    }

    fn event(&mut self, event: AppEvent) {
        let actions = self.app.handle(event);
        self.run(actions);
    }

    fn collect_session_output(&mut self) {
        self.outgoing.extend(self.bridge.take_outgoing());
        self.bridge.take_link_commands();
    }

    fn drain_outgoing(&mut self) -> Vec<OutboundEvent> {
        std::mem::take(&mut self.outgoing)
    }

    /// Start the feature and bring the link up.
    fn online() -> Self {
        let mut harness = Self::new();
        let actions = harness.app.start();
        harness.run(actions);
        harness.notice(TransportNotice::Up);
        harness
    }
}

fn echo(id: &str, chat: &str, sender: &str, body: &str, client_ref: Option<&str>) -> InboundMessage {
    InboundMessage {
        id: Some(id.into()),
        chat_id: ChatId::new(chat),
        sender: SenderRef { id: UserId::new(sender), name: None },
        message: Some(MessageBody::Text(body.into())),
        kind: MessageKind::Text,
        created_at: None,
        from_self: Some(sender == "u1"),
        client_ref: client_ref.map(String::from),
    }
}

fn chat(id: &str) -> Chat {
    Chat {
        id: ChatId::new(id),
        name: Some(format!("chat {id}")),
        kind: ChatKind::Group,
        participants: Vec::new(),
        last_message: None,
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn fresh_session_scenario() {
    let mut harness = Harness::online();

    // add-user replayed on link up
    let events = harness.drain_outgoing();
    assert_eq!(events, vec![OutboundEvent::AddUser { user_id: UserId::new("u1") }]);

    // Chat list arrives, user opens c1
    harness.event(AppEvent::ChatsLoaded(vec![chat("c1")]));
    let actions = harness.app.open_chat(ChatId::new("c1"));
    harness.run(actions);

    assert!(
        harness
            .rest
            .iter()
            .any(|a| matches!(a, AppAction::FetchHistory { chat_id } if chat_id.0 == "c1"))
    );
    let events = harness.drain_outgoing();
    assert_eq!(events, vec![OutboundEvent::JoinChat { chat_id: ChatId::new("c1") }]);

    // Empty history: empty list, connected indicator on
    harness.event(AppEvent::HistoryLoaded { chat_id: ChatId::new("c1"), messages: vec![] });
    assert!(harness.app.messages().is_empty());
    assert!(matches!(harness.app.connection_state(), ConnectionState::Connected { .. }));
}

#[test]
fn round_trip_scenario() {
    let mut harness = Harness::online();
    let actions = harness.app.open_chat(ChatId::new("c1"));
    harness.run(actions);
    harness.event(AppEvent::HistoryLoaded { chat_id: ChatId::new("c1"), messages: vec![] });
    harness.drain_outgoing();

    // User types "hi": optimistic entry appears synchronously
    let actions = harness.app.send_message("hi");
    harness.run(actions);
    assert_eq!(harness.app.messages().len(), 1);
    assert!(harness.app.messages()[0].is_optimistic());
    let client_ref = harness.app.messages()[0].client_ref.clone().unwrap();

    // send-msg went out with the correlation id
    let events = harness.drain_outgoing();
    let [OutboundEvent::SendMsg(payload)] = events.as_slice() else {
        panic!("expected a single send-msg, got {events:?}");
    };
    assert_eq!(payload.chat_id.0, "c1");
    assert_eq!(payload.sender_id.0, "u1");
    assert_eq!(payload.message, "hi");
    assert_eq!(payload.client_ref.as_deref(), Some(client_ref.as_str()));

    // Server echo confirms the optimistic entry in place
    harness.notice(TransportNotice::Event(InboundEvent::MsgReceive(echo(
        "m1",
        "c1",
        "u1",
        "hi",
        Some(&client_ref),
    ))));

    let messages = harness.app.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id.as_deref(), Some("m1"));
    assert_eq!(messages[0].status, DeliveryStatus::Delivered);
    assert!(messages[0].from_self);
}

#[test]
fn duplicate_echoes_never_duplicate_the_entry() {
    let mut harness = Harness::online();
    let actions = harness.app.open_chat(ChatId::new("c1"));
    harness.run(actions);

    let inbound = echo("m1", "c1", "u2", "hello", None);
    for _ in 0..3 {
        harness.notice(TransportNotice::Event(InboundEvent::MsgReceive(inbound.clone())));
    }

    assert_eq!(harness.app.messages().len(), 1);
}

#[test]
fn room_switch_emits_one_leave_and_one_join() {
    let mut harness = Harness::online();
    let actions = harness.app.open_chat(ChatId::new("c1"));
    harness.run(actions);
    harness.drain_outgoing();

    let actions = harness.app.open_chat(ChatId::new("c2"));
    harness.run(actions);

    let events = harness.drain_outgoing();
    assert_eq!(events, vec![
        OutboundEvent::LeaveChat { chat_id: ChatId::new("c1") },
        OutboundEvent::JoinChat { chat_id: ChatId::new("c2") },
    ]);
    assert!(harness.app.messages().is_empty());
}

#[test]
fn malformed_wire_body_renders_a_placeholder() {
    let mut harness = Harness::online();
    let actions = harness.app.open_chat(ChatId::new("c1"));
    harness.run(actions);

    // Body is neither a string nor {text}; the event still decodes and the
    // entry shows a placeholder instead of vanishing
    let json = r#"{"event":"msg-recieve","data":{"_id":"m1","chatId":"c1","sender":{"_id":"u2"},"message":42}}"#;
    let event = InboundEvent::from_json(json).unwrap();
    harness.notice(TransportNotice::Event(event));

    let messages = harness.app.messages();
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].body.is_empty());
    assert_eq!(messages[0].body, homeroom_proto::UNSUPPORTED_BODY);
}

#[test]
fn reconnect_replays_identity_room_and_queued_sends() {
    let mut harness = Harness::online();
    let actions = harness.app.open_chat(ChatId::new("c1"));
    harness.run(actions);
    harness.drain_outgoing();

    // Link drops; a send made while down is queued, not lost
    harness.notice(TransportNotice::Down);
    assert!(matches!(harness.app.connection_state(), ConnectionState::Disconnected));

    let actions = harness.app.send_message("offline note");
    harness.run(actions);
    assert!(harness.drain_outgoing().is_empty());
    assert_eq!(harness.app.messages()[0].status, DeliveryStatus::Sending);

    // Reconnect: identity, room, then the queued send, in that order
    harness.notice(TransportNotice::Up);
    let events = harness.drain_outgoing();
    assert!(matches!(events[0], OutboundEvent::AddUser { .. }));
    assert!(matches!(&events[1], OutboundEvent::JoinChat { chat_id } if chat_id.0 == "c1"));
    assert!(matches!(&events[2], OutboundEvent::SendMsg(payload) if payload.message == "offline note"));
}

#[test]
fn unconfirmed_send_fails_visibly_and_can_be_retried() {
    let mut harness = Harness::online();
    let actions = harness.app.open_chat(ChatId::new("c1"));
    harness.run(actions);
    harness.drain_outgoing();

    let actions = harness.app.send_message("hi");
    harness.run(actions);
    let client_ref = harness.app.messages()[0].client_ref.clone().unwrap();
    harness.drain_outgoing();

    // No echo ever arrives
    harness.clock.advance(SEND_CONFIRM_TIMEOUT + Duration::from_secs(1));
    harness.tick();

    assert_eq!(harness.app.messages()[0].status, DeliveryStatus::Failed);
    assert!(harness.app.status_message().unwrap().contains("failed"));

    // Retry reuses the correlation id
    let actions = harness.app.retry_last_failed();
    harness.run(actions);
    assert_eq!(harness.app.messages()[0].status, DeliveryStatus::Sending);

    let events = harness.drain_outgoing();
    let [OutboundEvent::SendMsg(payload)] = events.as_slice() else {
        panic!("expected a single send-msg, got {events:?}");
    };
    assert_eq!(payload.client_ref.as_deref(), Some(client_ref.as_str()));

    // The retried send confirms normally
    harness.notice(TransportNotice::Event(InboundEvent::MsgReceive(echo(
        "m1",
        "c1",
        "u1",
        "hi",
        Some(&client_ref),
    ))));
    assert_eq!(harness.app.messages()[0].status, DeliveryStatus::Delivered);
    assert_eq!(harness.app.messages().len(), 1);
}

#[test]
fn messages_for_inactive_chats_update_the_summary_only() {
    let mut harness = Harness::online();
    harness.event(AppEvent::ChatsLoaded(vec![chat("c1"), chat("c2")]));
    let actions = harness.app.open_chat(ChatId::new("c1"));
    harness.run(actions);

    harness.notice(TransportNotice::Event(InboundEvent::MsgReceive(echo(
        "m9", "c2", "u2", "psst", None,
    ))));

    assert!(harness.app.messages().is_empty());
    let summary = harness.app.chats()[1].last_message.as_ref().unwrap();
    assert_eq!(summary.text, "psst");
}
