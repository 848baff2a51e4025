//! Application state machine.
//!
//! [`App`] manages the interactive state of the chat feature — the chat
//! list, the active chat, and the connection indicator — completely
//! decoupled from I/O. It consumes [`AppEvent`] inputs and produces
//! [`AppAction`] instructions for the runtime to execute.
//!
//! The active-chat transitions follow a fixed order. Opening chat Y while
//! X is active: leave X, clear the message list, fetch Y's history, join
//! Y. The list is therefore empty between the switch and the history
//! response, and the session is subscribed to exactly one room at a time —
//! a policy of this layer, not a limit of the session.

use homeroom_proto::{Chat, ChatId, LastMessage, Participant, rest::CreateChatRequest};

use crate::{
    AppAction, AppEvent,
    state::{ConnectionState, DeliveryStatus, MessageView},
    store::MessageStore,
};

/// Application state machine.
///
/// Pure state machine: no I/O dependencies, fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Connection state for UI feedback.
    connection: ConnectionState,
    /// The viewing user (sender summary for optimistic entries).
    user: Participant,
    /// Known chats, in server order.
    chats: Vec<Chat>,
    /// Currently active chat. `None` if no chat is selected.
    active: Option<ChatId>,
    /// Message list for the active chat.
    store: MessageStore,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
    /// Correlation id counter for locally authored messages.
    next_ref: u64,
}

impl App {
    /// Create a new App for the given viewing user.
    pub fn new(user: Participant) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            user,
            chats: Vec::new(),
            active: None,
            store: MessageStore::new(),
            status_message: None,
            next_ref: 0,
        }
    }

    /// Enter the chat feature: open the session, register the identity,
    /// and load the chat list.
    pub fn start(&mut self) -> Vec<AppAction> {
        self.connection = ConnectionState::Connecting;
        vec![
            AppAction::Connect,
            AppAction::Register { user_id: self.user.id.clone() },
            AppAction::FetchChats,
            AppAction::Render,
        ]
    }

    /// Leave the chat feature: unsubscribe, tear the session down, quit.
    pub fn close(&mut self) -> Vec<AppAction> {
        let mut actions = Vec::new();
        if let Some(chat_id) = self.active.take() {
            actions.push(AppAction::LeaveChat { chat_id });
        }
        self.store.clear();
        actions.push(AppAction::Disconnect);
        actions.push(AppAction::Quit);
        actions
    }

    /// Make `chat_id` the active chat.
    pub fn open_chat(&mut self, chat_id: ChatId) -> Vec<AppAction> {
        if self.active.as_ref() == Some(&chat_id) {
            return vec![];
        }

        let mut actions = Vec::new();
        if let Some(previous) = self.active.replace(chat_id.clone()) {
            actions.push(AppAction::LeaveChat { chat_id: previous });
        }

        self.store.clear();
        actions.push(AppAction::FetchHistory { chat_id: chat_id.clone() });
        actions.push(AppAction::JoinChat { chat_id });
        actions.push(AppAction::Render);
        actions
    }

    /// Send a message to the active chat. The optimistic entry is inserted
    /// synchronously; the input field can be cleared immediately regardless
    /// of network outcome.
    pub fn send_message(&mut self, body: impl Into<String>) -> Vec<AppAction> {
        let Some(chat_id) = self.active.clone() else {
            self.status_message = Some("no chat selected".to_string());
            return vec![AppAction::Render];
        };

        let body = body.into();
        self.next_ref += 1;
        let client_ref = format!("tmp-{}", self.next_ref);

        self.store.push_optimistic(MessageView {
            id: None,
            client_ref: Some(client_ref.clone()),
            sender_id: self.user.id.clone(),
            sender_name: Some(self.user.name.clone()),
            body: body.clone(),
            from_self: true,
            kind: homeroom_proto::MessageKind::Text,
            status: DeliveryStatus::Sending,
            sent_at: None,
        });

        vec![
            AppAction::SendMessage {
                chat_id,
                sender_id: self.user.id.clone(),
                body,
                client_ref,
            },
            AppAction::Render,
        ]
    }

    /// Retry a failed send, reusing its correlation id so a late echo of
    /// the original attempt still reconciles.
    pub fn retry_message(&mut self, client_ref: &str) -> Vec<AppAction> {
        let Some(chat_id) = self.active.clone() else {
            return vec![];
        };
        let Some(body) = self.store.begin_retry(client_ref) else {
            self.status_message = Some(format!("nothing to retry for {client_ref}"));
            return vec![AppAction::Render];
        };

        vec![
            AppAction::SendMessage {
                chat_id,
                sender_id: self.user.id.clone(),
                body,
                client_ref: client_ref.to_string(),
            },
            AppAction::Render,
        ]
    }

    /// Retry the most recent failed send, if any.
    pub fn retry_last_failed(&mut self) -> Vec<AppAction> {
        let Some(client_ref) = self
            .store
            .last_failed()
            .and_then(|m| m.client_ref.clone())
        else {
            self.status_message = Some("no failed message to retry".to_string());
            return vec![AppAction::Render];
        };
        self.retry_message(&client_ref)
    }

    /// Create a chat via the REST API.
    pub fn create_chat(&mut self, request: CreateChatRequest) -> Vec<AppAction> {
        self.status_message = Some("creating chat...".to_string());
        vec![AppAction::CreateChat(request), AppAction::Render]
    }

    /// Reload the chat list.
    pub fn refresh_chats(&self) -> Vec<AppAction> {
        vec![AppAction::FetchChats, AppAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Connected => {
                self.connection = ConnectionState::Connected { user_id: self.user.id.clone() };
                vec![AppAction::Render]
            },
            AppEvent::Disconnected => {
                self.connection = ConnectionState::Disconnected;
                vec![AppAction::Render]
            },
            AppEvent::ChatsLoaded(chats) => {
                self.chats = chats;
                vec![AppAction::Render]
            },
            AppEvent::ChatCreated(chat) => {
                self.status_message = Some(format!("created {}", chat.display_name(&self.user.id)));
                self.chats.push(chat);
                vec![AppAction::Render]
            },
            AppEvent::HistoryLoaded { chat_id, messages } => {
                // A stale response for a chat we already left is ignored
                if self.active.as_ref() == Some(&chat_id) {
                    self.store.set_history(&messages, &self.user.id);
                }
                vec![AppAction::Render]
            },
            AppEvent::MessageReceived(message) => {
                self.update_last_message(&message);
                if self.active.as_ref() == Some(&message.chat_id) {
                    self.store.reconcile(&message, &self.user.id);
                }
                vec![AppAction::Render]
            },
            AppEvent::MessageFailed { chat_id, client_ref } => {
                if self.active.as_ref() == Some(&chat_id) && self.store.mark_failed(&client_ref) {
                    self.status_message = Some("message failed to send, use /retry".to_string());
                }
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Refresh a chat's last-message summary and bump its update time.
    fn update_last_message(&mut self, message: &homeroom_proto::InboundMessage) {
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == message.chat_id) {
            chat.last_message = Some(LastMessage {
                text: message.body_text().to_string(),
                sender_id: message.sender.id.clone(),
                sent_at: message.created_at,
            });
            if message.created_at.is_some() {
                chat.updated_at = message.created_at;
            }
        }
    }

    /// Current connection state.
    pub fn connection_state(&self) -> &ConnectionState {
        &self.connection
    }

    /// The viewing user.
    pub fn user(&self) -> &Participant {
        &self.user
    }

    /// Known chats.
    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    /// Currently active chat. `None` if no chat is selected.
    pub fn active_chat(&self) -> Option<&ChatId> {
        self.active.as_ref()
    }

    /// Message list for the active chat.
    pub fn messages(&self) -> &[MessageView] {
        self.store.messages()
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
