//! Terminal line driver.
//!
//! Implements [`Driver`] over stdin/stdout: commands come in as lines, and
//! the application state is printed as a compact text view. All
//! orchestration logic lives in the generic [`homeroom_app::Runtime`].

use std::{
    io::{self, Write},
    time::Duration,
};

use homeroom_app::{App, ConnectionState, DeliveryStatus, Driver, UserIntent};
use homeroom_client::{
    TransportNotice,
    transport::{self, SocketHandle, TransportError},
};
use homeroom_proto::{
    Chat, ChatId, ChatKind, InboundMessage, OutboundEvent, UserId,
    rest::{CreateChatRequest, PostMessageRequest},
};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::api::{ApiError, HttpApi};

/// How long a poll waits before yielding back to the runtime cycle.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Driver errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Terminal I/O failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// REST request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Socket task is gone.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Line-oriented driver over stdin/stdout.
pub struct LineDriver {
    api: HttpApi,
    user_id: UserId,
    socket: Option<SocketHandle>,
    lines: Lines<BufReader<Stdin>>,
    /// Chat ids as last rendered, backing the 1-based `/open <n>` command.
    chat_index: Vec<ChatId>,
    /// Active chat as last rendered, for the `/post` fallback command.
    active_chat: Option<ChatId>,
}

impl LineDriver {
    /// Create a driver for the given REST client and user.
    pub fn new(api: HttpApi, user_id: UserId) -> Self {
        Self {
            api,
            user_id,
            socket: None,
            lines: BufReader::new(tokio::io::stdin()).lines(),
            chat_index: Vec::new(),
            active_chat: None,
        }
    }

    fn print_line(&self, text: &str) -> Result<(), DriverError> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{text}")?;
        stdout.flush()?;
        Ok(())
    }

    /// Interpret one input line. Commands that the driver can satisfy by
    /// itself (help, the REST fallback) are handled here and yield no
    /// intent.
    async fn handle_line(&mut self, line: &str) -> Result<Option<UserIntent>, DriverError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        if let Some(rest) = line.strip_prefix("/open ") {
            let Some(chat_id) = rest
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| self.chat_index.get(i).cloned())
            else {
                self.print_line("usage: /open <chat number from /chats>")?;
                return Ok(None);
            };
            return Ok(Some(UserIntent::OpenChat(chat_id)));
        }

        if let Some(rest) = line.strip_prefix("/new ") {
            return Ok(self.parse_new(rest));
        }

        if let Some(rest) = line.strip_prefix("/post ") {
            self.post_fallback(rest).await?;
            return Ok(None);
        }

        match line {
            "/quit" => Ok(Some(UserIntent::Quit)),
            "/chats" => Ok(Some(UserIntent::RefreshChats)),
            "/retry" => Ok(Some(UserIntent::RetryLastFailed)),
            "/help" => {
                self.print_line(
                    "commands: /chats, /open <n>, /new <name> <id,id,...>, /retry, /post <text>, /quit; anything else sends a message",
                )?;
                Ok(None)
            },
            _ if line.starts_with('/') => {
                self.print_line("unknown command, try /help")?;
                Ok(None)
            },
            text => Ok(Some(UserIntent::SendText(text.to_string()))),
        }
    }

    fn parse_new(&self, rest: &str) -> Option<UserIntent> {
        let (name, ids) = rest.trim().rsplit_once(' ')?;
        let mut participant_ids: Vec<UserId> =
            ids.split(',').filter(|s| !s.is_empty()).map(UserId::new).collect();
        if participant_ids.is_empty() {
            return None;
        }
        participant_ids.insert(0, self.user_id.clone());

        Some(UserIntent::NewChat(CreateChatRequest {
            name: Some(name.to_string()),
            participant_ids,
            kind: ChatKind::Group,
        }))
    }

    /// `POST /messages/addmsg`: REST fallback delivery, used when the
    /// socket path is unavailable. The message will appear in history but
    /// is not echoed to this session.
    async fn post_fallback(&mut self, text: &str) -> Result<(), DriverError> {
        let Some(chat_id) = self.active_chat.clone() else {
            self.print_line("no chat selected")?;
            return Ok(());
        };

        let request = PostMessageRequest {
            chat_id,
            sender_id: self.user_id.clone(),
            message: text.to_string(),
        };
        match self.api.post_message(&request).await {
            Ok(()) => self.print_line("posted via REST fallback")?,
            Err(e) => self.print_line(&format!("fallback post failed: {e}"))?,
        }
        Ok(())
    }
}

impl Driver for LineDriver {
    type Error = DriverError;

    async fn poll_event(&mut self) -> Result<Option<UserIntent>, DriverError> {
        tokio::select! {
            line = self.lines.next_line() => match line? {
                Some(line) => self.handle_line(&line).await,
                // stdin closed
                None => Ok(Some(UserIntent::Quit)),
            },
            () = tokio::time::sleep(POLL_INTERVAL) => Ok(None),
        }
    }

    async fn connect_link(&mut self, url: &str) -> Result<(), DriverError> {
        if let Some(socket) = self.socket.take() {
            socket.stop();
        }
        self.socket = Some(transport::spawn(url));
        Ok(())
    }

    fn close_link(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.stop();
        }
    }

    async fn send_event(&mut self, event: OutboundEvent) -> Result<(), DriverError> {
        match &self.socket {
            Some(socket) => Ok(socket.send(event).await?),
            None => {
                tracing::warn!("no socket open, dropping outbound event");
                Ok(())
            },
        }
    }

    async fn recv_notice(&mut self) -> Option<TransportNotice> {
        let Some(socket) = self.socket.as_mut() else {
            tokio::time::sleep(POLL_INTERVAL).await;
            return None;
        };

        tokio::select! {
            notice = socket.from_server.recv() => notice,
            () = tokio::time::sleep(POLL_INTERVAL) => None,
        }
    }

    async fn fetch_chats(&mut self) -> Result<Vec<Chat>, DriverError> {
        Ok(self.api.fetch_chats().await?)
    }

    async fn fetch_history(
        &mut self,
        chat_id: &ChatId,
        user_id: &UserId,
    ) -> Result<Vec<InboundMessage>, DriverError> {
        Ok(self.api.fetch_history(chat_id, user_id).await?)
    }

    async fn create_chat(&mut self, request: &CreateChatRequest) -> Result<Chat, DriverError> {
        Ok(self.api.create_chat(request).await?)
    }

    fn render(&mut self, app: &App) -> Result<(), DriverError> {
        self.chat_index = app.chats().iter().map(|c| c.id.clone()).collect();
        self.active_chat = app.active_chat().cloned();

        let mut stdout = io::stdout().lock();

        let indicator = match app.connection_state() {
            ConnectionState::Connected { .. } => "online",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Disconnected => "offline",
        };
        writeln!(stdout, "-- [{indicator}] --")?;

        if let Some(status) = app.status_message() {
            writeln!(stdout, "   {status}")?;
        }

        let viewer = &app.user().id;
        for (index, chat) in app.chats().iter().enumerate() {
            let marker = if Some(&chat.id) == app.active_chat() { '*' } else { ' ' };
            let summary = chat
                .last_message
                .as_ref()
                .map(|m| format!("  | {}", m.text))
                .unwrap_or_default();
            writeln!(stdout, "{marker}{}. {}{summary}", index + 1, chat.display_name(viewer))?;
        }

        for message in app.messages() {
            let status = match message.status {
                DeliveryStatus::Sending => "sending",
                DeliveryStatus::Delivered => "ok",
                DeliveryStatus::Failed => "FAILED",
            };
            let sender = message.sender_name.clone().unwrap_or_else(|| message.sender_id.to_string());
            writeln!(stdout, "  [{status}] {sender}: {}", message.body)?;
        }

        stdout.flush()?;
        Ok(())
    }

    fn stop(&mut self) {
        self.close_link();
    }
}
