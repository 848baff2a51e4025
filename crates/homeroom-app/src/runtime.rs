//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI-facing state machine
//! - [`Bridge`]: session bridge
//! - [`Driver`]: platform-specific I/O

use homeroom_client::Clock;

use crate::{App, AppAction, AppEvent, Bridge, Driver, LinkCommand, UserIntent};

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `C`: Clock driving the session's timeout housekeeping
pub struct Runtime<D, C>
where
    D: Driver,
    C: Clock,
{
    driver: D,
    app: App,
    bridge: Bridge<C>,
}

impl<D, C> Runtime<D, C>
where
    D: Driver,
    C: Clock,
{
    /// Create a new runtime.
    pub fn new(driver: D, app: App, bridge: Bridge<C>) -> Self {
        Self { driver, app, bridge }
    }

    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;

        let actions = self.app.start();
        if !self.process_actions(actions).await? {
            loop {
                if self.process_cycle().await? {
                    break;
                }
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        if let Some(intent) = self.driver.poll_event().await? {
            let actions = self.apply_intent(intent);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }

        if let Some(notice) = self.driver.recv_notice().await {
            let events = self.bridge.handle_notice(notice);
            self.flush_session_output().await?;
            if self.process_events(events).await? {
                return Ok(true);
            }
        }

        let events = self.bridge.handle_tick();
        self.flush_session_output().await?;
        if self.process_events(events).await? {
            return Ok(true);
        }

        Ok(false)
    }

    /// Translate a user intent into App API calls.
    fn apply_intent(&mut self, intent: UserIntent) -> Vec<AppAction> {
        match intent {
            UserIntent::OpenChat(chat_id) => self.app.open_chat(chat_id),
            UserIntent::SendText(body) => self.app.send_message(body),
            UserIntent::RetryLastFailed => self.app.retry_last_failed(),
            UserIntent::NewChat(request) => self.app.create_chat(request),
            UserIntent::RefreshChats => self.app.refresh_chats(),
            UserIntent::Quit => self.app.close(),
        }
    }

    /// Process events from the Bridge back through the App.
    async fn process_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Process actions returned by the App, including any follow-up actions
    /// produced by the events they trigger.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;
        let mut should_quit = false;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => should_quit = true,

                    // Session operations go through the bridge
                    AppAction::Connect
                    | AppAction::Disconnect
                    | AppAction::Register { .. }
                    | AppAction::JoinChat { .. }
                    | AppAction::LeaveChat { .. }
                    | AppAction::SendMessage { .. } => {
                        let events = self.bridge.process_app_action(action);
                        self.flush_session_output().await?;
                        for event in events {
                            pending_actions.extend(self.app.handle(event));
                        }
                    },

                    // REST operations go straight to the driver; failures
                    // surface inline, the user retries manually
                    AppAction::FetchChats => {
                        let event = match self.driver.fetch_chats().await {
                            Ok(chats) => AppEvent::ChatsLoaded(chats),
                            Err(e) => AppEvent::Error { message: e.to_string() },
                        };
                        pending_actions.extend(self.app.handle(event));
                    },
                    AppAction::FetchHistory { chat_id } => {
                        let user_id = self.app.user().id.clone();
                        let event = match self.driver.fetch_history(&chat_id, &user_id).await {
                            Ok(messages) => AppEvent::HistoryLoaded { chat_id, messages },
                            Err(e) => AppEvent::Error { message: e.to_string() },
                        };
                        pending_actions.extend(self.app.handle(event));
                    },
                    AppAction::CreateChat(request) => {
                        let event = match self.driver.create_chat(&request).await {
                            Ok(chat) => AppEvent::ChatCreated(chat),
                            Err(e) => AppEvent::Error { message: e.to_string() },
                        };
                        pending_actions.extend(self.app.handle(event));
                    },
                }
            }
        }

        Ok(should_quit)
    }

    /// Execute the session's buffered link commands and outgoing events.
    async fn flush_session_output(&mut self) -> Result<(), D::Error> {
        for command in self.bridge.take_link_commands() {
            match command {
                LinkCommand::Start { url } => self.driver.connect_link(&url).await?,
                LinkCommand::Stop => self.driver.close_link(),
            }
        }

        for event in self.bridge.take_outgoing() {
            self.driver.send_event(event).await?;
        }

        Ok(())
    }

    /// The App state (for inspection by frontends).
    pub fn app(&self) -> &App {
        &self.app
    }
}
