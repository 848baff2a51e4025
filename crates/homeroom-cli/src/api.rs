//! REST client for the chat API.
//!
//! Thin wrapper over the four chat endpoints. Failures propagate as
//! [`ApiError`] and surface inline; there is no automatic retry — the user
//! retries by reissuing the command.

use homeroom_proto::{
    Chat, ChatId, InboundMessage, UserId,
    rest::{ChatResponse, ChatsResponse, CreateChatRequest, HistoryRequest, PostMessageRequest},
};
use thiserror::Error;

/// REST request errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport or status-level HTTP failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Chat REST API client.
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client for the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    /// `GET /chats`
    pub async fn fetch_chats(&self) -> Result<Vec<Chat>, ApiError> {
        let response: ChatsResponse = self
            .http
            .get(format!("{}/chats", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.chats)
    }

    /// `POST /chats`
    pub async fn create_chat(&self, request: &CreateChatRequest) -> Result<Chat, ApiError> {
        let response: ChatResponse = self
            .http
            .post(format!("{}/chats", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.chat)
    }

    /// `POST /messages/getmsg`
    pub async fn fetch_history(
        &self,
        chat_id: &ChatId,
        user_id: &UserId,
    ) -> Result<Vec<InboundMessage>, ApiError> {
        let request = HistoryRequest { chat_id: chat_id.clone(), user_id: user_id.clone() };
        let messages: Vec<InboundMessage> = self
            .http
            .post(format!("{}/messages/getmsg", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(messages)
    }

    /// `POST /messages/addmsg` — fallback delivery path when the socket is
    /// unavailable. The primary send path is the socket; a message posted
    /// here is not echoed to this session.
    pub async fn post_message(&self, request: &PostMessageRequest) -> Result<(), ApiError> {
        self.http
            .post(format!("{}/messages/addmsg", self.base_url))
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
