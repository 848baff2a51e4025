//! Wire vocabulary and data model for the Homeroom chat protocol.
//!
//! The chat server speaks JSON: socket events ride as text frames shaped
//! `{"event": "<name>", "data": ...}`, and the REST endpoints exchange the
//! same chat and message shapes. This crate owns those shapes and nothing
//! else — no I/O, no state.
//!
//! # Components
//!
//! - [`Chat`], [`Participant`]: conversation entities from the REST API
//! - [`InboundMessage`], [`MessageBody`]: broadcast message payloads with
//!   tolerant body normalization
//! - [`OutboundEvent`], [`InboundEvent`]: the socket event vocabulary
//! - [`rest`]: request/response bodies for the chat REST endpoints
//!
//! Event names match the production server verbatim, including the
//! `msg-recieve` misspelling — it is the actual wire name.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod chat;
mod error;
mod event;
mod message;
pub mod rest;

pub use chat::{Chat, ChatId, ChatKind, LastMessage, Participant, UserId};
pub use error::ProtocolError;
pub use event::{InboundEvent, OutboundEvent, SendMsg};
pub use message::{InboundMessage, MessageBody, MessageKind, SenderRef, UNSUPPORTED_BODY};
