//! Session manager for the Homeroom chat protocol.
//!
//! # Architecture
//!
//! The session follows a Sans-IO, action-based pattern: it receives events
//! ([`SessionEvent`]), processes them through pure state machine logic, and
//! returns actions ([`SessionAction`]) for the caller to execute. No socket
//! I/O happens inside the state machine, which makes every lifecycle and
//! ordering rule testable without a server.
//!
//! The session owns the state that must survive transport loss: the
//! registered identity, the desired room set, the outbound queue, and the
//! pending-send registry. On every [`SessionEvent::TransportUp`] it replays
//! identity and room subscriptions and flushes queued sends, so a reconnect
//! is invisible to the layers above.
//!
//! # Components
//!
//! - [`Session`]: the state machine
//! - [`SessionEvent`] / [`SessionAction`]: its inputs and outputs
//! - [`Clock`]: monotonic time abstraction for deterministic tests
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::SocketHandle`]: a running WebSocket task with automatic
//!   reconnection, bridged over channels
//! - [`transport::spawn`]: start the socket task

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod clock;
mod error;
mod event;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use clock::{Clock, SystemClock, test_utils};
pub use error::SessionError;
pub use event::{SessionAction, SessionEvent, TransportNotice};
pub use session::{SEND_CONFIRM_TIMEOUT, Session};
