//! Session error type.

use thiserror::Error;

/// Errors from session state machine operations.
///
/// These signal caller misuse. Runtime conditions (link down, unconfirmed
/// sends) are never errors — they surface as [`crate::SessionAction`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A send was attempted before an identity was registered. The server
    /// cannot route messages for an anonymous connection.
    #[error("no identity registered for this session")]
    NotRegistered,
}
