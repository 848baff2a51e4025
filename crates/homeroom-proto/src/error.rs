//! Protocol error type.

use thiserror::Error;

/// Errors from encoding or decoding wire payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload could not be decoded as a known event.
    #[error("failed to decode event: {reason}")]
    Decode {
        /// Decoder diagnostic.
        reason: String,
    },

    /// Event could not be encoded.
    #[error("failed to encode event: {reason}")]
    Encode {
        /// Encoder diagnostic.
        reason: String,
    },
}
