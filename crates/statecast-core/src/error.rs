//! Error types for the statecast core.

use thiserror::Error;

/// Reasons a wire value is rejected by the message protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("message has no string \"type\" tag")]
    MissingType,

    #[error("unknown message type {0:?}")]
    UnknownType(String),

    #[error("update time must be a non-negative number")]
    InvalidTime,

    #[error("update state must be a non-null object")]
    InvalidState,

    #[error("message could not be encoded: {0}")]
    Encoding(String),

    #[error("frame could not be decoded: {0}")]
    MalformedFrame(String),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
