//! Error types for the sync module.
//!
//! None of these escape the reconciliation engines: inbound problems are
//! reported through hooks, and post failures become outcomes. Errors are only
//! returned from explicit setup calls.

use thiserror::Error;

use statecast_core::ProtocolError;

/// Errors that can occur during sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The transport has already been closed.
    #[error("transport closed for channel {0:?}")]
    TransportClosed(String),

    /// Channel names must be non-empty.
    #[error("invalid channel name: {0:?}")]
    InvalidChannel(String),

    /// A message could not be framed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The session was closed and cannot be reopened.
    #[error("session for channel {0:?} is closed")]
    SessionClosed(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
