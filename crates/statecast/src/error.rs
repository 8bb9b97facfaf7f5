//! Error types for the statecast facade.

use statecast_core::ProtocolError;
use statecast_sync::SyncError;
use thiserror::Error;

/// Errors surfaced by setup calls.
#[derive(Debug, Error)]
pub enum StatecastError {
    /// A wire value was rejected.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The medium or session refused an operation.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, StatecastError>;
