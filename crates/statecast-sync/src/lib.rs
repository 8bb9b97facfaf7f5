//! # Statecast Sync
//!
//! Keeps independent in-memory replicas of the same state eventually
//! consistent by broadcasting state updates over a shared channel.
//!
//! ## Overview
//!
//! Each replica opens a [`ChannelSession`] on a named channel. Local commits
//! are evaluated by the outbound engine and may be broadcast as timestamped
//! updates; updates from peers are validated and patched into local state by
//! the inbound reconciler. A joining replica asks its peers for their state.
//!
//! ## Key Properties
//!
//! - **Last-write-wins**: Updates older than the newest accepted one are dropped
//! - **Echo-free**: An applied update is never re-broadcast by the receiver
//! - **Duplicate-free**: Re-committing unchanged state sends nothing
//! - **Non-fatal**: Invalid or undecodable messages are reported, never raised
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use statecast_core::{MemoryState, Snapshot};
//! use statecast_sync::{Capability, ChannelSession, MemoryMedium};
//!
//! let medium = MemoryMedium::new();
//! let capability = Capability::interactive(Arc::new(medium));
//!
//! let initial = Snapshot::new().with("count", 0);
//! let mut session = ChannelSession::connect(MemoryState::new(initial), "counter", capability)
//!     .expect("medium accepts binding");
//!
//! session.commit(|state| state.set("count", 1));
//! session.pump();
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Replica A (joining)                  Replica B
//!   |-------- REQUEST_STATE ---------->|
//!   |<------- UPDATE_STATE ------------|   forced answer
//!   |                                  |
//!   |  local commit                    |
//!   |-------- UPDATE_STATE ----------->|   patched, not echoed
//! ```

pub mod bootstrap;
pub mod error;
pub mod guard;
pub mod inbound;
pub mod options;
pub mod outbound;
pub mod session;
pub mod state;
pub mod transport;

pub use bootstrap::JoinOutcome;
pub use error::{Result, SyncError};
pub use guard::{can_broadcast, Capability, ExecutionContext};
pub use inbound::{InboundOutcome, MessageError};
pub use options::{SkippedOlder, SyncConfig, SyncHooks, SyncOptions};
pub use outbound::BroadcastOutcome;
pub use session::{ChannelSession, SessionPhase};
pub use state::{SessionState, SyncContext};
pub use transport::{
    memory::MemoryMedium, memory::MemoryTransport, DeliveryFailure, Medium, RawEvent, Transport,
    TransportEvent,
};
