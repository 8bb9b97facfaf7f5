//! # Statecast
//!
//! Keeps a slice of application state identical across replicas of the same
//! application by broadcasting it over a named channel.
//!
//! ## Overview
//!
//! Every replica that opens a session on the same channel name is a peer.
//! Local changes are broadcast as timestamped snapshots; inbound snapshots
//! are shallow-merged into the local state under a last-writer-wins rule.
//!
//! - **Bootstrap**: A joining replica asks its peers for their current state
//! - **Suppression**: First, duplicate, and echoed broadcasts are not sent
//! - **Staleness**: Updates older than the last accepted one are rejected
//! - **Inert fallback**: Without a usable medium, sessions silently do nothing
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use statecast::{load_config, connect, Capability, MemoryMedium, MemoryState, Snapshot};
//!
//! let medium = MemoryMedium::new();
//! let config = load_config(r#"{ "channel": "preferences" }"#).unwrap();
//! let host = MemoryState::new(Snapshot::new().with("theme", "dark"));
//!
//! let mut session = connect(host, config, Capability::interactive(Arc::new(medium))).unwrap();
//! session.commit(|state| state.set("theme", "light"));
//! ```
//!
//! ## Re-exports
//!
//! - `statecast::core` - Snapshots, the message protocol, clocks
//! - `statecast::sync` - Transports, sessions, and the sync engines
//!
//! Hosts bridging sessions onto their own medium can use [`decode_message`]
//! to validate received frames.

pub mod config;
pub mod error;
pub mod wire;

// Re-export component crates
pub use statecast_core as core;
pub use statecast_sync as sync;

pub use config::{connect, load_config};
pub use error::{Result, StatecastError};
pub use wire::decode_message;

// Re-export commonly used types
pub use statecast_core::{
    Clock, ManualClock, MemoryState, Message, MessageType, ProtocolError, Snapshot, StateHost,
    SystemClock, UpdateMessage,
};
pub use statecast_sync::{
    BroadcastOutcome, Capability, ChannelSession, ExecutionContext, InboundOutcome,
    MemoryMedium, Medium, SessionPhase, SyncConfig, SyncError, SyncHooks, SyncOptions,
    Transport,
};
