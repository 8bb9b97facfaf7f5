//! # Statecast Core
//!
//! Pure primitives for statecast: snapshots, wire messages, and the
//! validation rules every replica applies to what it receives.
//!
//! This crate contains no I/O and no transport. It is pure computation over
//! JSON-shaped state.
//!
//! ## Key Types
//!
//! - [`Snapshot`] - A projected, partial view of a replica's state
//! - [`Message`] - The two wire messages: a state request and a state update
//! - [`StateHost`] - The interface a host state container exposes to the sync layer
//! - [`Clock`] - Millisecond wall clock used to stamp updates
//!
//! ## Wire Format
//!
//! ```text
//! { "type": "REQUEST_STATE" }
//! { "type": "UPDATE_STATE", "time": <u64 ms>, "state": <object> }
//! ```

pub mod clock;
pub mod error;
pub mod host;
pub mod message;
pub mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ProtocolError, Result};
pub use host::{MemoryState, StateHost};
pub use message::{
    decode, decode_frame, encode_frame, is_stale, is_valid_update, Message, MessageType,
    UpdateMessage,
};
pub use snapshot::Snapshot;
