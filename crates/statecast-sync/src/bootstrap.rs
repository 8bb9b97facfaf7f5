//! Bootstrap coordinator: the join-time request/response handshake.
//!
//! ```text
//! Joining replica                     Peers
//!   |-------- REQUEST_STATE ---------->|
//!   |<------- UPDATE_STATE (forced) ---|   (one per peer, any order)
//! ```
//!
//! There is no timeout or retry. A join with no answers leaves the replica
//! with its own initial state.

use statecast_core::{Message, Snapshot};

use crate::outbound::{broadcast_state, BroadcastOutcome};
use crate::state::SyncContext;

/// What happened while joining a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// Whether a state request was posted.
    pub requested: bool,
    /// The initial outbound evaluation of local state.
    pub initial: BroadcastOutcome,
}

/// Ask peers for their state.
///
/// The current selection is recorded as last synced first, so the local
/// initial state is not re-announced as if it were new.
pub fn request_state(cx: &mut SyncContext<'_>, current: &Snapshot) -> bool {
    cx.state.last_synced = Some((cx.options.select)(current));

    match cx.transport.post(&Message::Request) {
        Ok(()) => {
            tracing::debug!(channel = cx.channel(), "requested state from peers");
            true
        }
        Err(e) => {
            tracing::warn!(channel = cx.channel(), error = %e, "failed to post state request");
            false
        }
    }
}

/// Run the join sequence on a freshly opened transport.
pub fn join(cx: &mut SyncContext<'_>, current: &Snapshot) -> JoinOutcome {
    let requested = cx.options.config.request_state && request_state(cx, current);
    // The state-change subscription evaluates once on install.
    let initial = broadcast_state(cx, current, false);

    JoinOutcome { requested, initial }
}
