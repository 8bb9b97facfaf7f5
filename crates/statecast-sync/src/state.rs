//! Per-session synchronization state.
//!
//! Owned by exactly one channel session and mutated only by its outbound and
//! inbound engines. None of it is authoritative application state.

use statecast_core::{Clock, Snapshot};

use crate::options::SyncOptions;
use crate::transport::Transport;

/// Bookkeeping used to suppress echoes, duplicates, and stale updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Most recent snapshot this replica sent or accepted.
    pub(crate) last_synced: Option<Snapshot>,
    /// Timestamp of the most recent accepted update, local or remote.
    pub(crate) watermark: u64,
    /// True until the first non-forced outbound evaluation has been suppressed.
    pub(crate) first_pending: bool,
}

impl SessionState {
    /// Fresh state. `skip_first` arms first-broadcast suppression.
    pub fn new(skip_first: bool) -> Self {
        Self {
            last_synced: None,
            watermark: 0,
            first_pending: skip_first,
        }
    }

    pub fn last_synced(&self) -> Option<&Snapshot> {
        self.last_synced.as_ref()
    }

    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    /// Whether the next non-forced evaluation will be suppressed as the first.
    pub fn is_first_broadcast(&self) -> bool {
        self.first_pending
    }
}

/// Everything an engine operation reads or writes, borrowed from the session.
pub struct SyncContext<'a> {
    pub state: &'a mut SessionState,
    pub options: &'a SyncOptions,
    pub clock: &'a dyn Clock,
    pub transport: &'a dyn Transport,
}

impl SyncContext<'_> {
    pub fn channel(&self) -> &str {
        self.options.channel()
    }
}
