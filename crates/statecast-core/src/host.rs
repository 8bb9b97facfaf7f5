//! The host state container the sync layer reads from and patches.

use crate::snapshot::Snapshot;

/// Interface a replica's authoritative state container exposes.
///
/// The sync layer never mutates state except through [`apply_patch`](StateHost::apply_patch).
pub trait StateHost {
    /// The full current state.
    fn current_state(&self) -> Snapshot;

    /// Shallow-merge `patch` into the state, one top-level key at a time.
    fn apply_patch(&mut self, patch: &Snapshot);
}

/// A plain in-memory state container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    state: Snapshot,
    commits: u64,
}

impl MemoryState {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            state: initial,
            commits: 0,
        }
    }

    /// Borrow the current state.
    pub fn state(&self) -> &Snapshot {
        &self.state
    }

    /// Set a single top-level field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.state.insert(key, value);
        self.commits += 1;
    }

    /// Number of mutations committed so far, local or patched.
    pub fn commits(&self) -> u64 {
        self.commits
    }
}

impl StateHost for MemoryState {
    fn current_state(&self) -> Snapshot {
        self.state.clone()
    }

    fn apply_patch(&mut self, patch: &Snapshot) {
        self.state.merge(patch);
        self.commits += 1;
    }
}
