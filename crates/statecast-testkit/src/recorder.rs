//! Hooks that record what they observe.

use std::sync::{Arc, Mutex, PoisonError};

use statecast_core::Snapshot;
use statecast_sync::{ExecutionContext, Medium, MessageError, SkippedOlder, SyncHooks};

/// Everything the hooks have seen so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recorded {
    /// Guard fallbacks: the context, and whether a medium was present.
    pub stub_implementations: Vec<(ExecutionContext, bool)>,
    pub message_errors: Vec<MessageError>,
    pub skipped_first: Vec<Snapshot>,
    pub skipped_duplicates: Vec<Snapshot>,
    pub skipped_older: Vec<SkippedOlder>,
}

/// A shareable recorder. Clones record into the same log.
#[derive(Debug, Clone, Default)]
pub struct HookRecorder {
    inner: Arc<Mutex<Recorded>>,
}

impl HookRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook set that records into this recorder.
    pub fn hooks(&self) -> SyncHooks {
        let (r1, r2, r3, r4, r5) = (
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
        );

        SyncHooks::default()
            .on_stub_implementation(move |context: ExecutionContext, medium: Option<&dyn Medium>| {
                r1.with(|r| r.stub_implementations.push((context, medium.is_some())));
            })
            .on_message_error(move |error: &MessageError| {
                r2.with(|r| r.message_errors.push(error.clone()));
            })
            .on_skip_first_broadcast(move |state: &Snapshot| {
                r3.with(|r| r.skipped_first.push(state.clone()));
            })
            .on_skip_duplicated_broadcast(move |state: &Snapshot| {
                r4.with(|r| r.skipped_duplicates.push(state.clone()));
            })
            .on_skip_older(move |skipped: &SkippedOlder| {
                r5.with(|r| r.skipped_older.push(skipped.clone()));
            })
    }

    /// Copy of everything recorded so far.
    pub fn recorded(&self) -> Recorded {
        self.with(|r| r.clone())
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.with(|r| *r = Recorded::default());
    }

    fn with<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
