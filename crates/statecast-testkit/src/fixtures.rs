//! Test fixtures and helpers.
//!
//! Replicas that share one in-memory medium and one manual clock.

use std::sync::Arc;

use serde_json::Value;
use statecast_core::{ManualClock, MemoryState, Snapshot};
use statecast_sync::{
    BroadcastOutcome, Capability, ChannelSession, InboundOutcome, MemoryMedium, SessionPhase,
    SyncOptions,
};

use crate::recorder::{HookRecorder, Recorded};

/// Upper bound on pump rounds before [`TestNetwork::settle`] gives up.
pub const MAX_SETTLE_ROUNDS: usize = 64;

/// Build a snapshot from a JSON object literal.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn snapshot(value: Value) -> Snapshot {
    Snapshot::from_value(value).expect("snapshot fixtures must be JSON objects")
}

/// A set of replicas on one medium.
#[derive(Clone)]
pub struct TestNetwork {
    medium: MemoryMedium,
    clock: ManualClock,
}

impl TestNetwork {
    /// Create a network whose clock starts at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            medium: MemoryMedium::new(),
            clock: ManualClock::new(start_ms),
        }
    }

    pub fn medium(&self) -> &MemoryMedium {
        &self.medium
    }

    /// The clock shared by replicas created without their own.
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn capability(&self) -> Capability {
        Capability::interactive(Arc::new(self.medium.clone()))
    }

    /// An opened replica stamping with the shared clock.
    ///
    /// Takes a channel name for default options, or full [`SyncOptions`].
    pub fn replica(&self, options: impl Into<SyncOptions>, initial: Snapshot) -> TestReplica {
        self.build(options.into(), initial, self.clock.clone(), self.capability())
    }

    /// An opened replica with its own clock, for skew scenarios.
    pub fn replica_with_clock(
        &self,
        options: impl Into<SyncOptions>,
        initial: Snapshot,
        clock: ManualClock,
    ) -> TestReplica {
        self.build(options.into(), initial, clock, self.capability())
    }

    /// A replica whose guard fails, as in a server render pass.
    pub fn inert_replica(&self, options: impl Into<SyncOptions>, initial: Snapshot) -> TestReplica {
        let capability = Capability::server_render(Some(Arc::new(self.medium.clone())));
        self.build(options.into(), initial, self.clock.clone(), capability)
    }

    fn build(
        &self,
        options: SyncOptions,
        initial: Snapshot,
        clock: ManualClock,
        capability: Capability,
    ) -> TestReplica {
        let recorder = HookRecorder::new();
        let options = options.with_hooks(recorder.hooks());
        let mut session = ChannelSession::new(MemoryState::new(initial), options, capability)
            .with_clock(clock.clone());
        session
            .open()
            .expect("memory medium accepts non-empty channel names");

        TestReplica {
            session,
            recorder,
            clock,
        }
    }

    /// Pump every replica until a full round delivers nothing.
    ///
    /// Returns the number of events processed, or `None` if the replicas were
    /// still exchanging messages after [`MAX_SETTLE_ROUNDS`] rounds.
    pub fn settle(&self, replicas: &mut [&mut TestReplica]) -> Option<usize> {
        let mut total = 0;
        for _ in 0..MAX_SETTLE_ROUNDS {
            let processed: usize = replicas.iter_mut().map(|r| r.pump().len()).sum();
            if processed == 0 {
                return Some(total);
            }
            total += processed;
        }
        None
    }
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new(1_000)
    }
}

/// One replica: a session over [`MemoryState`] plus what its hooks saw.
pub struct TestReplica {
    pub session: ChannelSession<MemoryState>,
    pub recorder: HookRecorder,
    pub clock: ManualClock,
}

impl TestReplica {
    /// The replica's full current state.
    pub fn state(&self) -> &Snapshot {
        self.session.host().state()
    }

    /// Set one field and run outbound evaluation.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> BroadcastOutcome {
        self.session.commit(|host| host.set(key, value))
    }

    pub fn pump(&mut self) -> Vec<InboundOutcome> {
        self.session.pump()
    }

    pub fn recorded(&self) -> Recorded {
        self.recorder.recorded()
    }

    pub fn is_inert(&self) -> bool {
        self.session.phase() == SessionPhase::Inert
    }
}
