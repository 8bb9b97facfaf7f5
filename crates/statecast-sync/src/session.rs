//! Channel session: one replica's binding to a channel, for its lifetime.
//!
//! ```text
//! Uninitialized --open()--> Open --close()--> Closed
//!       |                                       ^
//!       +--open(), guard fails--> Inert --------+
//! ```
//!
//! The session owns the host state, the transport, and the session state.
//! Every engine operation runs to completion on the caller's thread; inbound
//! events are only processed when the host pumps them.

use std::sync::Arc;

use statecast_core::{Clock, StateHost, SystemClock, UpdateMessage};

use crate::bootstrap::{self, JoinOutcome};
use crate::error::{Result, SyncError};
use crate::guard::{can_broadcast, Capability};
use crate::inbound::{self, InboundOutcome};
use crate::options::SyncOptions;
use crate::outbound::{self, BroadcastOutcome};
use crate::state::{SessionState, SyncContext};
use crate::transport::{Transport, TransportEvent};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Uninitialized,
    Open,
    /// The guard failed; every operation is a no-op.
    Inert,
    Closed,
}

/// A replica's synchronization session on one channel.
pub struct ChannelSession<H: StateHost> {
    host: H,
    options: SyncOptions,
    capability: Capability,
    clock: Arc<dyn Clock>,
    state: SessionState,
    transport: Option<Box<dyn Transport>>,
    phase: SessionPhase,
}

impl<H: StateHost> ChannelSession<H> {
    /// Create an unopened session.
    pub fn new(host: H, options: impl Into<SyncOptions>, capability: Capability) -> Self {
        let options = options.into();
        Self {
            host,
            state: SessionState::new(options.config.skip_first),
            options,
            capability,
            clock: Arc::new(SystemClock),
            transport: None,
            phase: SessionPhase::Uninitialized,
        }
    }

    /// Create and open a session in one step.
    pub fn connect(host: H, options: impl Into<SyncOptions>, capability: Capability) -> Result<Self> {
        let mut session = Self::new(host, options, capability);
        session.open()?;
        Ok(session)
    }

    /// Replace the clock used to stamp updates. Only meaningful before `open`.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Open the transport and run the join sequence.
    ///
    /// Returns `None` when the session is already open or the guard installed
    /// the inert implementation. Only a medium that refuses the binding is an
    /// error.
    pub fn open(&mut self) -> Result<Option<JoinOutcome>> {
        match self.phase {
            SessionPhase::Open | SessionPhase::Inert => return Ok(None),
            SessionPhase::Closed => {
                return Err(SyncError::SessionClosed(self.options.channel().to_string()))
            }
            SessionPhase::Uninitialized => {}
        }

        let medium = match &self.capability.medium {
            Some(medium) if can_broadcast(&self.capability) => medium.clone(),
            _ => {
                self.phase = SessionPhase::Inert;
                tracing::info!(
                    channel = self.options.channel(),
                    context = ?self.capability.context,
                    "broadcast unavailable, session is inert"
                );
                (self.options.hooks.on_stub_implementation)(
                    self.capability.context,
                    self.capability.medium.as_deref(),
                );
                return Ok(None);
            }
        };

        self.transport = Some(medium.open(self.options.channel())?);
        self.phase = SessionPhase::Open;
        tracing::info!(channel = self.options.channel(), "session opened");

        let current = self.host.current_state();
        let outcome = self
            .context()
            .map(|(mut cx, _)| bootstrap::join(&mut cx, &current));
        Ok(outcome)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == SessionPhase::Open
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn session_state(&self) -> &SessionState {
        &self.state
    }

    /// The live transport, or `None` when inert, unopened, or closed.
    pub fn transport(&self) -> Option<&dyn Transport> {
        self.transport.as_deref()
    }

    /// Evaluate local state for broadcast. `force` bypasses every suppression check.
    pub fn broadcast_state(&mut self, force: bool) -> BroadcastOutcome {
        let Some((mut cx, host)) = self.context() else {
            return BroadcastOutcome::Inert;
        };
        let current = host.current_state();
        outbound::broadcast_state(&mut cx, &current, force)
    }

    /// Ask peers for their current state.
    pub fn request_state(&mut self) -> bool {
        let Some((mut cx, host)) = self.context() else {
            return false;
        };
        let current = host.current_state();
        bootstrap::request_state(&mut cx, &current)
    }

    /// Apply a state update as if it had arrived from a peer.
    pub fn apply_update(&mut self, update: UpdateMessage) -> InboundOutcome {
        let Some((mut cx, host)) = self.context() else {
            return InboundOutcome::Ignored;
        };
        let outcome = inbound::apply_update(&mut cx, host, update);
        self.after_inbound(&outcome);
        outcome
    }

    /// Mutate local state, then notify the sync layer of the commit.
    pub fn commit(&mut self, mutate: impl FnOnce(&mut H)) -> BroadcastOutcome {
        mutate(&mut self.host);
        self.state_committed()
    }

    /// Notify the sync layer that local state changed outside [`commit`](Self::commit).
    pub fn state_committed(&mut self) -> BroadcastOutcome {
        self.broadcast_state(false)
    }

    /// Handle one transport event.
    ///
    /// Events handed in after the session left `Open` are ignored.
    pub fn handle_event(&mut self, event: TransportEvent) -> InboundOutcome {
        let Some((mut cx, host)) = self.context() else {
            return InboundOutcome::Ignored;
        };
        let outcome = inbound::on_event(&mut cx, host, event);
        self.after_inbound(&outcome);
        outcome
    }

    /// Process every event already waiting on the transport.
    pub fn pump(&mut self) -> Vec<InboundOutcome> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.transport.as_mut().and_then(|t| t.try_recv()) {
            outcomes.push(self.handle_event(event));
        }
        outcomes
    }

    /// Wait for the next event and process it.
    ///
    /// Returns `None` when the session is not open or the transport closed.
    pub async fn next_event(&mut self) -> Option<InboundOutcome> {
        let event = self.transport.as_mut()?.recv().await?;
        Some(self.handle_event(event))
    }

    /// Release the transport. Idempotent.
    pub fn close(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.phase = SessionPhase::Closed;
        tracing::info!(channel = self.options.channel(), "session closed");
    }

    /// An accepted update is a committed mutation like any other.
    fn after_inbound(&mut self, outcome: &InboundOutcome) {
        if matches!(outcome, InboundOutcome::Applied { .. }) {
            self.state_committed();
        }
    }

    fn context(&mut self) -> Option<(SyncContext<'_>, &mut H)> {
        if self.phase != SessionPhase::Open {
            return None;
        }
        let transport = self.transport.as_deref()?;
        let cx = SyncContext {
            state: &mut self.state,
            options: &self.options,
            clock: &*self.clock,
            transport,
        };
        Some((cx, &mut self.host))
    }
}
