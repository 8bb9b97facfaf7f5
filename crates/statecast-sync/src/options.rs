//! Session configuration: policy flags, projections, interceptors, and hooks.
//!
//! Hooks are purely observational. Nothing they do feeds back into the
//! engines' control flow.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use statecast_core::Snapshot;

use crate::guard::ExecutionContext;
use crate::inbound::MessageError;
use crate::transport::{Medium, RawEvent};

/// Projects the full state onto the part that is synchronized.
pub type SelectFn = Arc<dyn Fn(&Snapshot) -> Snapshot + Send + Sync>;
/// Turns a raw inbound event into the message value to interpret.
pub type MessageInterceptor = Arc<dyn Fn(&RawEvent) -> Value + Send + Sync>;
/// Rewrites a selected snapshot before it is sent.
pub type BroadcastInterceptor = Arc<dyn Fn(Snapshot) -> Snapshot + Send + Sync>;

pub type StubHook = Arc<dyn Fn(ExecutionContext, Option<&dyn Medium>) + Send + Sync>;
pub type MessageErrorHook = Arc<dyn Fn(&MessageError) + Send + Sync>;
pub type SnapshotHook = Arc<dyn Fn(&Snapshot) + Send + Sync>;
pub type SkipOlderHook = Arc<dyn Fn(&SkippedOlder) + Send + Sync>;

/// Payload of the skipped-stale hook.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOlder {
    /// Timestamp of the most recent accepted update.
    pub watermark: u64,
    /// Timestamp of the rejected update or broadcast.
    pub time: u64,
    /// The state that was not applied or not sent.
    pub state: Snapshot,
}

/// Plain, serializable session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Channel name. Replicas on the same name are peers.
    pub channel: String,
    /// Send a state request when the session opens.
    #[serde(default = "default_true")]
    pub request_state: bool,
    /// Suppress the first outbound evaluation.
    #[serde(default = "default_true")]
    pub skip_first: bool,
    /// Reject updates older than the watermark.
    #[serde(default = "default_true")]
    pub skip_older: bool,
}

fn default_true() -> bool {
    true
}

impl SyncConfig {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            request_state: true,
            skip_first: true,
            skip_older: true,
        }
    }
}

/// Observability hooks. Every hook defaults to a no-op.
#[derive(Clone)]
pub struct SyncHooks {
    /// The guard fell back to the inert implementation.
    pub on_stub_implementation: StubHook,
    /// An inbound message was invalid or could not be decoded.
    pub on_message_error: MessageErrorHook,
    /// The first outbound evaluation was suppressed.
    pub on_skip_first_broadcast: SnapshotHook,
    /// An outbound evaluation matched the last synced snapshot.
    pub on_skip_duplicated_broadcast: SnapshotHook,
    /// An update or broadcast was older than the watermark.
    pub on_skip_older: SkipOlderHook,
}

fn noop_stub(_: ExecutionContext, _: Option<&dyn Medium>) {}
fn noop_message_error(_: &MessageError) {}
fn noop_snapshot(_: &Snapshot) {}
fn noop_skip_older(_: &SkippedOlder) {}

impl Default for SyncHooks {
    fn default() -> Self {
        Self {
            on_stub_implementation: Arc::new(noop_stub),
            on_message_error: Arc::new(noop_message_error),
            on_skip_first_broadcast: Arc::new(noop_snapshot),
            on_skip_duplicated_broadcast: Arc::new(noop_snapshot),
            on_skip_older: Arc::new(noop_skip_older),
        }
    }
}

impl SyncHooks {
    /// Hooks that report every signal through `tracing`.
    pub fn traced(channel: impl Into<String>) -> Self {
        let channel: Arc<str> = Arc::from(channel.into());
        let (c1, c2, c3, c4, c5) = (
            channel.clone(),
            channel.clone(),
            channel.clone(),
            channel.clone(),
            channel,
        );

        Self {
            on_stub_implementation: Arc::new(
                move |context: ExecutionContext, medium: Option<&dyn Medium>| {
                    tracing::warn!(
                        channel = %c1,
                        ?context,
                        medium = medium.is_some(),
                        "broadcast unavailable, using inert implementation"
                    );
                },
            ),
            on_message_error: Arc::new(move |error: &MessageError| {
                tracing::warn!(channel = %c2, %error, "rejected inbound message");
            }),
            on_skip_first_broadcast: Arc::new(move |state: &Snapshot| {
                tracing::debug!(channel = %c3, keys = state.len(), "skipped first broadcast");
            }),
            on_skip_duplicated_broadcast: Arc::new(move |state: &Snapshot| {
                tracing::debug!(channel = %c4, keys = state.len(), "skipped duplicated broadcast");
            }),
            on_skip_older: Arc::new(move |skipped: &SkippedOlder| {
                tracing::debug!(
                    channel = %c5,
                    watermark = skipped.watermark,
                    time = skipped.time,
                    "skipped older state"
                );
            }),
        }
    }

    pub fn on_stub_implementation(
        mut self,
        hook: impl Fn(ExecutionContext, Option<&dyn Medium>) + Send + Sync + 'static,
    ) -> Self {
        self.on_stub_implementation = Arc::new(hook);
        self
    }

    pub fn on_message_error(mut self, hook: impl Fn(&MessageError) + Send + Sync + 'static) -> Self {
        self.on_message_error = Arc::new(hook);
        self
    }

    pub fn on_skip_first_broadcast(
        mut self,
        hook: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) -> Self {
        self.on_skip_first_broadcast = Arc::new(hook);
        self
    }

    pub fn on_skip_duplicated_broadcast(
        mut self,
        hook: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) -> Self {
        self.on_skip_duplicated_broadcast = Arc::new(hook);
        self
    }

    pub fn on_skip_older(mut self, hook: impl Fn(&SkippedOlder) + Send + Sync + 'static) -> Self {
        self.on_skip_older = Arc::new(hook);
        self
    }
}

impl fmt::Debug for SyncHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHooks").finish_non_exhaustive()
    }
}

/// Complete, immutable configuration for one channel session.
#[derive(Clone)]
pub struct SyncOptions {
    pub config: SyncConfig,
    pub select: SelectFn,
    pub message_interceptor: MessageInterceptor,
    pub broadcast_interceptor: BroadcastInterceptor,
    pub hooks: SyncHooks,
}

impl SyncOptions {
    /// Default options for `channel`.
    pub fn new(channel: impl Into<String>) -> Self {
        Self::from_config(SyncConfig::new(channel))
    }

    pub fn from_config(config: SyncConfig) -> Self {
        Self {
            config,
            select: Arc::new(|state: &Snapshot| state.clone()),
            message_interceptor: Arc::new(|event: &RawEvent| event.data.clone()),
            broadcast_interceptor: Arc::new(|state: Snapshot| state),
            hooks: SyncHooks::default(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    pub fn request_state(mut self, enabled: bool) -> Self {
        self.config.request_state = enabled;
        self
    }

    pub fn skip_first(mut self, enabled: bool) -> Self {
        self.config.skip_first = enabled;
        self
    }

    pub fn skip_older(mut self, enabled: bool) -> Self {
        self.config.skip_older = enabled;
        self
    }

    pub fn with_select(mut self, select: impl Fn(&Snapshot) -> Snapshot + Send + Sync + 'static) -> Self {
        self.select = Arc::new(select);
        self
    }

    pub fn with_message_interceptor(
        mut self,
        interceptor: impl Fn(&RawEvent) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.message_interceptor = Arc::new(interceptor);
        self
    }

    pub fn with_broadcast_interceptor(
        mut self,
        interceptor: impl Fn(Snapshot) -> Snapshot + Send + Sync + 'static,
    ) -> Self {
        self.broadcast_interceptor = Arc::new(interceptor);
        self
    }

    pub fn with_hooks(mut self, hooks: SyncHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

impl From<&str> for SyncOptions {
    fn from(channel: &str) -> Self {
        Self::new(channel)
    }
}

impl From<String> for SyncOptions {
    fn from(channel: String) -> Self {
        Self::new(channel)
    }
}

impl From<SyncConfig> for SyncOptions {
    fn from(config: SyncConfig) -> Self {
        Self::from_config(config)
    }
}

impl fmt::Debug for SyncOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
