//! Outbound sync engine: decides whether and what to broadcast.
//!
//! Evaluation order for a non-forced broadcast:
//!
//! 1. Select the snapshot from the current state
//! 2. Suppress the first evaluation (if armed)
//! 3. Suppress a snapshot equal to the last synced one
//! 4. Apply the broadcast interceptor
//! 5. Stamp with the clock; suppress if older than the watermark
//! 6. Record and send
//!
//! A forced broadcast skips steps 2, 3, and 5.

use statecast_core::{is_stale, Message, Snapshot, UpdateMessage};

use crate::options::SkippedOlder;
use crate::state::SyncContext;

/// What a broadcast evaluation did.
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastOutcome {
    /// An update was posted.
    Sent(UpdateMessage),
    /// Suppressed as the first evaluation since the session opened.
    SkippedFirst,
    /// Suppressed because it matched the last synced snapshot.
    SkippedDuplicate,
    /// Suppressed because the local clock reads behind the watermark.
    SkippedOlder { watermark: u64, time: u64 },
    /// State was recorded but the transport refused the post.
    PostFailed(String),
    /// No live transport; nothing evaluated.
    Inert,
}

impl BroadcastOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, BroadcastOutcome::Sent(_))
    }
}

/// Evaluate the current state for broadcast.
///
/// `current` is the full host state; the configured selection is applied here.
pub fn broadcast_state(cx: &mut SyncContext<'_>, current: &Snapshot, force: bool) -> BroadcastOutcome {
    let options = cx.options;
    let hooks = &options.hooks;
    let snapshot = (options.select)(current);

    if !force && cx.state.first_pending {
        cx.state.first_pending = false;
        tracing::debug!(channel = cx.channel(), "first broadcast skipped");
        (hooks.on_skip_first_broadcast)(&snapshot);
        return BroadcastOutcome::SkippedFirst;
    }

    if !force && cx.state.last_synced.as_ref() == Some(&snapshot) {
        tracing::trace!(channel = cx.channel(), "duplicated broadcast skipped");
        (hooks.on_skip_duplicated_broadcast)(&snapshot);
        return BroadcastOutcome::SkippedDuplicate;
    }

    let payload = (options.broadcast_interceptor)(snapshot);
    let time = cx.clock.now_ms();
    let watermark = cx.state.watermark;

    if !force && is_stale(time, watermark, options.config.skip_older) {
        tracing::debug!(channel = cx.channel(), watermark, time, "older broadcast skipped");
        (hooks.on_skip_older)(&SkippedOlder {
            watermark,
            time,
            state: payload,
        });
        return BroadcastOutcome::SkippedOlder { watermark, time };
    }

    cx.state.last_synced = Some(payload.clone());
    cx.state.watermark = time;

    let update = UpdateMessage {
        time,
        state: payload,
    };
    match cx.transport.post(&Message::Update(update.clone())) {
        Ok(()) => {
            tracing::debug!(channel = cx.channel(), time, force, "state broadcast");
            BroadcastOutcome::Sent(update)
        }
        Err(e) => {
            tracing::warn!(channel = cx.channel(), error = %e, "failed to post state update");
            BroadcastOutcome::PostFailed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use statecast_core::ManualClock;

    use crate::options::{SyncHooks, SyncOptions};
    use crate::state::SessionState;
    use crate::transport::memory::MemoryMedium;
    use crate::transport::{Medium, Transport, TransportEvent};

    struct Harness {
        state: SessionState,
        options: SyncOptions,
        clock: ManualClock,
        transport: Box<dyn Transport>,
        peer: Box<dyn Transport>,
    }

    impl Harness {
        fn new(options: SyncOptions) -> Self {
            let medium = MemoryMedium::new();
            Self {
                state: SessionState::new(options.config.skip_first),
                transport: medium.open(options.channel()).unwrap(),
                peer: medium.open(options.channel()).unwrap(),
                clock: ManualClock::new(1_000),
                options,
            }
        }

        fn broadcast(&mut self, current: &Snapshot, force: bool) -> BroadcastOutcome {
            let mut cx = SyncContext {
                state: &mut self.state,
                options: &self.options,
                clock: &self.clock,
                transport: &*self.transport,
            };
            broadcast_state(&mut cx, current, force)
        }

        fn received(&mut self) -> Vec<serde_json::Value> {
            let mut out = Vec::new();
            while let Some(event) = self.peer.try_recv() {
                if let TransportEvent::Message(raw) = event {
                    out.push(raw.data);
                }
            }
            out
        }
    }

    fn state(value: serde_json::Value) -> Snapshot {
        Snapshot::from_value(value).unwrap()
    }

    #[test]
    fn test_first_evaluation_is_skipped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hooks = SyncHooks::default()
            .on_skip_first_broadcast(move |s: &Snapshot| sink.lock().unwrap().push(s.clone()));
        let mut h = Harness::new(SyncOptions::new("chan").with_hooks(hooks));
        let initial = state(json!({ "a": null, "b": null }));

        assert_eq!(h.broadcast(&initial, false), BroadcastOutcome::SkippedFirst);
        assert!(!h.state.is_first_broadcast());
        assert!(h.received().is_empty());
        assert_eq!(*seen.lock().unwrap(), vec![initial]);
    }

    #[test]
    fn test_second_identical_evaluation_is_duplicate() {
        let dupes = Arc::new(Mutex::new(0));
        let counter = dupes.clone();
        let hooks = SyncHooks::default()
            .on_skip_duplicated_broadcast(move |_: &Snapshot| *counter.lock().unwrap() += 1);
        let mut h = Harness::new(SyncOptions::new("chan").skip_first(false).with_hooks(hooks));
        let current = state(json!({ "a": "x" }));

        assert!(h.broadcast(&current, false).is_sent());
        assert_eq!(h.broadcast(&current, false), BroadcastOutcome::SkippedDuplicate);

        assert_eq!(h.received().len(), 1);
        assert_eq!(*dupes.lock().unwrap(), 1);
    }

    #[test]
    fn test_sent_update_records_state_and_watermark() {
        let mut h = Harness::new(SyncOptions::new("chan").skip_first(false));
        h.clock.set(5_000);
        let current = state(json!({ "a": "a", "b": null }));

        let outcome = h.broadcast(&current, false);

        assert_eq!(
            outcome,
            BroadcastOutcome::Sent(UpdateMessage {
                time: 5_000,
                state: current.clone()
            })
        );
        assert_eq!(h.state.last_synced(), Some(&current));
        assert_eq!(h.state.watermark(), 5_000);
        assert_eq!(
            h.received(),
            vec![json!({ "type": "UPDATE_STATE", "time": 5_000, "state": { "a": "a", "b": null } })]
        );
    }

    #[test]
    fn test_clock_behind_watermark_is_skipped() {
        let skipped = Arc::new(Mutex::new(Vec::new()));
        let sink = skipped.clone();
        let hooks = SyncHooks::default()
            .on_skip_older(move |s: &SkippedOlder| sink.lock().unwrap().push(s.clone()));
        let mut h = Harness::new(SyncOptions::new("chan").skip_first(false).with_hooks(hooks));
        h.state.watermark = 2_000;
        h.clock.set(1_500);
        let current = state(json!({ "a": 1 }));

        assert_eq!(
            h.broadcast(&current, false),
            BroadcastOutcome::SkippedOlder {
                watermark: 2_000,
                time: 1_500
            }
        );
        assert!(h.received().is_empty());
        assert_eq!(h.state.watermark(), 2_000);
        assert_eq!(
            *skipped.lock().unwrap(),
            vec![SkippedOlder {
                watermark: 2_000,
                time: 1_500,
                state: current
            }]
        );
    }

    #[test]
    fn test_clock_behind_watermark_sends_when_skip_older_disabled() {
        let mut h = Harness::new(SyncOptions::new("chan").skip_first(false).skip_older(false));
        h.state.watermark = 2_000;
        h.clock.set(1_500);

        assert!(h.broadcast(&state(json!({ "a": 1 })), false).is_sent());
        assert_eq!(h.state.watermark(), 1_500);
    }

    #[test]
    fn test_force_bypasses_all_suppression() {
        let mut h = Harness::new(SyncOptions::new("chan"));
        let current = state(json!({ "a": 1 }));
        h.state.last_synced = Some(current.clone());
        h.state.watermark = 9_999;

        assert!(h.broadcast(&current, true).is_sent());
        assert!(h.broadcast(&current, true).is_sent());

        // The first-broadcast flag is untouched by forced sends.
        assert!(h.state.is_first_broadcast());
        assert_eq!(h.received().len(), 2);
    }

    #[test]
    fn test_select_and_interceptor_shape_payload() {
        let options = SyncOptions::new("chan")
            .skip_first(false)
            .with_select(|s: &Snapshot| s.pick(["user"]))
            .with_broadcast_interceptor(|s: Snapshot| s.with("user", "override"));
        let mut h = Harness::new(options);
        let current = state(json!({ "user": "me", "secret": "hidden" }));

        h.broadcast(&current, false);

        assert_eq!(
            h.received(),
            vec![json!({ "type": "UPDATE_STATE", "time": 1_000, "state": { "user": "override" } })]
        );
        assert_eq!(h.state.last_synced(), Some(&state(json!({ "user": "override" }))));
    }

    #[test]
    fn test_duplicate_check_uses_pre_interceptor_snapshot() {
        // The recorded payload is post-interceptor, so a rewriting interceptor
        // never matches and every evaluation is sent.
        let options = SyncOptions::new("chan")
            .skip_first(false)
            .with_broadcast_interceptor(|s: Snapshot| s.with("stamp", true));
        let mut h = Harness::new(options);
        let current = state(json!({ "a": 1 }));

        assert!(h.broadcast(&current, false).is_sent());
        assert!(h.broadcast(&current, false).is_sent());
    }

    #[test]
    fn test_post_failure_is_reported_not_raised() {
        let mut h = Harness::new(SyncOptions::new("chan").skip_first(false));
        h.transport.close();

        let outcome = h.broadcast(&state(json!({ "a": 1 })), false);

        assert!(matches!(outcome, BroadcastOutcome::PostFailed(_)));
    }
}
