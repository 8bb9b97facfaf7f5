//! Inbound reconciler: decides whether and how to apply what peers send.
//!
//! Nothing here is fatal. Invalid, stale, and undecodable messages leave
//! local state untouched and are reported through hooks.

use std::fmt;

use statecast_core::{decode, is_stale, Message, ProtocolError, StateHost, UpdateMessage};

use crate::options::SkippedOlder;
use crate::outbound::{broadcast_state, BroadcastOutcome};
use crate::state::SyncContext;
use crate::transport::{DeliveryFailure, RawEvent, TransportEvent};

/// Payload of the message-error hook.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageError {
    /// The event decoded, but is not a recognized, well-formed message.
    Invalid { event: RawEvent, reason: ProtocolError },
    /// The frame could not be decoded at all.
    Undeliverable(DeliveryFailure),
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::Invalid { event, reason } => {
                write!(f, "invalid message on {:?}: {}", event.channel, reason)
            }
            MessageError::Undeliverable(failure) => {
                write!(f, "undeliverable frame on {:?}: {}", failure.channel, failure.reason)
            }
        }
    }
}

/// What handling an inbound event did.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundOutcome {
    /// A peer asked for state; this is the forced broadcast that answered it.
    Answered(BroadcastOutcome),
    /// An update was accepted and patched into local state.
    Applied { time: u64 },
    /// An update older than the watermark was dropped.
    SkippedOlder { watermark: u64, time: u64 },
    /// The message was invalid or of an unknown type.
    Rejected(ProtocolError),
    /// The frame could not be decoded.
    Undeliverable,
    /// The session is not open; the event was not processed.
    Ignored,
}

/// Handle one event delivered by the transport.
pub fn on_event<H: StateHost>(
    cx: &mut SyncContext<'_>,
    host: &mut H,
    event: TransportEvent,
) -> InboundOutcome {
    match event {
        TransportEvent::Message(raw) => on_message(cx, host, raw),
        TransportEvent::DeliveryFailure(failure) => {
            tracing::warn!(channel = cx.channel(), reason = %failure.reason, "undeliverable frame");
            (cx.options.hooks.on_message_error)(&MessageError::Undeliverable(failure));
            InboundOutcome::Undeliverable
        }
    }
}

/// Interpret and act on a decoded event.
pub fn on_message<H: StateHost>(
    cx: &mut SyncContext<'_>,
    host: &mut H,
    raw: RawEvent,
) -> InboundOutcome {
    let value = (cx.options.message_interceptor)(&raw);
    let decoded = decode(&value);
    if let Ok(message) = &decoded {
        tracing::trace!(channel = cx.channel(), kind = %message.message_type(), "received message");
    }

    match decoded {
        Ok(Message::Request) => {
            tracing::debug!(channel = cx.channel(), "answering state request");
            let current = host.current_state();
            InboundOutcome::Answered(broadcast_state(cx, &current, true))
        }
        Ok(Message::Update(update)) => apply_update(cx, host, update),
        Err(reason) => {
            tracing::warn!(channel = cx.channel(), %reason, "invalid message");
            (cx.options.hooks.on_message_error)(&MessageError::Invalid {
                event: raw,
                reason: reason.clone(),
            });
            InboundOutcome::Rejected(reason)
        }
    }
}

/// Apply a validated update, subject to the staleness policy.
///
/// The last synced snapshot is recorded before the host is patched, so the
/// outbound evaluation triggered by the patch sees a duplicate and the update
/// is not echoed back.
pub fn apply_update<H: StateHost>(
    cx: &mut SyncContext<'_>,
    host: &mut H,
    update: UpdateMessage,
) -> InboundOutcome {
    let UpdateMessage { time, state } = update;
    let watermark = cx.state.watermark;

    if is_stale(time, watermark, cx.options.config.skip_older) {
        tracing::debug!(channel = cx.channel(), watermark, time, "older update skipped");
        (cx.options.hooks.on_skip_older)(&SkippedOlder {
            watermark,
            time,
            state,
        });
        return InboundOutcome::SkippedOlder { watermark, time };
    }

    cx.state.watermark = time;
    cx.state.last_synced = Some(state.clone());
    host.apply_patch(&state);

    tracing::debug!(channel = cx.channel(), time, keys = state.len(), "update applied");
    InboundOutcome::Applied { time }
}
