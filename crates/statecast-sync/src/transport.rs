//! Transport abstraction for the broadcast medium.
//!
//! A [`Medium`] opens one [`Transport`] per channel binding. Posting delivers
//! a message to every other binding on the same channel name; bindings on
//! other names never see it. Delivery order across senders is not guaranteed.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use statecast_core::{Message, ProtocolError};

use crate::error::Result;

/// A message as it arrived, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Channel the event was delivered on.
    pub channel: String,
    /// The decoded payload. Untrusted.
    pub data: Value,
}

/// A frame that arrived but could not be decoded at all.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryFailure {
    pub channel: String,
    pub frame: Bytes,
    pub reason: ProtocolError,
}

/// Events a transport hands to its session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Message(RawEvent),
    DeliveryFailure(DeliveryFailure),
}

impl TransportEvent {
    /// Decode a raw frame into an event for `channel`.
    pub fn from_frame(channel: &str, frame: Bytes) -> Self {
        match statecast_core::decode_frame(&frame) {
            Ok(data) => TransportEvent::Message(RawEvent {
                channel: channel.to_string(),
                data,
            }),
            Err(reason) => TransportEvent::DeliveryFailure(DeliveryFailure {
                channel: channel.to_string(),
                frame,
                reason,
            }),
        }
    }
}

/// A broadcast medium that can bind transports to channel names.
pub trait Medium: Send + Sync {
    /// Open a binding to `channel`.
    fn open(&self, channel: &str) -> Result<Box<dyn Transport>>;
}

/// One open binding to a channel on a medium.
///
/// Owned exclusively by a single session.
#[async_trait]
pub trait Transport: Send {
    /// The channel name this binding was opened on.
    fn channel(&self) -> &str;

    /// Broadcast a message to every other binding on the channel.
    fn post(&self, message: &Message) -> Result<()>;

    /// Take the next pending event without waiting.
    fn try_recv(&mut self) -> Option<TransportEvent>;

    /// Wait for the next event.
    ///
    /// Returns `None` once the binding is closed.
    async fn recv(&mut self) -> Option<TransportEvent>;

    /// Release the binding. Idempotent.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// A process-local broadcast medium for tests and same-process replicas.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, PoisonError, RwLock};
    use tokio::sync::mpsc;

    use crate::error::SyncError;

    /// Frames a binding may hold before further frames to it are dropped.
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// A subscriber's inbox on one channel.
    struct Subscriber {
        id: u64,
        sender: mpsc::Sender<Bytes>,
    }

    #[derive(Default)]
    struct MediumInner {
        next_id: u64,
        channels: HashMap<String, Vec<Subscriber>>,
    }

    /// Shared medium. Clones are handles to the same medium.
    ///
    /// Each binding has a bounded inbox. A binding that is never drained
    /// loses frames once its inbox is full; other bindings are unaffected.
    /// A poisoned lock is recovered, never reported.
    #[derive(Clone)]
    pub struct MemoryMedium {
        inner: Arc<RwLock<MediumInner>>,
        capacity: usize,
    }

    impl Default for MemoryMedium {
        fn default() -> Self {
            Self::with_capacity(DEFAULT_CAPACITY)
        }
    }

    impl MemoryMedium {
        /// Create a new, empty medium.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a medium whose bindings each buffer at most `capacity` frames.
        pub fn with_capacity(capacity: usize) -> Self {
            Self {
                inner: Arc::default(),
                capacity: capacity.max(1),
            }
        }

        /// Number of open bindings on `channel`.
        pub fn subscriber_count(&self, channel: &str) -> usize {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            inner.channels.get(channel).map_or(0, Vec::len)
        }

        /// Deliver an arbitrary frame to every binding on `channel`.
        ///
        /// Returns the number of bindings it reached.
        pub fn inject_frame(&self, channel: &str, frame: impl Into<Bytes>) -> usize {
            self.publish(channel, None, frame.into())
        }

        fn publish(&self, channel: &str, from: Option<u64>, frame: Bytes) -> usize {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            let Some(subscribers) = inner.channels.get(channel) else {
                return 0;
            };

            let mut delivered = 0;
            for subscriber in subscribers {
                if Some(subscriber.id) == from {
                    continue;
                }
                match subscriber.sender.try_send(frame.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(channel, binding = subscriber.id, "inbox full, frame dropped");
                    }
                    // The binding went away.
                    Err(mpsc::error::TrySendError::Closed(_)) => {}
                }
            }
            delivered
        }

        fn unsubscribe(&self, channel: &str, id: u64) {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(subscribers) = inner.channels.get_mut(channel) {
                subscribers.retain(|s| s.id != id);
                if subscribers.is_empty() {
                    inner.channels.remove(channel);
                }
            }
        }
    }

    impl Medium for MemoryMedium {
        fn open(&self, channel: &str) -> Result<Box<dyn Transport>> {
            if channel.is_empty() {
                return Err(SyncError::InvalidChannel(channel.to_string()));
            }

            let (tx, rx) = mpsc::channel(self.capacity);
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner
                .channels
                .entry(channel.to_string())
                .or_default()
                .push(Subscriber { id, sender: tx });

            tracing::debug!(channel, binding = id, "opened memory transport");

            Ok(Box::new(MemoryTransport {
                id,
                channel: channel.to_string(),
                medium: self.clone(),
                receiver: rx,
                closed: false,
            }))
        }
    }

    /// A binding to one channel of a [`MemoryMedium`].
    pub struct MemoryTransport {
        id: u64,
        channel: String,
        medium: MemoryMedium,
        receiver: mpsc::Receiver<Bytes>,
        closed: bool,
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        fn channel(&self) -> &str {
            &self.channel
        }

        fn post(&self, message: &Message) -> Result<()> {
            if self.closed {
                return Err(SyncError::TransportClosed(self.channel.clone()));
            }
            let frame = statecast_core::encode_frame(message)?;
            self.medium.publish(&self.channel, Some(self.id), frame);
            Ok(())
        }

        fn try_recv(&mut self) -> Option<TransportEvent> {
            if self.closed {
                return None;
            }
            let frame = self.receiver.try_recv().ok()?;
            Some(TransportEvent::from_frame(&self.channel, frame))
        }

        async fn recv(&mut self) -> Option<TransportEvent> {
            if self.closed {
                return None;
            }
            let frame = self.receiver.recv().await?;
            Some(TransportEvent::from_frame(&self.channel, frame))
        }

        fn close(&mut self) {
            if self.closed {
                return;
            }
            self.closed = true;
            self.medium.unsubscribe(&self.channel, self.id);
            self.receiver.close();
            tracing::debug!(channel = %self.channel, binding = self.id, "closed memory transport");
        }

        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    impl Drop for MemoryTransport {
        fn drop(&mut self) {
            self.close();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_poisoned_lock_is_recovered() {
            let medium = MemoryMedium::new();
            let held = medium.clone();
            let poisoned = std::thread::spawn(move || {
                let _guard = held.inner.write().unwrap();
                panic!("poison the medium lock");
            })
            .join();
            assert!(poisoned.is_err());
            assert!(medium.inner.is_poisoned());

            let a = medium.open("chan").unwrap();
            let mut b = medium.open("chan").unwrap();
            assert_eq!(medium.subscriber_count("chan"), 2);

            a.post(&Message::Request).unwrap();
            assert!(b.try_recv().is_some());
        }
    }
}
