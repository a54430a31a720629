//! Event bus for session change distribution.
//!
//! A broadcast channel fans each [`SessionsChanged`] delta out to every
//! subscriber (host bridge, status UI, tests). Producers hold an
//! [`EventSender`]; consumers hold their own [`EventReceiver`] and get their
//! own copy of every event.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::SessionsChanged;

/// Default channel capacity for the event bus.
const DEFAULT_CAPACITY: usize = 64;

/// Central hub for session change events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionsChanged>,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new event bus with custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Get a sender for emitting events.
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Subscribe to receive events emitted after this call.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Emitting half of the bus; cheaply cloneable.
#[derive(Clone)]
pub struct EventSender {
    sender: broadcast::Sender<SessionsChanged>,
}

impl EventSender {
    /// Emit a session delta.
    ///
    /// Returns the number of receivers; 0 when no one is listening, which is
    /// not an error.
    pub fn emit(&self, event: SessionsChanged) -> usize {
        let summary = event.summary();
        match self.sender.send(event) {
            Ok(count) => {
                debug!(receivers = count, "[EventBus] Emitted session delta ({summary})");
                count
            }
            Err(_) => {
                debug!("[EventBus] No receivers for session delta ({summary})");
                0
            }
        }
    }
}

/// Receiving half of the bus.
pub struct EventReceiver {
    receiver: broadcast::Receiver<SessionsChanged>,
}

impl EventReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` once the channel closes. Lag is tolerated: skipped
    /// events are logged and reception continues.
    pub async fn recv(&mut self) -> Option<SessionsChanged> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped_events = skipped, "[EventBus] Receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("[EventBus] Channel closed");
                    return None;
                }
            }
        }
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&mut self) -> Option<SessionsChanged> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped_events = skipped, "[EventBus] Receiver lagged on try_recv");
                self.receiver.try_recv().ok()
            }
            Err(_) => None,
        }
    }
}
