//! Fan-out of observer events to connected event streams.
//!
//! Each observer is represented by the sending half of an unbounded
//! channel; the HTTP layer drains the receiving half into the response
//! body. Dropping a sender ends that observer's stream once the frames
//! already queued have been written.

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::event::ObserverEvent;

/// Opaque handle identifying one registered observer.
pub type ObserverId = u64;

/// Sending half used to push encoded frames to one observer.
pub type ObserverSender = mpsc::UnboundedSender<Bytes>;

/// Current set of connected observers.
#[derive(Debug, Default)]
pub struct BroadcastRegistry {
    next_id: ObserverId,
    channels: Vec<(ObserverId, ObserverSender)>,
}

impl BroadcastRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer channel and return its handle.
    pub fn register(&mut self, tx: ObserverSender) -> ObserverId {
        self.next_id += 1;
        let id = self.next_id;
        self.channels.push((id, tx));
        debug!(observer = id, observers = self.channels.len(), "observer registered");
        id
    }

    /// Remove an observer. Removing an unknown handle is a no-op.
    ///
    /// Returns `true` when the observer was still registered.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.channels.len();
        self.channels.retain(|(existing, _)| *existing != id);
        let removed = self.channels.len() != before;
        if removed {
            debug!(observer = id, observers = self.channels.len(), "observer unregistered");
        }
        removed
    }

    /// Push `event` to every observer.
    ///
    /// Observers whose stream has gone away are dropped silently; delivery
    /// to the rest continues. Returns the number of observers reached.
    pub fn broadcast(&mut self, event: &ObserverEvent) -> usize {
        let frame = event.frame();
        self.channels.retain(|(id, tx)| {
            let delivered = tx.send(frame.clone()).is_ok();
            if !delivered {
                debug!(observer = id, event = event.name(), "dropping disconnected observer");
            }
            delivered
        });
        self.channels.len()
    }

    /// Close every observer stream and empty the registry.
    ///
    /// Returns the number of observers that were closed.
    pub fn close_all(&mut self) -> usize {
        let closed = self.channels.len();
        self.channels.clear();
        closed
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
