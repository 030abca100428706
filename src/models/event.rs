//! Observer events and their `text/event-stream` framing.
//!
//! Each event is written as `event: <name>\ndata: <json>\n\n`. Observers
//! parse this framing directly, so it is part of the wire contract.

use bytes::Bytes;
use tracing::warn;

use super::dump::Dump;

/// Payload carried by events without data of their own.
const EMPTY_PAYLOAD: &str = "{}";

/// An event pushed to connected observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    /// A recorded dump, live or replayed.
    Dump(Dump),
    /// History replay has finished for the receiving observer.
    Ready,
    /// The session detached; no further events follow.
    Stopped,
}

impl ObserverEvent {
    /// Event name as it appears on the `event:` line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dump(_) => "dump",
            Self::Ready => "ready",
            Self::Stopped => "stopped",
        }
    }

    /// JSON payload as it appears on the `data:` line.
    #[must_use]
    pub fn data(&self) -> String {
        match self {
            Self::Dump(dump) => serde_json::to_string(dump).unwrap_or_else(|err| {
                warn!(index = dump.index, %err, "failed to encode dump payload");
                EMPTY_PAYLOAD.to_owned()
            }),
            Self::Ready | Self::Stopped => EMPTY_PAYLOAD.to_owned(),
        }
    }

    /// Encode the complete frame, terminated by a blank line.
    #[must_use]
    pub fn frame(&self) -> Bytes {
        Bytes::from(format!("event: {}\ndata: {}\n\n", self.name(), self.data()))
    }
}
