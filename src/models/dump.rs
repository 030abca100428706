//! Dump model: one recorded checkpoint in formatted form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable, indexed snapshot of a checkpoint's values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dump {
    /// 1-based position in the history of the current listener.
    pub index: u64,
    /// Capture instant.
    #[serde(serialize_with = "super::serialize_millis")]
    pub timestamp: DateTime<Utc>,
    /// Text produced by the value formatter.
    pub content: String,
}

impl Dump {
    /// Construct a dump record.
    #[must_use]
    pub fn new(index: u64, timestamp: DateTime<Utc>, content: String) -> Self {
        Self {
            index,
            timestamp,
            content,
        }
    }
}
