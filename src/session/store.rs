//! Append-only, in-memory dump history.

use chrono::{DateTime, Utc};

use crate::models::dump::Dump;

/// Ordered history of dumps for one listener lifetime.
///
/// Indices are contiguous from 1 and assigned at append time.
#[derive(Debug, Default)]
pub struct DumpStore {
    dumps: Vec<Dump>,
}

impl DumpStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `content` as the next dump and return a copy of it.
    pub fn append(&mut self, content: String, timestamp: DateTime<Utc>) -> Dump {
        let index = self.dumps.len() as u64 + 1;
        let dump = Dump::new(index, timestamp, content);
        self.dumps.push(dump.clone());
        dump
    }

    /// All dumps, oldest first.
    #[must_use]
    pub fn all(&self) -> &[Dump] {
        &self.dumps
    }

    /// Number of recorded dumps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dumps.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dumps.is_empty()
    }

    /// Drop the whole history; the next append starts again at index 1.
    pub fn clear(&mut self) {
        self.dumps.clear();
    }
}
