//! Named value sets handed to a checkpoint.

use std::fmt::Debug;

use serde::Serialize;
use tracing::warn;

/// One captured value.
#[derive(Debug, Clone, PartialEq)]
pub enum Captured {
    /// Structured value captured through `serde`.
    Json(serde_json::Value),
    /// Pre-rendered text, emitted verbatim by formatters.
    Text(String),
}

/// Ordered mapping of name to captured value.
///
/// Insertion order is preserved. Inserting a name that is already present
/// replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    entries: Vec<(String, Captured)>,
}

impl Snapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `value` through its `Serialize` implementation.
    ///
    /// A value that fails to serialize is recorded as a placeholder string.
    #[must_use]
    pub fn with<T>(mut self, name: impl Into<String>, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        let name = name.into();
        let captured = match serde_json::to_value(value) {
            Ok(json) => Captured::Json(json),
            Err(err) => {
                warn!(name = %name, %err, "value could not be serialized");
                Captured::Text(format!("<unserializable: {err}>"))
            }
        };
        self.insert(name, captured);
        self
    }

    /// Capture `value` as its pretty `Debug` rendering.
    #[must_use]
    pub fn with_debug<T>(mut self, name: impl Into<String>, value: &T) -> Self
    where
        T: Debug + ?Sized,
    {
        self.insert(name.into(), Captured::Text(format!("{value:#?}")));
        self
    }

    /// Insert an already captured value.
    pub fn insert(&mut self, name: String, captured: Captured) {
        if let Some(slot) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = captured;
        } else {
            self.entries.push((name, captured));
        }
    }

    /// Look up a captured value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Captured> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, captured)| captured)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Captured)> {
        self.entries
            .iter()
            .map(|(name, captured)| (name.as_str(), captured))
    }

    /// Number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no values were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build a [`Snapshot`] from local bindings.
///
/// Bare identifiers capture the binding under its own name; `name = expr`
/// captures an expression under `name`. Every value must implement
/// `serde::Serialize`.
///
/// ```
/// let user = "alice";
/// let ids = vec![1, 2, 3];
/// let snapshot = runstop::snapshot!(user, ids, remaining = ids.len() - 1);
/// assert_eq!(snapshot.len(), 3);
/// ```
#[macro_export]
macro_rules! snapshot {
    (@value $name:ident) => {
        $name
    };
    (@value $name:ident = $value:expr) => {
        $value
    };
    ($($name:ident $(= $value:expr)?),* $(,)?) => {
        $crate::Snapshot::new()
            $(.with(stringify!($name), &$crate::snapshot!(@value $name $(= $value)?)))*
    };
}
