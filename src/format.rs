//! Rendering of a [`Snapshot`] into the text shown for a dump.

use std::fmt::Write as _;

use serde_json::Value;

use crate::config::FormatConfig;
use crate::snapshot::{Captured, Snapshot};

/// Turns a snapshot into display text.
///
/// Called once per checkpoint. Implementations own depth limits and
/// truncation; the session stores whatever string comes back.
pub trait ValueFormatter: Send + Sync {
    /// Render `snapshot` for observers.
    fn format(&self, snapshot: &Snapshot) -> String;
}

/// Default formatter producing an indented, inspect-style listing.
///
/// Each entry renders as its name followed by a colon, the value on the
/// following lines, and a blank separator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectFormatter {
    depth: usize,
    max_array_length: usize,
}

impl InspectFormatter {
    /// Create a formatter with explicit limits.
    #[must_use]
    pub fn new(depth: usize, max_array_length: usize) -> Self {
        Self {
            depth,
            max_array_length,
        }
    }

    fn render(&self, value: &Value, level: usize, out: &mut String) {
        match value {
            Value::Array(items) if items.is_empty() => out.push_str("[]"),
            Value::Object(fields) if fields.is_empty() => out.push_str("{}"),
            Value::Array(_) if level > self.depth => out.push_str("[Array]"),
            Value::Object(_) if level > self.depth => out.push_str("[Object]"),
            Value::Array(items) => {
                out.push_str("[\n");
                for item in items.iter().take(self.max_array_length) {
                    indent(out, level + 1);
                    self.render(item, level + 1, out);
                    out.push_str(",\n");
                }
                if items.len() > self.max_array_length {
                    indent(out, level + 1);
                    let hidden = items.len() - self.max_array_length;
                    let _ = writeln!(out, "... {hidden} more item{}", plural(hidden));
                }
                indent(out, level);
                out.push(']');
            }
            Value::Object(fields) => {
                out.push_str("{\n");
                for (key, field) in fields {
                    indent(out, level + 1);
                    out.push_str(&render_key(key));
                    out.push_str(": ");
                    self.render(field, level + 1, out);
                    out.push_str(",\n");
                }
                indent(out, level);
                out.push('}');
            }
            scalar => out.push_str(&scalar.to_string()),
        }
    }
}

impl Default for InspectFormatter {
    fn default() -> Self {
        Self::from(&FormatConfig::default())
    }
}

impl From<&FormatConfig> for InspectFormatter {
    fn from(config: &FormatConfig) -> Self {
        Self::new(config.depth, config.max_array_length)
    }
}

impl ValueFormatter for InspectFormatter {
    fn format(&self, snapshot: &Snapshot) -> String {
        let mut lines = Vec::with_capacity(snapshot.len() * 3);
        for (name, captured) in snapshot.iter() {
            lines.push(format!("{name}:"));
            match captured {
                Captured::Json(value) => {
                    let mut rendered = String::new();
                    self.render(value, 0, &mut rendered);
                    lines.push(rendered);
                }
                Captured::Text(text) => lines.push(text.clone()),
            }
            lines.push(String::new());
        }
        lines.join("\n")
    }
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Identifier-like keys render bare, anything else quoted.
fn render_key(key: &str) -> String {
    let mut chars = key.chars();
    let bare = chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    if bare {
        key.to_owned()
    } else {
        Value::String(key.to_owned()).to_string()
    }
}
