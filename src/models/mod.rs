//! Domain model module declarations.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

pub mod dump;
pub mod event;

/// Serialize a timestamp as RFC 3339 UTC with millisecond precision.
///
/// Produces the `2026-01-02T03:04:05.678Z` form observers display as-is.
pub(crate) fn serialize_millis<S>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}
