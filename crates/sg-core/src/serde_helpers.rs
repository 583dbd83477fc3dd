//! Shared serde helper functions used across multiple modules.

/// Serde default function that returns `true`.
///
/// Used for boolean toggles that are enabled unless switched off.
pub fn default_true() -> bool {
    true
}

/// Serialize a `Duration` as whole milliseconds.
pub fn serialize_duration_ms<S>(d: &std::time::Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(d.as_millis() as u64)
}
