//! Field extraction from loose transport payloads.
//!
//! Payload shapes are not trusted: anything that does not parse is
//! reported as `None` and the caller discards it silently.

use serde_json::Value;

use atelier_core::types::id::NotificationId;
use atelier_entity::NotificationRecord;

/// Parses a full notification record out of an event payload.
pub fn record_from_payload(payload: &Value) -> Option<NotificationRecord> {
    serde_json::from_value(payload.clone()).ok()
}

/// Pulls just the record id out of an event payload.
///
/// Accepts either a bare `{"id": ...}` object or a full record.
pub fn id_from_payload(payload: &Value) -> Option<NotificationId> {
    payload
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}
