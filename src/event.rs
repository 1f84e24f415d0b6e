//! Push-channel wire format.
//!
//! The backend broadcasts one JSON object per message:
//!
//! ```json
//! { "type": "document_update", "document": { "id": 4, "project": "alpha", "loaded_chunks": 7 } }
//! ```
//!
//! The nested payload carries a full or partial entity plus an optional
//! `deleted` flag distinguishing delete from upsert, and an optional
//! `completed` flag (or a separate `<kind>_completed` type) signalling that
//! an item finished processing. Unrecognized `type` values are ignored so
//! that newer backends can add event kinds without breaking older clients.

use serde_json::Value;
use thiserror::Error;

use crate::entity::Entity;
use crate::kind::ListKind;

// ---------------------------------------------------------------------------
// Decoded events
// ---------------------------------------------------------------------------

/// One decoded push event for a given kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    /// Insert-or-merge the carried (possibly partial) entity.
    Upserted(Entity),
    /// Remove the entry matching the carried entity's identity key.
    Deleted(Entity),
    /// The carried entity finished processing; the list should be
    /// re-fetched wholesale after a short delay.
    Completed(Entity),
    /// A recognized message for some other kind or a future event type.
    Ignored,
}

/// Per-message decode failures. These are logged and skipped by the client;
/// they never terminate the channel.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message has no string `type` field")]
    MissingType,

    #[error("`{0}` payload is missing or not an object")]
    MissingPayload(String),
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one raw channel message against `kind`.
pub fn decode(kind: &ListKind, raw: &str) -> Result<ListEvent, EventError> {
    let message: Value = serde_json::from_str(raw)?;

    let event_type = message
        .get("type")
        .and_then(Value::as_str)
        .ok_or(EventError::MissingType)?;

    let is_update = event_type == kind.update_type();
    let is_completed = event_type == kind.completed_type();
    if !is_update && !is_completed {
        return Ok(ListEvent::Ignored);
    }

    let payload = message
        .get(kind.singular())
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| EventError::MissingPayload(kind.singular().to_string()))?;

    if flag(&payload, "deleted") {
        return Ok(ListEvent::Deleted(payload));
    }
    if is_completed || flag(&payload, "completed") {
        return Ok(ListEvent::Completed(payload));
    }
    Ok(ListEvent::Upserted(payload))
}

fn flag(payload: &Entity, field: &str) -> bool {
    payload.get(field).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn documents() -> ListKind {
        ListKind::documents()
    }

    // -----------------------------------------------------------------------
    // Upsert / delete / completed
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_upsert() {
        let raw = json!({"type": "document_update", "document": {"id": 1, "project": "a"}});
        let event = decode(&documents(), &raw.to_string()).unwrap();
        match event {
            ListEvent::Upserted(e) => assert_eq!(e["id"], json!(1)),
            other => panic!("expected Upserted, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_deleted_flag() {
        let raw = json!({"type": "document_update", "document": {"id": 1, "project": "a", "deleted": true}});
        let event = decode(&documents(), &raw.to_string()).unwrap();
        assert!(matches!(event, ListEvent::Deleted(_)));
    }

    #[test]
    fn test_decode_deleted_false_is_upsert() {
        let raw = json!({"type": "document_update", "document": {"id": 1, "project": "a", "deleted": false}});
        let event = decode(&documents(), &raw.to_string()).unwrap();
        assert!(matches!(event, ListEvent::Upserted(_)));
    }

    #[test]
    fn test_decode_completed_flag() {
        let raw = json!({"type": "document_update", "document": {"id": 1, "project": "a", "completed": true}});
        let event = decode(&documents(), &raw.to_string()).unwrap();
        assert!(matches!(event, ListEvent::Completed(_)));
    }

    #[test]
    fn test_decode_completed_type() {
        let raw = json!({"type": "document_completed", "document": {"id": 1, "project": "a"}});
        let event = decode(&documents(), &raw.to_string()).unwrap();
        assert!(matches!(event, ListEvent::Completed(_)));
    }

    #[test]
    fn test_deleted_flag_wins_over_completed_type() {
        // A deleted item has nothing left to refresh for.
        let raw = json!({"type": "document_completed", "document": {"id": 1, "deleted": true}});
        let event = decode(&documents(), &raw.to_string()).unwrap();
        assert!(matches!(event, ListEvent::Deleted(_)));
    }

    // -----------------------------------------------------------------------
    // Forward compatibility
    // -----------------------------------------------------------------------

    #[test]
    fn test_other_kind_event_is_ignored() {
        let raw = json!({"type": "model_update", "model": {"name": "m"}});
        let event = decode(&documents(), &raw.to_string()).unwrap();
        assert_eq!(event, ListEvent::Ignored);
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let raw = json!({"type": "project_stats_update", "projectId": 3, "stats": {}});
        let event = decode(&documents(), &raw.to_string()).unwrap();
        assert_eq!(event, ListEvent::Ignored);
    }

    #[test]
    fn test_extra_top_level_fields_tolerated() {
        let raw = json!({
            "type": "document_update",
            "document": {"id": 1, "project": "a"},
            "sequence": 991,
        });
        assert!(matches!(
            decode(&documents(), &raw.to_string()).unwrap(),
            ListEvent::Upserted(_)
        ));
    }

    // -----------------------------------------------------------------------
    // Malformed messages
    // -----------------------------------------------------------------------

    #[test]
    fn test_non_json_is_error() {
        assert!(matches!(
            decode(&documents(), "not json"),
            Err(EventError::Json(_))
        ));
    }

    #[test]
    fn test_missing_type_is_error() {
        let raw = json!({"document": {"id": 1}});
        assert!(matches!(
            decode(&documents(), &raw.to_string()),
            Err(EventError::MissingType)
        ));
    }

    #[test]
    fn test_non_string_type_is_error() {
        let raw = json!({"type": 7, "document": {"id": 1}});
        assert!(matches!(
            decode(&documents(), &raw.to_string()),
            Err(EventError::MissingType)
        ));
    }

    #[test]
    fn test_missing_payload_is_error() {
        let raw = json!({"type": "document_update"});
        assert!(matches!(
            decode(&documents(), &raw.to_string()),
            Err(EventError::MissingPayload(_))
        ));
    }

    #[test]
    fn test_non_object_payload_is_error() {
        let raw = json!({"type": "document_update", "document": [1, 2, 3]});
        assert!(matches!(
            decode(&documents(), &raw.to_string()),
            Err(EventError::MissingPayload(_))
        ));
    }
}
