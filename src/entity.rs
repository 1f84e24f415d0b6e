//! Entities and identity keys.
//!
//! An entity is an untyped JSON object — the backend's document, model and
//! project records share no schema beyond "object with some identifying
//! fields", and push updates may carry any subset of fields. Reconciliation
//! therefore works on `serde_json::Map` directly rather than typed structs.

use serde_json::{Map, Value};

/// One list entry: a JSON object keyed by kind-specific identity fields.
pub type Entity = Map<String, Value>;

// ---------------------------------------------------------------------------
// Identity keys
// ---------------------------------------------------------------------------

/// Canonical identity of one entity within a list.
///
/// Composite keys (documents are keyed by `(id, project)`) are stored as the
/// ordered canonical renderings of each key field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListKey(Vec<String>);

impl ListKey {
    /// Extract the key for `entity` from the ordered `fields` list.
    ///
    /// Returns `None` when any key field is missing or has no canonical
    /// rendering — such an entity is unaddressable and must not be merged
    /// into a list.
    pub fn extract(entity: &Entity, fields: &[String]) -> Option<ListKey> {
        let mut parts = Vec::with_capacity(fields.len());
        for field in fields {
            parts.push(canonical_field(entity.get(field)?)?);
        }
        Some(ListKey(parts))
    }

    /// The rendered key parts, in key-field order.
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for ListKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Render one key field to its canonical string form.
///
/// Strings render without quotes so that `"7"` and the number `7` produce
/// the same key — the backend is not consistent about numeric id types
/// between the snapshot endpoint and push payloads.
pub fn canonical_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Shallow merge
// ---------------------------------------------------------------------------

/// Shallow-merge `incoming` into `existing`.
///
/// Incoming fields overwrite matching fields; fields absent from the
/// incoming delta are preserved. Nested objects are replaced wholesale, not
/// merged recursively. Idempotent: applying the same delta twice yields the
/// same entity.
pub fn merge_into(existing: &mut Entity, incoming: &Entity) {
    for (field, value) in incoming {
        existing.insert(field.clone(), value.clone());
    }
}
