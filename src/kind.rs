//! Per-kind list configuration.
//!
//! Each list-backed view configures its own [`ListKind`] — resource path,
//! push payload field, event type names and identity-key fields — and passes
//! it into the client explicitly. Nothing here reaches into shared global
//! state.

use crate::entity::{canonical_field, Entity, ListKey};

// ---------------------------------------------------------------------------
// ListKind
// ---------------------------------------------------------------------------

/// Configuration for one kind of live list (documents, models, projects, or
/// any custom resource following the same conventions).
#[derive(Debug, Clone)]
pub struct ListKind {
    name: String,
    singular: String,
    key_fields: Vec<String>,
    update_type: String,
    completed_type: String,
}

impl ListKind {
    /// Documents: keyed by `(id, project)` — document ids are only unique
    /// within their owning project.
    pub fn documents() -> Self {
        Self::custom("documents", "document", &["id", "project"])
    }

    /// Models: keyed by name.
    pub fn models() -> Self {
        Self::custom("models", "model", &["name"])
    }

    /// Projects: keyed by id.
    pub fn projects() -> Self {
        Self::custom("projects", "project", &["id"])
    }

    /// A custom kind following the backend's conventions: snapshot at
    /// `/api/<name>`, push at `/ws/<name>`, events typed
    /// `<singular>_update` / `<singular>_completed` with the payload nested
    /// under `<singular>`.
    pub fn custom(name: &str, singular: &str, key_fields: &[&str]) -> Self {
        ListKind {
            name: name.to_string(),
            singular: singular.to_string(),
            key_fields: key_fields.iter().map(|f| f.to_string()).collect(),
            update_type: format!("{singular}_update"),
            completed_type: format!("{singular}_completed"),
        }
    }

    /// Plural resource name, e.g. `documents`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Singular payload field, e.g. `document`.
    pub fn singular(&self) -> &str {
        &self.singular
    }

    /// Push event type carrying an upsert/delete payload.
    pub fn update_type(&self) -> &str {
        &self.update_type
    }

    /// Push event type signalling that an item finished processing.
    pub fn completed_type(&self) -> &str {
        &self.completed_type
    }

    /// Ordered identity-key fields.
    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    /// Snapshot endpoint path.
    pub fn api_path(&self) -> String {
        format!("/api/{}", self.name)
    }

    /// Push channel path.
    pub fn ws_path(&self) -> String {
        format!("/ws/{}", self.name)
    }

    /// Identity key of `entity` under this kind, if addressable.
    pub fn key_of(&self, entity: &Entity) -> Option<ListKey> {
        ListKey::extract(entity, &self.key_fields)
    }
}

// ---------------------------------------------------------------------------
// ScopeFilter
// ---------------------------------------------------------------------------

/// Field-equals predicate restricting which *new* entities may be appended
/// to a scoped list (e.g. a documents view filtered to one project).
///
/// Entities already present always merge in place regardless of scope.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    field: String,
    value: String,
}

impl ScopeFilter {
    pub fn field_equals(field: &str, value: &str) -> Self {
        ScopeFilter {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether `entity` falls inside the scope. Compares canonical
    /// renderings so numeric and string field values agree.
    pub fn matches(&self, entity: &Entity) -> bool {
        entity
            .get(&self.field)
            .and_then(canonical_field)
            .is_some_and(|v| v == self.value)
    }
}
