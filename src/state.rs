//! ListState — the reconciled list and its observer contract.
//!
//! Invariant: after any operation, no two entries share an identity key.
//! Every mutation publishes an immutable [`ListView`] through a
//! `tokio::sync::watch` channel; consumers subscribe instead of sharing
//! mutable state with the reconciliation loop.

use tokio::sync::watch;

use crate::entity::{merge_into, Entity, ListKey};
use crate::kind::{ListKind, ScopeFilter};
use crate::snapshot::SnapshotPage;

// ---------------------------------------------------------------------------
// Published view
// ---------------------------------------------------------------------------

/// Immutable snapshot of the list published to subscribers.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    pub entities: Vec<Entity>,
    /// Server-side total from the last snapshot (live deltas do not adjust
    /// it; the completion-triggered re-fetch does).
    pub total: u64,
    /// Whether the push channel is currently open.
    pub live: bool,
    /// Last snapshot-fetch failure, cleared by the next successful fetch.
    pub last_error: Option<String>,
}

/// What [`ListState::apply_upsert`] did with an incoming entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Shallow-merged into an existing entry.
    Merged,
    /// Appended as a new entry.
    Appended,
    /// New entity outside the active scope filter; dropped.
    OutOfScope,
    /// New entity but the page is already full; dropped.
    PageFull,
    /// Entity has no identity key; dropped.
    Unkeyed,
}

// ---------------------------------------------------------------------------
// ListState
// ---------------------------------------------------------------------------

/// Ordered list of entities with merge-by-key reconciliation.
pub struct ListState {
    kind: ListKind,
    scope: Option<ScopeFilter>,
    /// Cap on live appends; a paginated view must not silently exceed its
    /// page. `None` disables the cap.
    page_cap: Option<usize>,
    entries: Vec<Entity>,
    total: u64,
    live: bool,
    last_error: Option<String>,
    tx: watch::Sender<ListView>,
}

impl ListState {
    /// Create an empty list and its subscription handle.
    pub fn new(
        kind: ListKind,
        scope: Option<ScopeFilter>,
        page_cap: Option<usize>,
    ) -> (Self, watch::Receiver<ListView>) {
        let (tx, rx) = watch::channel(ListView::default());
        let state = ListState {
            kind,
            scope,
            page_cap,
            entries: Vec::new(),
            total: 0,
            live: false,
            last_error: None,
            tx,
        };
        (state, rx)
    }

    pub fn entries(&self) -> &[Entity] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert-or-merge one incoming (possibly partial) entity.
    ///
    /// Existing entries always merge in place, scope filter or not. New
    /// entities append only when they match the active scope filter and the
    /// page cap has room.
    pub fn apply_upsert(&mut self, incoming: Entity) -> UpsertOutcome {
        let Some(key) = self.kind.key_of(&incoming) else {
            return UpsertOutcome::Unkeyed;
        };

        if let Some(position) = self.position(&key) {
            merge_into(&mut self.entries[position], &incoming);
            self.publish();
            return UpsertOutcome::Merged;
        }

        if let Some(scope) = &self.scope {
            if !scope.matches(&incoming) {
                return UpsertOutcome::OutOfScope;
            }
        }
        if self.page_cap.is_some_and(|cap| self.entries.len() >= cap) {
            return UpsertOutcome::PageFull;
        }

        self.entries.push(incoming);
        self.publish();
        UpsertOutcome::Appended
    }

    /// Remove the entry matching `incoming`'s identity key. No-op when the
    /// key is absent from the list (or the payload is unaddressable).
    pub fn apply_delete(&mut self, incoming: &Entity) -> bool {
        let Some(key) = self.kind.key_of(incoming) else {
            return false;
        };
        let Some(position) = self.position(&key) else {
            return false;
        };
        self.entries.remove(position);
        self.publish();
        true
    }

    /// Replace the list wholesale with a fresh snapshot page.
    ///
    /// Duplicate keys within the page are dropped (first occurrence wins)
    /// so the uniqueness invariant holds even against a buggy backend.
    pub fn replace(&mut self, page: SnapshotPage) {
        let mut seen: Vec<ListKey> = Vec::with_capacity(page.entities.len());
        self.entries = page
            .entities
            .into_iter()
            .filter(|entity| match self.kind.key_of(entity) {
                Some(key) if seen.contains(&key) => false,
                Some(key) => {
                    seen.push(key);
                    true
                }
                // Unkeyed snapshot rows are kept: they render fine and can
                // never collide with an addressable delta.
                None => true,
            })
            .collect();
        self.total = page.total;
        self.last_error = None;
        self.publish();
    }

    /// Record whether the push channel is open.
    pub fn set_live(&mut self, live: bool) {
        if self.live != live {
            self.live = live;
            self.publish();
        }
    }

    /// Record a snapshot-fetch failure without touching the entries.
    pub fn set_error(&mut self, detail: String) {
        self.last_error = Some(detail);
        self.publish();
    }

    /// Current view, as published to subscribers.
    pub fn view(&self) -> ListView {
        ListView {
            entities: self.entries.clone(),
            total: self.total,
            live: self.live,
            last_error: self.last_error.clone(),
        }
    }

    fn position(&self, key: &ListKey) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| self.kind.key_of(entry).as_ref() == Some(key))
    }

    fn publish(&self) {
        // Subscribers may all be gone (view unmounted); that is not an error.
        let _ = self.tx.send(self.view());
    }
}
