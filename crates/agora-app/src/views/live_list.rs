//! Live list reconciliation
//!
//! [`LiveList`] is the single source of truth for what one view renders: a
//! one-time snapshot merged with an unbounded stream of created/deleted
//! events, under arbitrary interleaving. It is a pure in-memory merge and
//! never fails; identifier-based de-duplication is the only ordering
//! defense, since the backend's push channel carries no sequence numbers.

use agora_core::{ChangeEvent, CollectionScope, Comment, CommentId, Page, Topic, TopicId};
use std::fmt;

/// Items that carry their own identity.
pub trait Keyed {
    /// Identifier type. Identity is the key alone; payload differences do
    /// not distinguish items.
    type Key: PartialEq + Clone + fmt::Debug;

    /// The item's identifier.
    fn key(&self) -> &Self::Key;
}

impl Keyed for Topic {
    type Key = TopicId;

    fn key(&self) -> &TopicId {
        &self.id
    }
}

impl Keyed for Comment {
    type Key = CommentId;

    fn key(&self) -> &CommentId {
        &self.id
    }
}

/// Render phase of a live list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListPhase {
    /// No snapshot applied yet; render a loading placeholder.
    #[default]
    Loading,
    /// Snapshot applied; render the items (possibly none).
    Ready,
}

/// The reconciled, de-duplicated, newest-first sequence for one collection.
#[derive(Debug, Clone)]
pub struct LiveList<T: Keyed> {
    scope: CollectionScope,
    phase: ListPhase,
    items: Vec<T>,
    next_token: Option<String>,
}

impl<T: Keyed> LiveList<T> {
    /// An empty, loading list bound to `scope`.
    pub fn new(scope: CollectionScope) -> Self {
        Self {
            scope,
            phase: ListPhase::Loading,
            items: Vec::new(),
            next_token: None,
        }
    }

    /// The collection this list is bound to.
    pub fn scope(&self) -> &CollectionScope {
        &self.scope
    }

    /// Current render phase.
    pub fn phase(&self) -> ListPhase {
        self.phase
    }

    /// Whether the snapshot has been applied.
    pub fn is_ready(&self) -> bool {
        self.phase == ListPhase::Ready
    }

    /// Items in render order (newest first).
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Continuation token of the snapshot page, surfaced but not followed.
    pub fn next_token(&self) -> Option<&str> {
        self.next_token.as_deref()
    }

    /// Apply the one-time snapshot fetched for `scope`, replacing the
    /// sequence and moving to `Ready`.
    ///
    /// Returns `false` and leaves the list untouched when the fetch is
    /// stale: the list has since been rebound to a different scope, or a
    /// snapshot was already applied. Staleness is expected during fast
    /// navigation and is logged, not an error.
    pub fn apply_snapshot(&mut self, scope: &CollectionScope, page: Page<T>) -> bool {
        if *scope != self.scope {
            tracing::warn!(fetched = %scope, current = %self.scope, "discarding snapshot for stale scope");
            return false;
        }
        if self.phase == ListPhase::Ready {
            tracing::warn!(scope = %self.scope, "discarding repeated snapshot; rebind first");
            return false;
        }
        self.items.clear();
        for item in page.items {
            if !self.contains(item.key()) {
                self.items.push(item);
            }
        }
        self.next_token = page.next_token;
        self.phase = ListPhase::Ready;
        true
    }

    /// Apply a created event: prepend unless the identifier already exists,
    /// in which case the existing entry keeps its position. Returns whether
    /// the item was inserted.
    pub fn apply_created(&mut self, item: T) -> bool {
        if self.contains(item.key()) {
            return false;
        }
        self.items.insert(0, item);
        true
    }

    /// Apply a deleted event: remove the matching item if present. Absence
    /// is a no-op, not an error; the event may race ahead of or behind the
    /// snapshot.
    pub fn apply_deleted(&mut self, key: &T::Key) -> Option<T> {
        let index = self.items.iter().position(|item| item.key() == key)?;
        Some(self.items.remove(index))
    }

    /// Apply one change event.
    pub fn apply(&mut self, event: ChangeEvent<T, T::Key>) {
        match event {
            ChangeEvent::Created(item) => {
                self.apply_created(item);
            }
            ChangeEvent::Deleted(key) => {
                self.apply_deleted(&key);
            }
        }
    }

    /// Reset to `Loading` for a new scope, clearing every item. Callers
    /// tear down the old scope's channels before rebinding.
    pub fn rebind(&mut self, scope: CollectionScope) {
        self.scope = scope;
        self.phase = ListPhase::Loading;
        self.items.clear();
        self.next_token = None;
    }

    fn contains(&self, key: &T::Key) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }
}
