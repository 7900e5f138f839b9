//! Server-pushed change events
//!
//! A live subscription delivers one [`ChangeEvent`] per item created or
//! deleted in its collection. Events carry no sequence numbers; the only
//! ordering defense downstream is identifier-based de-duplication.

/// A notification that an item changed in a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent<T, K> {
    /// A new item was created.
    Created(T),
    /// The item with this identifier was deleted.
    Deleted(K),
}

impl<T, K> ChangeEvent<T, K> {
    /// Whether this is a creation event.
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Whether this is a deletion event.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted(_))
    }
}
