//! Collection scoping
//!
//! Every synchronized list belongs to exactly one scope: the board-level
//! topic list, or the comment thread of one topic. Snapshots and live events
//! are tagged with the scope they were produced for so a view can reject
//! data that belongs to a collection it no longer shows.

use crate::identifiers::TopicId;
use std::fmt;

/// The parent key of one synchronized collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollectionScope {
    /// The board-level list of all topics.
    Topics,
    /// The comment thread of one topic.
    Comments(TopicId),
}

impl CollectionScope {
    /// The topic this scope is nested under, if any.
    pub fn topic_id(&self) -> Option<&TopicId> {
        match self {
            Self::Topics => None,
            Self::Comments(id) => Some(id),
        }
    }
}

impl fmt::Display for CollectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topics => write!(f, "topics"),
            Self::Comments(id) => write!(f, "comments of {id}"),
        }
    }
}
