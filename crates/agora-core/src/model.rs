//! Forum record types
//!
//! Plain data records as the backend returns them. Field names follow the
//! backend's wire casing so the same types deserialize GraphQL responses and
//! subscription payloads directly.

use crate::identifiers::{CommentId, TopicId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated forum user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name; also the owner recorded on comments this user posts.
    pub username: String,
}

/// A discussion topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Backend-assigned identifier.
    pub id: TopicId,
    /// Topic title as entered by the creator.
    pub title: String,
    /// Creation time, assigned by the backend.
    pub created_at: DateTime<Utc>,
    /// Last modification time, assigned by the backend.
    pub updated_at: DateTime<Utc>,
}

/// A comment within one topic's thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Backend-assigned identifier.
    pub id: CommentId,
    /// The topic this comment belongs to.
    pub topic_id: TopicId,
    /// Username of the author, recorded by the backend.
    pub owner: String,
    /// Comment body.
    pub content: String,
    /// Creation time, assigned by the backend.
    pub created_at: DateTime<Utc>,
}

/// One page of a collection read.
///
/// The continuation token is surfaced but never auto-followed; a view shows
/// the first page and leaves further paging to an explicit user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items in server order (newest first).
    pub items: Vec<T>,
    /// Continuation token for the next page, if any.
    #[serde(default)]
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// A page with the given items and no continuation.
    pub fn of(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::of(Vec::new())
    }
}

/// A topic together with the first page of its comment thread, as returned
/// by the single-topic read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicThread {
    /// The topic header.
    #[serde(flatten)]
    pub topic: Topic,
    /// First page of comments, newest first.
    pub comments: Page<Comment>,
}

/// Input for creating a topic. The backend assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTopic {
    /// Title of the new topic.
    pub title: String,
}

/// Input for creating a comment. The backend assigns id, owner and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    /// Thread to post into.
    pub topic_id: TopicId,
    /// Comment body.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_topic_wire_casing() {
        let topic = Topic {
            id: TopicId::from("t1"),
            title: "Graph API".into(),
            created_at: ts(),
            updated_at: ts(),
        };
        let json = serde_json::to_value(&topic).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_thread_flattens_topic_fields() {
        let raw = serde_json::json!({
            "id": "t1",
            "title": "Templates",
            "createdAt": "2024-03-01T12:00:00Z",
            "updatedAt": "2024-03-01T12:00:00Z",
            "comments": { "items": [], "nextToken": null }
        });
        let thread: TopicThread = serde_json::from_value(raw).unwrap();
        assert_eq!(thread.topic.title, "Templates");
        assert!(thread.comments.is_empty());
        assert!(thread.comments.next_token.is_none());
    }

    #[test]
    fn test_page_tolerates_missing_token() {
        let raw = serde_json::json!({ "items": [] });
        let page: Page<Topic> = serde_json::from_value(raw).unwrap();
        assert!(page.is_empty());
        assert_eq!(page.next_token, None);
    }
}
