//! Test fixtures
//!
//! Deterministic record constructors. Identifiers and timestamps are derived
//! from the seed so assertions can name them directly.

use agora_core::{Comment, CommentId, Topic, TopicId, User};
use chrono::{DateTime, TimeZone, Utc};

/// Base instant all fixture timestamps are offset from.
pub fn test_timestamp(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
}

/// A test user with the given name.
pub fn test_user(name: &str) -> User {
    User {
        username: name.to_string(),
    }
}

/// A test topic with id `topic-<seed>`.
pub fn test_topic(seed: u8) -> Topic {
    Topic {
        id: TopicId::new(format!("topic-{seed}")),
        title: format!("Topic {seed}"),
        created_at: test_timestamp(i64::from(seed)),
        updated_at: test_timestamp(i64::from(seed)),
    }
}

/// A test comment with id `comment-<seed>` in the given topic.
pub fn test_comment(topic_id: &TopicId, seed: u8) -> Comment {
    Comment {
        id: CommentId::new(format!("comment-{seed}")),
        topic_id: topic_id.clone(),
        owner: "alice".to_string(),
        content: format!("comment body {seed}"),
        created_at: test_timestamp(i64::from(seed)),
    }
}
