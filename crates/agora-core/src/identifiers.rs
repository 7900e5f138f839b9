//! Identifier types for forum entities
//!
//! The backend assigns every topic and comment an opaque, stable string
//! identifier; the client never parses it or derives meaning from it.
//! Newtypes keep the two identifier spaces from being mixed up at compile
//! time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a topic, assigned by the backend.
///
/// Identity of a topic is defined solely by this value; two records with the
/// same `TopicId` are the same logical topic regardless of payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    /// Wrap a backend-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TopicId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TopicId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a comment, assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    /// Wrap a backend-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CommentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CommentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
