//! Agora Testing Infrastructure
//!
//! An in-memory forum backend implementing every collaborator trait, plus
//! fixture constructors for records with deterministic identifiers and
//! timestamps. Tests and examples drive the real view cores against
//! [`MemoryForum`] without a network.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod backend;
pub mod fixtures;

pub use backend::MemoryForum;
pub use fixtures::{test_comment, test_timestamp, test_topic, test_user};
