//! Agora Core - Forum Client Data Model
//!
//! This crate provides the shared vocabulary of the Agora client: the forum
//! record types, the collection scoping used by the synchronization layer,
//! change-event variants, and the error taxonomy. It contains no I/O and no
//! application logic; everything here is plain data that the client and view
//! crates agree on.

#![forbid(unsafe_code)]

/// Topic and comment identifier newtypes
pub mod identifiers;

/// Forum record types and pages
pub mod model;

/// Collection scoping for synchronized lists
pub mod scope;

/// Server-pushed change events
pub mod event;

/// Error taxonomy shared across the client
pub mod errors;

pub use errors::{AuthError, ConfigError, FetchError, MutationError, StreamError};
pub use event::ChangeEvent;
pub use identifiers::{CommentId, TopicId};
pub use model::{Comment, NewComment, NewTopic, Page, Topic, TopicThread, User};
pub use scope::CollectionScope;
