//! Collaborator traits consumed by the view layer
//!
//! The forum delegates all durable state, authentication and real-time
//! fan-out to a hosted backend. These traits are the seam: view cores are
//! generic over them, production wires in the HTTP and realtime transports,
//! and tests substitute the in-memory backend from `agora-testkit`.

use crate::channel::EventChannel;
use agora_core::{
    AuthError, Comment, CommentId, FetchError, MutationError, NewComment, NewTopic, Page,
    StreamError, Topic, TopicId, TopicThread, User,
};
use async_trait::async_trait;

/// Authentication collaborator. Gates entry to every view.
#[async_trait]
pub trait AuthEffects: Send + Sync {
    /// Resolve the currently authenticated user.
    async fn current_user(&self) -> Result<User, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Read collaborator: one-time snapshots of a collection.
#[async_trait]
pub trait QueryEffects: Send + Sync {
    /// First page of all topics, newest first.
    async fn list_topics(&self) -> Result<Page<Topic>, FetchError>;

    /// One topic together with the first page of its comments.
    async fn get_topic(&self, id: &TopicId) -> Result<TopicThread, FetchError>;
}

/// Write collaborator: user-initiated mutations.
#[async_trait]
pub trait MutationEffects: Send + Sync {
    /// Create a topic. The created record is echoed back and also arrives
    /// on the topic live stream.
    async fn create_topic(&self, input: NewTopic) -> Result<Topic, MutationError>;

    /// Create a comment in a topic's thread.
    async fn create_comment(&self, input: NewComment) -> Result<Comment, MutationError>;

    /// Delete a comment, returning the deleted record.
    async fn delete_comment(&self, id: &CommentId) -> Result<Comment, MutationError>;
}

/// Subscription collaborator: long-lived push channels per collection scope.
///
/// Created and deleted events for the same scope are two independently
/// cancellable channels; callers bind them under one teardown.
#[async_trait]
pub trait SubscriptionEffects: Send + Sync {
    /// Topics created anywhere on the board.
    async fn on_create_topic(&self) -> Result<EventChannel<Topic>, StreamError>;

    /// Comments created in one topic's thread.
    async fn on_create_comment(&self, topic_id: &TopicId)
        -> Result<EventChannel<Comment>, StreamError>;

    /// Comments deleted from one topic's thread.
    async fn on_delete_comment(
        &self,
        topic_id: &TopicId,
    ) -> Result<EventChannel<CommentId>, StreamError>;
}

/// Everything a forum front-end needs from its backend.
pub trait ForumEffects: AuthEffects + QueryEffects + MutationEffects + SubscriptionEffects {}

impl<T> ForumEffects for T where T: AuthEffects + QueryEffects + MutationEffects + SubscriptionEffects
{}
