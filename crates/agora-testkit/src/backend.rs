//! In-memory forum backend
//!
//! [`MemoryForum`] implements all four collaborator traits over a mutex-held
//! store. Mutations fan out to every open channel for the matching scope,
//! which makes the live echo path observable in tests without a server.
//! Failure injection covers the snapshot and mutation error paths; direct
//! emit methods let tests race events against snapshots and teardowns.

use agora_client::channel::{EventChannel, EventSender};
use agora_client::effects::{AuthEffects, MutationEffects, QueryEffects, SubscriptionEffects};
use agora_core::{
    AuthError, Comment, CommentId, FetchError, MutationError, NewComment, NewTopic, Page,
    StreamError, Topic, TopicId, TopicThread, User,
};
use async_lock::Mutex;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct ForumState {
    user: Option<User>,
    topics: Vec<Topic>,
    comments: HashMap<TopicId, Vec<Comment>>,
    topic_subs: Vec<EventSender<Topic>>,
    comment_subs: HashMap<TopicId, Vec<EventSender<Comment>>>,
    delete_subs: HashMap<TopicId, Vec<EventSender<CommentId>>>,
    fail_next_fetch: Option<String>,
    fail_next_mutation: Option<Vec<String>>,
    seq: u64,
}

impl ForumState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{prefix}-{}", self.seq)
    }

    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        crate::fixtures::test_timestamp(self.seq as i64)
    }
}

/// In-memory backend implementing every collaborator trait.
pub struct MemoryForum {
    state: Mutex<ForumState>,
    mutation_requests: AtomicU64,
}

impl MemoryForum {
    /// A forum with `alice` signed in.
    pub fn new() -> Self {
        Self::with_user("alice")
    }

    /// A forum with the given user signed in.
    pub fn with_user(name: &str) -> Self {
        Self {
            state: Mutex::new(ForumState {
                user: Some(crate::fixtures::test_user(name)),
                ..ForumState::default()
            }),
            mutation_requests: AtomicU64::new(0),
        }
    }

    /// A forum with nobody signed in.
    pub fn anonymous() -> Self {
        Self {
            state: Mutex::new(ForumState::default()),
            mutation_requests: AtomicU64::new(0),
        }
    }

    /// Number of write requests that reached the backend, including failed
    /// ones. Used to assert that rejected submits never issue a request.
    pub fn mutation_requests(&self) -> u64 {
        self.mutation_requests.load(Ordering::SeqCst)
    }

    /// Store a topic without emitting a live event (pre-mount data).
    pub async fn seed_topic(&self, title: &str) -> Topic {
        let mut state = self.state.lock().await;
        let topic = Topic {
            id: TopicId::new(state.next_id("topic")),
            title: title.to_string(),
            created_at: state.now(),
            updated_at: state.now(),
        };
        state.topics.insert(0, topic.clone());
        topic
    }

    /// Store a comment without emitting a live event (pre-mount data).
    pub async fn seed_comment(&self, topic_id: &TopicId, owner: &str, content: &str) -> Comment {
        let mut state = self.state.lock().await;
        let comment = Comment {
            id: CommentId::new(state.next_id("comment")),
            topic_id: topic_id.clone(),
            owner: owner.to_string(),
            content: content.to_string(),
            created_at: state.now(),
        };
        state
            .comments
            .entry(topic_id.clone())
            .or_default()
            .insert(0, comment.clone());
        comment
    }

    /// Fail the next snapshot read with this message.
    pub async fn fail_next_fetch(&self, message: &str) {
        self.state.lock().await.fail_next_fetch = Some(message.to_string());
    }

    /// Fail the next mutation with these server error messages.
    pub async fn fail_next_mutation(&self, messages: &[&str]) {
        self.state.lock().await.fail_next_mutation =
            Some(messages.iter().map(|m| m.to_string()).collect());
    }

    /// Emit a topic-created event without touching the store. Lets tests
    /// race the stream against the snapshot.
    pub async fn emit_topic_created(&self, topic: Topic) {
        let mut state = self.state.lock().await;
        state.topic_subs.retain(|sub| sub.deliver(topic.clone()));
    }

    /// Emit a comment-created event for one topic without touching the store.
    pub async fn emit_comment_created(&self, comment: Comment) {
        let mut state = self.state.lock().await;
        if let Some(subs) = state.comment_subs.get_mut(&comment.topic_id) {
            subs.retain(|sub| sub.deliver(comment.clone()));
        }
    }

    /// Emit a comment-deleted event for one topic without touching the store.
    pub async fn emit_comment_deleted(&self, topic_id: &TopicId, id: CommentId) {
        let mut state = self.state.lock().await;
        if let Some(subs) = state.delete_subs.get_mut(topic_id) {
            subs.retain(|sub| sub.deliver(id.clone()));
        }
    }

    /// Inject a stream fault on one topic's comment-created channel.
    pub async fn emit_comment_fault(&self, topic_id: &TopicId, error: StreamError) {
        let mut state = self.state.lock().await;
        if let Some(subs) = state.comment_subs.get_mut(topic_id) {
            subs.retain(|sub| sub.fault(error.clone()));
        }
    }

    /// Whether any live channel is still open for the given topic's comments.
    pub async fn has_open_comment_channels(&self, topic_id: &TopicId) -> bool {
        let state = self.state.lock().await;
        state
            .comment_subs
            .get(topic_id)
            .map(|subs| subs.iter().any(|sub| !sub.is_closed()))
            .unwrap_or(false)
    }
}

impl Default for MemoryForum {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthEffects for MemoryForum {
    async fn current_user(&self) -> Result<User, AuthError> {
        self.state
            .lock()
            .await
            .user
            .clone()
            .ok_or(AuthError::NotAuthenticated)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.lock().await.user = None;
        Ok(())
    }
}

#[async_trait]
impl QueryEffects for MemoryForum {
    async fn list_topics(&self) -> Result<Page<Topic>, FetchError> {
        let mut state = self.state.lock().await;
        if let Some(message) = state.fail_next_fetch.take() {
            return Err(FetchError::new(message));
        }
        Ok(Page::of(state.topics.clone()))
    }

    async fn get_topic(&self, id: &TopicId) -> Result<TopicThread, FetchError> {
        let mut state = self.state.lock().await;
        if let Some(message) = state.fail_next_fetch.take() {
            return Err(FetchError::new(message));
        }
        let topic = state
            .topics
            .iter()
            .find(|t| t.id == *id)
            .cloned()
            .ok_or_else(|| FetchError::new(format!("topic not found: {id}")))?;
        let comments = state.comments.get(id).cloned().unwrap_or_default();
        Ok(TopicThread {
            topic,
            comments: Page::of(comments),
        })
    }
}

#[async_trait]
impl MutationEffects for MemoryForum {
    async fn create_topic(&self, input: NewTopic) -> Result<Topic, MutationError> {
        self.mutation_requests.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if let Some(messages) = state.fail_next_mutation.take() {
            return Err(MutationError::new(messages));
        }
        let topic = Topic {
            id: TopicId::new(state.next_id("topic")),
            title: input.title,
            created_at: state.now(),
            updated_at: state.now(),
        };
        state.topics.insert(0, topic.clone());
        state.topic_subs.retain(|sub| sub.deliver(topic.clone()));
        Ok(topic)
    }

    async fn create_comment(&self, input: NewComment) -> Result<Comment, MutationError> {
        self.mutation_requests.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if let Some(messages) = state.fail_next_mutation.take() {
            return Err(MutationError::new(messages));
        }
        if !state.topics.iter().any(|t| t.id == input.topic_id) {
            return Err(MutationError::message(format!(
                "topic not found: {}",
                input.topic_id
            )));
        }
        let owner = state
            .user
            .as_ref()
            .map(|u| u.username.clone())
            .ok_or_else(|| MutationError::message("not signed in"))?;
        let comment = Comment {
            id: CommentId::new(state.next_id("comment")),
            topic_id: input.topic_id.clone(),
            owner,
            content: input.content,
            created_at: state.now(),
        };
        state
            .comments
            .entry(input.topic_id.clone())
            .or_default()
            .insert(0, comment.clone());
        if let Some(subs) = state.comment_subs.get_mut(&input.topic_id) {
            subs.retain(|sub| sub.deliver(comment.clone()));
        }
        Ok(comment)
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<Comment, MutationError> {
        self.mutation_requests.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        if let Some(messages) = state.fail_next_mutation.take() {
            return Err(MutationError::new(messages));
        }
        let mut removed = None;
        for comments in state.comments.values_mut() {
            if let Some(index) = comments.iter().position(|c| c.id == *id) {
                removed = Some(comments.remove(index));
                break;
            }
        }
        let comment =
            removed.ok_or_else(|| MutationError::message(format!("comment not found: {id}")))?;
        if let Some(subs) = state.delete_subs.get_mut(&comment.topic_id) {
            subs.retain(|sub| sub.deliver(comment.id.clone()));
        }
        Ok(comment)
    }
}

#[async_trait]
impl SubscriptionEffects for MemoryForum {
    async fn on_create_topic(&self) -> Result<EventChannel<Topic>, StreamError> {
        let (sender, channel) = EventChannel::pair();
        self.state.lock().await.topic_subs.push(sender);
        Ok(channel)
    }

    async fn on_create_comment(
        &self,
        topic_id: &TopicId,
    ) -> Result<EventChannel<Comment>, StreamError> {
        let (sender, channel) = EventChannel::pair();
        self.state
            .lock()
            .await
            .comment_subs
            .entry(topic_id.clone())
            .or_default()
            .push(sender);
        Ok(channel)
    }

    async fn on_delete_comment(
        &self,
        topic_id: &TopicId,
    ) -> Result<EventChannel<CommentId>, StreamError> {
        let (sender, channel) = EventChannel::pair();
        self.state
            .lock()
            .await
            .delete_subs
            .entry(topic_id.clone())
            .or_default()
            .push(sender);
        Ok(channel)
    }
}
