//! Comment thread view core
//!
//! One topic's page: the topic header, the live comment list, the comment
//! composer, and the delete confirmation gate. Created and deleted events
//! arrive on two independent channels bound under one teardown; loading a
//! different topic tears the old scope down first, and each load owns a
//! fresh state handle so stale pumps cannot write into the new scope.

use crate::composer::Composer;
use crate::views::live_list::LiveList;
use agora_client::channel::{ChannelHandle, EventReceiver};
use agora_client::effects::{MutationEffects, QueryEffects, SubscriptionEffects};
use agora_core::{Comment, CommentId, CollectionScope, FetchError, NewComment, Topic, TopicId};
use async_lock::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Everything owned by one mounted topic scope.
struct ThreadBinding {
    topic_id: TopicId,
    topic: Option<Topic>,
    state: Arc<RwLock<LiveList<Comment>>>,
    channels: Vec<ChannelHandle>,
    pumps: Vec<JoinHandle<()>>,
}

impl ThreadBinding {
    fn teardown(mut self) {
        for mut handle in self.channels.drain(..) {
            handle.close();
        }
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
    }
}

/// Headless comment-thread view for one topic at a time.
pub struct ThreadView<B> {
    backend: Arc<B>,
    binding: Option<ThreadBinding>,
    composer: Composer,
    pending_delete: Option<CommentId>,
    delete_in_flight: bool,
    last_error: Option<String>,
    last_notice: Option<String>,
}

impl<B> ThreadView<B>
where
    B: QueryEffects + MutationEffects + SubscriptionEffects + Send + Sync + 'static,
{
    /// A thread view not bound to any topic yet.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            binding: None,
            composer: Composer::new(),
            pending_delete: None,
            delete_in_flight: false,
            last_error: None,
            last_notice: None,
        }
    }

    /// Bind the view to a topic: tear down the previous scope, open both
    /// live channels, then fetch the topic with its first comment page.
    ///
    /// Channels open before the fetch so no event is missed; a snapshot
    /// that loses the race against another `load` is discarded by the
    /// list's scope check.
    pub async fn load(&mut self, topic_id: TopicId) -> Result<(), FetchError> {
        self.unmount();
        self.composer = Composer::new();

        let scope = CollectionScope::Comments(topic_id.clone());
        let state = Arc::new(RwLock::new(LiveList::new(scope.clone())));
        let mut channels = Vec::new();
        let mut pumps = Vec::new();

        match self.backend.on_create_comment(&topic_id).await {
            Ok(channel) => {
                let (handle, rx) = channel.split();
                channels.push(handle);
                pumps.push(spawn_created_pump(rx, state.clone(), topic_id.clone()));
            }
            Err(error) => {
                tracing::warn!(%error, topic = %topic_id, "comment created stream unavailable");
            }
        }
        match self.backend.on_delete_comment(&topic_id).await {
            Ok(channel) => {
                let (handle, rx) = channel.split();
                channels.push(handle);
                pumps.push(spawn_deleted_pump(rx, state.clone()));
            }
            Err(error) => {
                tracing::warn!(%error, topic = %topic_id, "comment deleted stream unavailable");
            }
        }

        self.binding = Some(ThreadBinding {
            topic_id: topic_id.clone(),
            topic: None,
            state: state.clone(),
            channels,
            pumps,
        });

        let thread = match self.backend.get_topic(&topic_id).await {
            Ok(thread) => thread,
            Err(error) => {
                self.last_error = Some(error.to_string());
                return Err(error);
            }
        };
        if let Some(binding) = self.binding.as_mut() {
            binding.topic = Some(thread.topic);
        }
        state.write().await.apply_snapshot(&scope, thread.comments);
        self.last_error = None;
        tracing::info!(topic = %topic_id, "thread mounted");
        Ok(())
    }

    /// Submit the composer draft as a new comment. Returns `true` when a
    /// request was issued. The list itself is updated by the live echo of
    /// the created comment, not here.
    pub async fn submit(&mut self) -> bool {
        let Some(topic_id) = self.binding.as_ref().map(|b| b.topic_id.clone()) else {
            return false;
        };
        if !self.composer.can_submit() {
            return false;
        }
        let content = self.composer.begin();
        match self
            .backend
            .create_comment(NewComment { topic_id, content })
            .await
        {
            Ok(comment) => {
                tracing::debug!(comment = %comment.id, "comment created");
                self.composer.finish_ok();
                self.last_error = None;
                self.last_notice = Some("New Comment Created!".to_string());
            }
            Err(error) => {
                self.composer.finish_err();
                self.last_notice = None;
                self.last_error = Some(error.to_string());
            }
        }
        true
    }

    /// Open the destructive-action gate for one comment.
    pub fn request_delete(&mut self, id: CommentId) {
        self.pending_delete = Some(id);
    }

    /// Close the gate without deleting.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// The comment awaiting confirmation, if any.
    pub fn pending_delete(&self) -> Option<&CommentId> {
        self.pending_delete.as_ref()
    }

    /// Whether a delete request is in flight.
    pub fn is_delete_in_flight(&self) -> bool {
        self.delete_in_flight
    }

    /// Confirm the pending delete and issue the request. Returns `true`
    /// when a request was issued. Removal from the list arrives via the
    /// deleted-event echo.
    pub async fn confirm_delete(&mut self) -> bool {
        if self.delete_in_flight {
            return false;
        }
        let Some(id) = self.pending_delete.take() else {
            return false;
        };
        self.delete_in_flight = true;
        match self.backend.delete_comment(&id).await {
            Ok(comment) => {
                tracing::debug!(comment = %comment.id, "comment deleted");
                self.last_error = None;
                self.last_notice = Some("Deleted a comment".to_string());
            }
            Err(error) => {
                self.last_notice = None;
                self.last_error = Some(error.to_string());
            }
        }
        self.delete_in_flight = false;
        true
    }

    /// The bound topic's header, once the snapshot has loaded.
    pub fn topic(&self) -> Option<&Topic> {
        self.binding.as_ref().and_then(|b| b.topic.as_ref())
    }

    /// The bound topic id, if any.
    pub fn topic_id(&self) -> Option<&TopicId> {
        self.binding.as_ref().map(|b| &b.topic_id)
    }

    /// Comments in render order (newest first). Empty while unbound.
    pub async fn comments(&self) -> Vec<Comment> {
        match &self.binding {
            Some(binding) => binding.state.read().await.items().to_vec(),
            None => Vec::new(),
        }
    }

    /// Whether the snapshot has been applied for the bound topic.
    pub async fn is_ready(&self) -> bool {
        match &self.binding {
            Some(binding) => binding.state.read().await.is_ready(),
            None => false,
        }
    }

    /// The comment composer.
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Replace the composer draft.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.composer.set_draft(text);
    }

    /// Message of the last failed action, until the next successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Confirmation of the last successful action.
    pub fn last_notice(&self) -> Option<&str> {
        self.last_notice.as_deref()
    }

    /// Unbind from the current topic, closing both channels and their
    /// pumps together.
    pub fn unmount(&mut self) {
        self.pending_delete = None;
        if let Some(binding) = self.binding.take() {
            binding.teardown();
        }
    }
}

impl<B> Drop for ThreadView<B> {
    fn drop(&mut self) {
        if let Some(binding) = self.binding.take() {
            binding.teardown();
        }
    }
}

fn spawn_created_pump(
    mut rx: EventReceiver<Comment>,
    state: Arc<RwLock<LiveList<Comment>>>,
    bound_topic: TopicId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(delivery) = rx.recv().await {
            match delivery {
                Ok(comment) => {
                    // Scope guard: an event for another topic never mutates
                    // this view's list.
                    if comment.topic_id != bound_topic {
                        tracing::warn!(
                            event_topic = %comment.topic_id,
                            bound = %bound_topic,
                            "dropping cross-scope comment event"
                        );
                        continue;
                    }
                    state.write().await.apply_created(comment);
                }
                Err(error) => {
                    tracing::warn!(%error, "comment stream fault");
                }
            }
        }
        tracing::debug!("comment created pump stopped");
    })
}

fn spawn_deleted_pump(
    mut rx: EventReceiver<CommentId>,
    state: Arc<RwLock<LiveList<Comment>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(delivery) = rx.recv().await {
            match delivery {
                Ok(id) => {
                    state.write().await.apply_deleted(&id);
                }
                Err(error) => {
                    tracing::warn!(%error, "comment stream fault");
                }
            }
        }
        tracing::debug!("comment deleted pump stopped");
    })
}
