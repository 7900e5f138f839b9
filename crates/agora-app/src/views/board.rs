//! Topic board view core
//!
//! The forum's front page: the list of all topics, live-updated, plus the
//! new-topic composer. Mounting opens the created-topics channel and fetches
//! the snapshot; the spawned pump applies live events to the shared list.
//! Each mount owns a fresh state handle, so a pump left over from an earlier
//! mount can never write into the current one.

use crate::composer::Composer;
use crate::views::live_list::{ListPhase, LiveList};
use agora_client::channel::{ChannelHandle, EventReceiver};
use agora_client::effects::{MutationEffects, QueryEffects, SubscriptionEffects};
use agora_core::{CollectionScope, FetchError, NewTopic, Topic};
use async_lock::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// One mounted live channel with its event pump.
struct LiveBinding {
    handle: ChannelHandle,
    pump: JoinHandle<()>,
}

impl LiveBinding {
    fn teardown(mut self) {
        self.handle.close();
        self.pump.abort();
    }
}

/// Headless topic-board view.
pub struct TopicBoard<B> {
    backend: Arc<B>,
    state: Arc<RwLock<LiveList<Topic>>>,
    composer: Composer,
    live: Option<LiveBinding>,
    last_error: Option<String>,
    last_notice: Option<String>,
}

impl<B> TopicBoard<B>
where
    B: QueryEffects + MutationEffects + SubscriptionEffects + Send + Sync + 'static,
{
    /// A board that has not been mounted yet.
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(LiveList::new(CollectionScope::Topics))),
            composer: Composer::new(),
            live: None,
            last_error: None,
            last_notice: None,
        }
    }

    /// Activate the view: open the live channel, then fetch the snapshot.
    ///
    /// An unreachable live stream degrades the view (no live updates) but
    /// does not block it; a failed snapshot leaves the view in `Loading`
    /// with the error surfaced, and remounting is the retry path.
    pub async fn mount(&mut self) -> Result<(), FetchError> {
        self.unmount();
        let state = Arc::new(RwLock::new(LiveList::new(CollectionScope::Topics)));
        self.state = state.clone();

        match self.backend.on_create_topic().await {
            Ok(channel) => {
                let (handle, rx) = channel.split();
                let pump = spawn_created_pump(rx, state);
                self.live = Some(LiveBinding { handle, pump });
            }
            Err(error) => {
                tracing::warn!(%error, "topic live stream unavailable");
            }
        }

        let page = match self.backend.list_topics().await {
            Ok(page) => page,
            Err(error) => {
                self.last_error = Some(error.to_string());
                return Err(error);
            }
        };
        self.state
            .write()
            .await
            .apply_snapshot(&CollectionScope::Topics, page);
        self.last_error = None;
        tracing::info!("topic board mounted");
        Ok(())
    }

    /// Submit the composer draft as a new topic. Returns `true` when a
    /// request was issued (the gate was open); the outcome lands in
    /// `last_notice` or `last_error`. The list itself is updated by the
    /// live echo of the created topic, not here.
    pub async fn submit(&mut self) -> bool {
        if !self.composer.can_submit() {
            return false;
        }
        let title = self.composer.begin();
        match self.backend.create_topic(NewTopic { title }).await {
            Ok(topic) => {
                tracing::debug!(topic = %topic.id, "topic created");
                self.composer.finish_ok();
                self.last_error = None;
                self.last_notice = Some("New Topic Created!".to_string());
            }
            Err(error) => {
                self.composer.finish_err();
                self.last_notice = None;
                self.last_error = Some(error.to_string());
            }
        }
        true
    }

    /// Topics in render order (newest first).
    pub async fn topics(&self) -> Vec<Topic> {
        self.state.read().await.items().to_vec()
    }

    /// Current render phase of the list.
    pub async fn phase(&self) -> ListPhase {
        self.state.read().await.phase()
    }

    /// Whether the snapshot has been applied.
    pub async fn is_ready(&self) -> bool {
        self.state.read().await.is_ready()
    }

    /// The new-topic composer.
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

    /// Whether a live channel is currently open.
    pub fn is_live(&self) -> bool {
        self.live
            .as_ref()
            .map(|live| !live.handle.is_closed())
            .unwrap_or(false)
    }

    /// Deactivate the view, closing the live channel and its pump.
    pub fn unmount(&mut self) {
        if let Some(live) = self.live.take() {
            live.teardown();
        }
    }
}

impl<B> Drop for TopicBoard<B> {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            live.teardown();
        }
    }
}

fn spawn_created_pump(
    mut rx: EventReceiver<Topic>,
    state: Arc<RwLock<LiveList<Topic>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(delivery) = rx.recv().await {
            match delivery {
                Ok(topic) => {
                    state.write().await.apply_created(topic);
                }
                Err(error) => {
                    // Non-fatal: log and keep the stream open.
                    tracing::warn!(%error, "topic stream fault");
                }
            }
        }
        tracing::debug!("topic pump stopped");
    })
}
