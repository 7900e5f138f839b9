//! End-to-end view behavior against the in-memory backend: mounting,
//! live echoes, submit gating, failure surfacing, scope changes and
//! teardown.

use agora_app::{ThreadView, TopicBoard};
use agora_client::effects::MutationEffects;
use agora_core::{NewComment, StreamError};
use agora_testkit::{test_comment, MemoryForum};
use std::sync::Arc;
use std::time::Duration;

/// Let spawned event pumps drain their channels.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Poll until `probe` succeeds or the deadline passes.
async fn eventually<F, Fut>(mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if probe().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    false
}

#[tokio::test]
async fn board_mounts_with_seeded_snapshot() {
    let forum = Arc::new(MemoryForum::new());
    forum.seed_topic("Graph API").await;
    forum.seed_topic("Component Design").await;

    let mut board = TopicBoard::new(forum.clone());
    assert!(!board.is_ready().await);
    board.mount().await.unwrap();

    assert!(board.is_ready().await);
    let topics = board.topics().await;
    assert_eq!(topics.len(), 2);
    // Newest first: the later seed leads.
    assert_eq!(topics[0].title, "Component Design");
}

#[tokio::test]
async fn board_applies_live_created_events_at_the_head() {
    let forum = Arc::new(MemoryForum::new());
    forum.seed_topic("old").await;

    let mut board = TopicBoard::new(forum.clone());
    board.mount().await.unwrap();
    assert!(board.is_live());

    forum.emit_topic_created(agora_testkit::test_topic(7)).await;
    assert!(
        eventually(|| async { board.topics().await.len() == 2 }).await,
        "live event never reached the board"
    );
    assert_eq!(board.topics().await[0].id.as_str(), "topic-7");
}

#[tokio::test]
async fn board_submit_inserts_via_the_live_echo_exactly_once() {
    let forum = Arc::new(MemoryForum::new());
    let mut board = TopicBoard::new(forum.clone());
    board.mount().await.unwrap();

    board.set_draft("Templates");
    assert!(board.submit().await);

    assert_eq!(board.last_notice(), Some("New Topic Created!"));
    assert_eq!(board.composer().draft(), "");
    assert!(!board.composer().is_in_flight());

    assert!(eventually(|| async { board.topics().await.len() == 1 }).await);
    settle().await;
    let topics = board.topics().await;
    assert_eq!(topics.len(), 1, "echo must be de-duplicated");
    assert_eq!(topics[0].title, "Templates");
}

#[tokio::test]
async fn empty_submit_is_rejected_before_any_request() {
    let forum = Arc::new(MemoryForum::new());
    let mut board = TopicBoard::new(forum.clone());
    board.mount().await.unwrap();

    assert!(!board.submit().await);
    assert_eq!(forum.mutation_requests(), 0);
    assert!(!board.composer().is_in_flight());
    assert!(board.last_error().is_none());
}

#[tokio::test]
async fn mutation_failure_surfaces_all_causes_and_keeps_the_draft() {
    let forum = Arc::new(MemoryForum::new());
    let mut board = TopicBoard::new(forum.clone());
    board.mount().await.unwrap();

    forum.fail_next_mutation(&["too long", "profane"]).await;
    board.set_draft("spam");
    assert!(board.submit().await);

    assert_eq!(board.last_error(), Some("too long\nprofane"));
    assert!(board.last_notice().is_none());
    assert_eq!(board.composer().draft(), "spam");
    assert!(!board.composer().is_in_flight());

    // Retry with the preserved draft succeeds and clears the error.
    assert!(board.submit().await);
    assert!(board.last_error().is_none());
}

#[tokio::test]
async fn snapshot_failure_leaves_loading_and_remount_retries() {
    let forum = Arc::new(MemoryForum::new());
    forum.seed_topic("first").await;

    let mut board = TopicBoard::new(forum.clone());
    forum.fail_next_fetch("backend down").await;
    let err = board.mount().await.unwrap_err();
    assert!(err.message.contains("backend down"));
    assert!(!board.is_ready().await);
    assert_eq!(board.last_error(), Some("fetch failed: backend down"));

    // Remount is the retry path.
    board.mount().await.unwrap();
    assert!(board.is_ready().await);
    assert!(board.last_error().is_none());
}

#[tokio::test]
async fn thread_loads_header_and_comment_page() {
    let forum = Arc::new(MemoryForum::new());
    let topic = forum.seed_topic("Graph API").await;
    forum.seed_comment(&topic.id, "bob", "first!").await;
    forum.seed_comment(&topic.id, "carol", "second").await;

    let mut thread = ThreadView::new(forum.clone());
    thread.load(topic.id.clone()).await.unwrap();

    assert_eq!(thread.topic().map(|t| t.title.as_str()), Some("Graph API"));
    assert!(thread.is_ready().await);
    let comments = thread.comments().await;
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].owner, "carol");
}

#[tokio::test]
async fn thread_scope_change_tears_down_the_old_stream() {
    let forum = Arc::new(MemoryForum::new());
    let a = forum.seed_topic("A").await;
    let b = forum.seed_topic("B").await;

    let mut thread = ThreadView::new(forum.clone());
    thread.load(a.id.clone()).await.unwrap();
    thread.load(b.id.clone()).await.unwrap();

    // Topic A's channels were closed by the scope change.
    assert!(!forum.has_open_comment_channels(&a.id).await);

    // A late event for topic A must not reach topic B's list.
    forum.emit_comment_created(test_comment(&a.id, 9)).await;
    settle().await;
    assert!(thread.comments().await.is_empty());

    // Topic B's own events still arrive.
    forum
        .create_comment(NewComment {
            topic_id: b.id.clone(),
            content: "in B".into(),
        })
        .await
        .unwrap();
    assert!(eventually(|| async { thread.comments().await.len() == 1 }).await);
    assert_eq!(thread.comments().await[0].content, "in B");
}

#[tokio::test]
async fn thread_unmount_closes_both_channels() {
    let forum = Arc::new(MemoryForum::new());
    let topic = forum.seed_topic("A").await;

    let mut thread = ThreadView::new(forum.clone());
    thread.load(topic.id.clone()).await.unwrap();
    assert!(forum.has_open_comment_channels(&topic.id).await);

    thread.unmount();
    assert!(!forum.has_open_comment_channels(&topic.id).await);
    assert!(!thread.is_ready().await);
}

#[tokio::test]
async fn delete_fires_only_after_confirmation() {
    let forum = Arc::new(MemoryForum::new());
    let topic = forum.seed_topic("A").await;
    let comment = forum.seed_comment(&topic.id, "bob", "delete me").await;

    let mut thread = ThreadView::new(forum.clone());
    thread.load(topic.id.clone()).await.unwrap();
    assert_eq!(thread.comments().await.len(), 1);

    // Requesting alone issues nothing.
    thread.request_delete(comment.id.clone());
    assert_eq!(forum.mutation_requests(), 0);

    // Cancel closes the gate; confirm afterwards is a no-op.
    thread.cancel_delete();
    assert!(!thread.confirm_delete().await);
    assert_eq!(forum.mutation_requests(), 0);

    // Request then confirm issues the delete; the list empties via the echo.
    thread.request_delete(comment.id.clone());
    assert!(thread.confirm_delete().await);
    assert_eq!(forum.mutation_requests(), 1);
    assert_eq!(thread.last_notice(), Some("Deleted a comment"));
    assert!(eventually(|| async { thread.comments().await.is_empty() }).await);
}

#[tokio::test]
async fn stream_fault_does_not_close_the_live_channel() {
    let forum = Arc::new(MemoryForum::new());
    let topic = forum.seed_topic("A").await;

    let mut thread = ThreadView::new(forum.clone());
    thread.load(topic.id.clone()).await.unwrap();

    forum
        .emit_comment_fault(&topic.id, StreamError::Parse("garbled payload".into()))
        .await;
    settle().await;

    // The fault was logged; deliveries after it still arrive.
    forum
        .create_comment(NewComment {
            topic_id: topic.id.clone(),
            content: "still live".into(),
        })
        .await
        .unwrap();
    assert!(eventually(|| async { thread.comments().await.len() == 1 }).await);
}

#[tokio::test]
async fn submit_on_unbound_thread_is_rejected() {
    let forum = Arc::new(MemoryForum::new());
    let mut thread = ThreadView::new(forum.clone());
    thread.set_draft("into the void");
    assert!(!thread.submit().await);
    assert_eq!(forum.mutation_requests(), 0);
}
