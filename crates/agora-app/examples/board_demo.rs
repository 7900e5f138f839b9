//! Drives the headless forum core against the in-memory backend: resolve a
//! session, mount the board, create a topic, post and delete a comment.
//!
//! Run with `cargo run -p agora-app --example board_demo`.

use agora_app::{Session, ThreadView, TopicBoard};
use agora_client::effects::ForumEffects;
use agora_testkit::MemoryForum;
use std::sync::Arc;

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// The whole user journey, generic over any backend.
async fn run<B>(backend: Arc<B>)
where
    B: ForumEffects + Send + Sync + 'static,
{
    let session = Session::resolve(backend.as_ref()).await.expect("signed in");
    println!("signed in as {}", session.username());

    let mut board = TopicBoard::new(backend.clone());
    board.mount().await.expect("board mounts");

    board.set_draft("Graph API");
    board.submit().await;
    settle().await;

    println!("-- topics --");
    for topic in board.topics().await {
        println!("{}  {}", topic.id, topic.title);
    }

    let first = board.topics().await.remove(0);
    let mut thread = ThreadView::new(backend.clone());
    thread.load(first.id.clone()).await.expect("thread loads");

    thread.set_draft("live updates work");
    thread.submit().await;
    settle().await;

    let title = thread.topic().map(|t| t.title.clone()).unwrap_or_default();
    println!("-- {title} --");
    for comment in thread.comments().await {
        println!("{} ({}): {}", comment.id, comment.owner, comment.content);
    }

    if let Some(comment) = thread.comments().await.first() {
        thread.request_delete(comment.id.clone());
        thread.confirm_delete().await;
        settle().await;
        println!("after delete: {} comments", thread.comments().await.len());
    }

    board.unmount();
    thread.unmount();
    session.sign_out(backend.as_ref()).await.expect("signs out");
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let forum = Arc::new(MemoryForum::with_user("alice"));
    forum.seed_topic("Component Design").await;
    run(forum).await;
}
