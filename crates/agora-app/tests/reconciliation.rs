//! Reconciliation properties of the live list, exercised with the real
//! forum record types.

use agora_app::views::{ListPhase, LiveList};
use agora_core::{CollectionScope, Page, TopicId};
use agora_testkit::test_topic;
use proptest::prelude::*;
use std::collections::HashSet;

fn topic_id(seed: u8) -> TopicId {
    TopicId::new(format!("topic-{seed}"))
}

#[test]
fn snapshot_delete_create_yields_newest_first_without_the_deleted() {
    let mut list = LiveList::new(CollectionScope::Topics);
    let (a, b, c, d) = (test_topic(1), test_topic(2), test_topic(3), test_topic(4));

    assert!(list.apply_snapshot(
        &CollectionScope::Topics,
        Page::of(vec![a.clone(), b.clone(), c.clone()]),
    ));
    assert!(list.apply_deleted(&b.id).is_some());
    assert!(list.apply_created(d.clone()));

    let ids: Vec<_> = list.items().iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, vec![d.id, a.id, c.id]);
}

#[test]
fn repeated_created_with_different_payload_keeps_the_original() {
    let mut list = LiveList::new(CollectionScope::Topics);
    let first = test_topic(1);
    let mut echo = first.clone();
    echo.title = "retitled elsewhere".to_string();

    assert!(list.apply_snapshot(&CollectionScope::Topics, Page::of(vec![first.clone()])));
    assert!(!list.apply_created(echo));

    assert_eq!(list.len(), 1);
    assert_eq!(list.items()[0].title, first.title);
}

#[test]
fn delete_of_unknown_identifier_changes_nothing() {
    let mut list = LiveList::new(CollectionScope::Topics);
    assert!(list.apply_snapshot(&CollectionScope::Topics, Page::of(vec![test_topic(1)])));
    assert!(list.apply_deleted(&topic_id(99)).is_none());
    assert_eq!(list.len(), 1);
    assert!(list.is_ready());
}

#[test]
fn empty_forum_renders_ready_placeholder_not_error() {
    let mut list: LiveList<agora_core::Topic> = LiveList::new(CollectionScope::Topics);
    assert!(list.apply_snapshot(&CollectionScope::Topics, Page::of(vec![])));
    assert_eq!(list.phase(), ListPhase::Ready);
    assert!(list.is_empty());
}

proptest! {
    /// Any interleaving of created/deleted events after a snapshot leaves
    /// the list free of duplicate identifiers and still `Ready`.
    #[test]
    fn no_interleaving_produces_duplicate_identifiers(
        snapshot_seeds in proptest::collection::vec(0u8..8, 0..8),
        ops in proptest::collection::vec((any::<bool>(), 0u8..8), 0..48),
    ) {
        let mut list = LiveList::new(CollectionScope::Topics);
        let snapshot = snapshot_seeds.into_iter().map(test_topic).collect();
        prop_assert!(list.apply_snapshot(&CollectionScope::Topics, Page::of(snapshot)));

        for (is_create, seed) in ops {
            if is_create {
                list.apply_created(test_topic(seed));
            } else {
                list.apply_deleted(&topic_id(seed));
            }
        }

        let mut seen = HashSet::new();
        for item in list.items() {
            prop_assert!(seen.insert(item.id.clone()), "duplicate id {}", item.id);
        }
        prop_assert!(list.is_ready());
    }

    /// Deleting everything that was ever created empties the list.
    #[test]
    fn deletes_cancel_creates(seeds in proptest::collection::vec(0u8..16, 0..16)) {
        let mut list = LiveList::new(CollectionScope::Topics);
        prop_assert!(list.apply_snapshot(&CollectionScope::Topics, Page::of(vec![])));

        for seed in &seeds {
            list.apply_created(test_topic(*seed));
        }
        for seed in &seeds {
            list.apply_deleted(&topic_id(*seed));
        }
        prop_assert!(list.is_empty());
    }
}
