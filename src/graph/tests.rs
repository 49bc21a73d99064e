use uuid::Uuid;

use crate::graph::memory::MemoryStore;
use crate::graph::{
    GraphError, PageLimits, PageRequest, PairKey, RelationshipGraph, StoreError, ValidationReason,
};
use crate::models::RelationshipStatus;

struct Fixture {
    graph: RelationshipGraph<MemoryStore>,
    alice: Uuid,
    bob: Uuid,
    carol: Uuid,
}

fn fixture() -> Fixture {
    let mut store = MemoryStore::new();
    let alice = store.add_account("alice", "Alice Liddell");
    let bob = store.add_account("bob", "Bob Builder");
    let carol = store.add_account("carol", "Carol Danvers");

    Fixture {
        graph: RelationshipGraph::new(store, PageLimits::default()),
        alice,
        bob,
        carol,
    }
}

fn first_page() -> PageRequest {
    PageRequest::new(None, None, None, &PageLimits::default()).unwrap()
}

fn store(f: &Fixture) -> &MemoryStore {
    &f.graph.store
}

fn assert_validation(result: Result<(), GraphError>, reason: ValidationReason) {
    match result {
        Err(GraphError::Validation(r)) => assert_eq!(r, reason),
        other => panic!("expected {reason:?}, got {other:?}"),
    }
}

async fn pending_request(f: &Fixture, receiver: Uuid) -> Uuid {
    let page = f
        .graph
        .list_incoming_requests(receiver, &first_page())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    page.items[0].uuid
}

#[test]
fn pair_key_ignores_direction() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();

    assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
    assert_eq!(PairKey::new(a, b).as_str().len(), 73);
    assert_ne!(PairKey::new(a, b), PairKey::new(a, Uuid::new_v4()));
}

#[tokio::test]
async fn duplicate_request_is_rejected_in_both_directions() {
    let f = fixture();

    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();

    assert_validation(
        f.graph.send_friend_request(f.alice, f.bob).await,
        ValidationReason::RelationshipExists,
    );
    assert_validation(
        f.graph.send_friend_request(f.bob, f.alice).await,
        ValidationReason::RelationshipExists,
    );
    assert_eq!(store(&f).edge_count(), 1);
}

#[tokio::test]
async fn request_to_self_is_rejected() {
    let f = fixture();

    assert_validation(
        f.graph.send_friend_request(f.alice, f.alice).await,
        ValidationReason::CannotFriendSelf,
    );

    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();
    assert_validation(
        f.graph.send_friend_request(f.alice, f.alice).await,
        ValidationReason::CannotFriendSelf,
    );
}

#[tokio::test]
async fn request_to_unknown_account_is_rejected() {
    let f = fixture();

    assert_validation(
        f.graph.send_friend_request(f.alice, Uuid::new_v4()).await,
        ValidationReason::TargetNotFound,
    );
    assert_eq!(store(&f).edge_count(), 0);
}

#[tokio::test]
async fn lost_insert_race_is_reported_as_existing_relationship() {
    let f = fixture();

    store(&f).occupy_next_inserts(1);
    assert_validation(
        f.graph.send_friend_request(f.alice, f.bob).await,
        ValidationReason::RelationshipExists,
    );
}

#[tokio::test]
async fn failing_insert_is_reported_as_store_error() {
    let f = fixture();

    store(&f).break_next_insert();
    assert!(matches!(
        f.graph.send_friend_request(f.alice, f.bob).await,
        Err(GraphError::Store(StoreError::Database(_)))
    ));
    assert_eq!(store(&f).edge_count(), 0);
}

#[tokio::test]
async fn request_is_listed_for_both_sides() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();

    let incoming = f
        .graph
        .list_incoming_requests(f.bob, &first_page())
        .await
        .unwrap();
    assert_eq!(incoming.total, 1);
    assert_eq!(incoming.items[0].sender.uuid, f.alice);
    assert_eq!(incoming.items[0].status, RelationshipStatus::FriendRequest);

    let sent = f
        .graph
        .list_sent_requests(f.alice, &first_page())
        .await
        .unwrap();
    assert_eq!(sent.total, 1);
    assert_eq!(sent.items[0].receiver.uuid, f.bob);

    // Not mirrored to the other listing
    assert_eq!(
        f.graph
            .list_incoming_requests(f.alice, &first_page())
            .await
            .unwrap()
            .total,
        0
    );
    assert_eq!(
        f.graph
            .list_sent_requests(f.bob, &first_page())
            .await
            .unwrap()
            .total,
        0
    );
}

#[tokio::test]
async fn accepted_request_becomes_friendship_for_both() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();
    let request = pending_request(&f, f.bob).await;

    f.graph.accept_friend_request(f.bob, request).await.unwrap();

    let of_alice = f.graph.list_friends(f.alice, &first_page()).await.unwrap();
    let of_bob = f.graph.list_friends(f.bob, &first_page()).await.unwrap();

    assert_eq!(of_alice.total, 1);
    assert_eq!(of_alice.items[0].uuid, request);
    assert_eq!(of_alice.items[0].status, RelationshipStatus::Friend);
    assert_eq!(of_alice.items[0].other_party(f.alice).uuid, f.bob);

    assert_eq!(of_bob.total, 1);
    assert_eq!(of_bob.items[0].other_party(f.bob).uuid, f.alice);

    assert!(f
        .graph
        .list_incoming_requests(f.bob, &first_page())
        .await
        .unwrap()
        .items
        .is_empty());
    assert!(f
        .graph
        .list_sent_requests(f.alice, &first_page())
        .await
        .unwrap()
        .items
        .is_empty());
}

#[tokio::test]
async fn request_is_invisible_to_everyone_but_the_receiver() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();
    let request = pending_request(&f, f.bob).await;

    for caller in [f.alice, f.carol] {
        assert!(matches!(
            f.graph.get_request(caller, request).await,
            Err(GraphError::NotFound)
        ));
        assert!(matches!(
            f.graph.accept_friend_request(caller, request).await,
            Err(GraphError::NotFound)
        ));
        assert!(matches!(
            f.graph.reject_friend_request(caller, request).await,
            Err(GraphError::NotFound)
        ));
    }

    let view = f.graph.get_request(f.bob, request).await.unwrap();
    assert_eq!(view.sender.uuid, f.alice);
    assert_eq!(view.receiver.uuid, f.bob);
    assert_eq!(
        store(&f).edges_between(f.alice, f.bob)[0].status,
        RelationshipStatus::FriendRequest
    );
}

#[tokio::test]
async fn accepted_request_is_no_longer_a_request() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();
    let request = pending_request(&f, f.bob).await;
    f.graph.accept_friend_request(f.bob, request).await.unwrap();

    assert!(matches!(
        f.graph.get_request(f.bob, request).await,
        Err(GraphError::NotFound)
    ));
    assert!(matches!(
        f.graph.accept_friend_request(f.bob, request).await,
        Err(GraphError::NotFound)
    ));
    assert!(matches!(
        f.graph.reject_friend_request(f.bob, request).await,
        Err(GraphError::NotFound)
    ));
    assert!(matches!(
        f.graph.get_request(f.bob, Uuid::new_v4()).await,
        Err(GraphError::NotFound)
    ));
}

#[tokio::test]
async fn rejected_request_leaves_no_trace() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();
    let request = pending_request(&f, f.bob).await;

    f.graph.reject_friend_request(f.bob, request).await.unwrap();

    assert!(store(&f).edges_between(f.alice, f.bob).is_empty());
    f.graph.send_friend_request(f.bob, f.alice).await.unwrap();
    assert_eq!(
        store(&f).edges_between(f.alice, f.bob)[0].sender,
        f.bob
    );
}

#[tokio::test]
async fn block_replaces_friendship() {
    let f = fixture();
    f.graph.send_friend_request(f.bob, f.alice).await.unwrap();
    let request = pending_request(&f, f.alice).await;
    f.graph.accept_friend_request(f.alice, request).await.unwrap();

    f.graph.block_user(f.alice, f.bob).await.unwrap();

    let edges = store(&f).edges_between(f.alice, f.bob);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].status, RelationshipStatus::Blocked);
    assert_eq!(edges[0].sender, f.alice);
    assert_eq!(edges[0].receiver, f.bob);

    assert!(f
        .graph
        .list_friends(f.bob, &first_page())
        .await
        .unwrap()
        .items
        .is_empty());
}

#[tokio::test]
async fn block_replaces_pending_request_of_either_direction() {
    let f = fixture();
    f.graph.send_friend_request(f.bob, f.alice).await.unwrap();

    f.graph.block_user(f.bob, f.alice).await.unwrap();

    let edges = store(&f).edges_between(f.alice, f.bob);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].status, RelationshipStatus::Blocked);
    assert_eq!(edges[0].sender, f.bob);
    assert!(f
        .graph
        .list_incoming_requests(f.alice, &first_page())
        .await
        .unwrap()
        .items
        .is_empty());
}

#[tokio::test]
async fn second_block_fails_and_changes_nothing() {
    let f = fixture();
    f.graph.block_user(f.alice, f.bob).await.unwrap();
    let before = store(&f).edges_between(f.alice, f.bob);

    assert_validation(
        f.graph.block_user(f.alice, f.bob).await,
        ValidationReason::AlreadyBlocked,
    );

    assert_eq!(store(&f).edges_between(f.alice, f.bob), before);
}

#[tokio::test]
async fn blocked_account_can_block_back() {
    let f = fixture();
    f.graph.block_user(f.alice, f.bob).await.unwrap();

    f.graph.block_user(f.bob, f.alice).await.unwrap();

    let edges = store(&f).edges_between(f.alice, f.bob);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].sender, f.bob);
    assert_eq!(edges[0].status, RelationshipStatus::Blocked);
}

#[tokio::test]
async fn block_prevents_new_requests() {
    let f = fixture();
    f.graph.block_user(f.alice, f.bob).await.unwrap();

    assert_validation(
        f.graph.send_friend_request(f.bob, f.alice).await,
        ValidationReason::RelationshipExists,
    );
    assert_validation(
        f.graph.send_friend_request(f.alice, f.bob).await,
        ValidationReason::RelationshipExists,
    );
}

#[tokio::test]
async fn block_leaves_unrelated_pairs_alone() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();

    f.graph.block_user(f.carol, f.alice).await.unwrap();

    let blocked = store(&f).edges_between(f.carol, f.alice);
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].sender, f.carol);
    assert_eq!(blocked[0].receiver, f.alice);
    assert_eq!(blocked[0].status, RelationshipStatus::Blocked);

    let untouched = store(&f).edges_between(f.alice, f.bob);
    assert_eq!(untouched.len(), 1);
    assert_eq!(untouched[0].status, RelationshipStatus::FriendRequest);
}

#[tokio::test]
async fn block_preconditions() {
    let f = fixture();

    assert_validation(
        f.graph.block_user(f.alice, f.alice).await,
        ValidationReason::CannotBlockSelf,
    );
    assert_validation(
        f.graph.block_user(f.alice, Uuid::new_v4()).await,
        ValidationReason::TargetNotFound,
    );
    assert_eq!(store(&f).edge_count(), 0);
}

#[tokio::test]
async fn failed_block_keeps_previous_relationship() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();
    let before = store(&f).edges_between(f.alice, f.bob);

    store(&f).break_next_insert();
    assert!(matches!(
        f.graph.block_user(f.bob, f.alice).await,
        Err(GraphError::Store(StoreError::Database(_)))
    ));

    assert_eq!(store(&f).edges_between(f.alice, f.bob), before);
}

#[tokio::test]
async fn block_is_retried_once_after_a_concurrent_write() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();

    store(&f).occupy_next_inserts(1);
    f.graph.block_user(f.bob, f.alice).await.unwrap();

    let edges = store(&f).edges_between(f.alice, f.bob);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].status, RelationshipStatus::Blocked);
    assert_eq!(edges[0].sender, f.bob);
}

#[tokio::test]
async fn block_gives_up_after_two_concurrent_writes() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.bob).await.unwrap();
    let before = store(&f).edges_between(f.alice, f.bob);

    store(&f).occupy_next_inserts(2);
    assert_validation(
        f.graph.block_user(f.bob, f.alice).await,
        ValidationReason::RelationshipExists,
    );

    assert_eq!(store(&f).edges_between(f.alice, f.bob), before);
}

#[tokio::test]
async fn listings_are_newest_first_and_paginated() {
    let mut store = MemoryStore::new();
    let hub = store.add_account("hub", "Hub");
    let senders: Vec<Uuid> = (0..5)
        .map(|i| store.add_account(&format!("user{i}"), &format!("User {i}")))
        .collect();
    let graph = RelationshipGraph::new(store, PageLimits::default());

    for sender in &senders {
        graph.send_friend_request(*sender, hub).await.unwrap();
    }

    let limits = PageLimits::default();
    let first = graph
        .list_incoming_requests(hub, &PageRequest::new(Some(1), Some(2), None, &limits).unwrap())
        .await
        .unwrap();
    let last = graph
        .list_incoming_requests(hub, &PageRequest::new(Some(3), Some(2), None, &limits).unwrap())
        .await
        .unwrap();

    assert_eq!(first.total, 5);
    assert_eq!(
        first.items.iter().map(|v| v.sender.uuid).collect::<Vec<_>>(),
        vec![senders[4], senders[3]]
    );
    assert_eq!(last.total, 5);
    assert_eq!(
        last.items.iter().map(|v| v.sender.uuid).collect::<Vec<_>>(),
        vec![senders[0]]
    );
}

#[tokio::test]
async fn listings_filter_by_other_party_name() {
    let f = fixture();
    f.graph.send_friend_request(f.alice, f.carol).await.unwrap();
    f.graph.send_friend_request(f.bob, f.carol).await.unwrap();

    let search = PageRequest::new(None, None, Some("BUILD"), &PageLimits::default()).unwrap();
    let page = f
        .graph
        .list_incoming_requests(f.carol, &search)
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].sender.uuid, f.bob);

    // The caller's own name never matches
    let search = PageRequest::new(None, None, Some("danvers"), &PageLimits::default()).unwrap();
    assert_eq!(
        f.graph
            .list_incoming_requests(f.carol, &search)
            .await
            .unwrap()
            .total,
        0
    );
}
