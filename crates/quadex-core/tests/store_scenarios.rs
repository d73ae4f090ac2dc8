//! # Store Scenarios
//!
//! End-to-end behaviour of `QuadStore` and its cursors against the in-memory
//! index: idempotent writes, enumeration, look-ups, and the error paths of
//! scroll paging.

use quadex_core::{
    CursorState, Delta, Direction, IndexClient, MemoryIndex, PageSource, Quad, QuadStore, QuadexError,
    ResultKind, StoreConfig, Value, quad_id,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::time::Duration;

// =============================================================================
// HELPERS
// =============================================================================

fn config(batch_size: usize) -> StoreConfig {
    StoreConfig {
        batch_size,
        handoff_capacity: 1,
        ..StoreConfig::default()
    }
}

fn store_with(batch_size: usize) -> QuadStore<MemoryIndex> {
    QuadStore::new(MemoryIndex::new(), config(batch_size)).expect("store")
}

fn chain(n: usize) -> Vec<Delta> {
    (0..n)
        .map(|i| Delta::add(Quad::triple(format!("n{i}"), "next", format!("n{}", i + 1))))
        .collect()
}

async fn drain<P: PageSource>(cursor: &mut quadex_core::Cursor<P>) -> Vec<Value> {
    let mut out = Vec::new();
    while cursor.advance().await.expect("advance") {
        out.push(cursor.result().expect("result").clone());
    }
    out
}

async fn wait_for_release(index: &MemoryIndex) -> bool {
    for _ in 0..200 {
        if index.open_scrolls().await == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[tokio::test]
async fn three_quads_lookup_and_node_enumeration() {
    let store = store_with(2);
    let knows_ab = Quad::triple("A", "knows", "B");
    let knows_bc = Quad::triple("B", "knows", "C");
    let likes_ac = Quad::triple("A", "likes", "C");
    store
        .apply_writes(&[
            Delta::add(knows_ab.clone()),
            Delta::add(knows_bc),
            Delta::add(likes_ac.clone()),
        ])
        .await
        .expect("writes");

    let mut by_subject = store
        .quads_by_direction(Direction::Subject, &store.value_of("A"))
        .await
        .expect("lookup");
    assert_eq!(by_subject.size(), 2);
    let ids: BTreeSet<Value> = drain(&mut by_subject).await.into_iter().collect();
    let expected: BTreeSet<Value> = [quad_id(&knows_ab), quad_id(&likes_ac)]
        .into_iter()
        .map(Value::from)
        .collect();
    assert_eq!(ids, expected);

    let mut nodes = store.all_nodes().await.expect("nodes");
    let names: Vec<Value> = drain(&mut nodes).await;
    let distinct: BTreeSet<&str> = names.iter().map(Value::as_str).collect();
    assert_eq!(names.len(), 5);
    assert_eq!(
        distinct,
        BTreeSet::from(["A", "B", "C", "knows", "likes"])
    );
}

#[tokio::test]
async fn resolve_unknown_id_is_not_found() {
    let store = store_with(10);
    let never_written = Value::from(quad_id(&Quad::triple("X", "y", "Z")));
    assert!(matches!(
        store.resolve_quad(&never_written).await,
        Err(QuadexError::NotFound { .. })
    ));
    assert!(matches!(
        store.quad_direction(&never_written, Direction::Object).await,
        Err(QuadexError::NotFound { .. })
    ));
}

#[tokio::test]
async fn size_after_ten_thousand_writes() {
    let store = store_with(100);
    let summary = store.apply_writes(&chain(10_000)).await.expect("writes");
    assert_eq!(summary.quads_written, 10_000);

    let mut size = 0;
    for _ in 0..50 {
        size = store.size().await.expect("size");
        if size == 10_000 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(size, 10_000);
}

#[tokio::test]
async fn repeated_delta_is_idempotent() {
    let store = store_with(10);
    let delta = Delta::add(Quad::new("A", "knows", "B", "g"));
    store.apply_writes(&[delta.clone()]).await.expect("first");
    let after_first = store.size().await.expect("size");
    store.apply_writes(&[delta]).await.expect("second");

    assert_eq!(after_first, 1);
    assert_eq!(store.size().await.expect("size"), 1);
    assert_eq!(store.node_count().await.expect("nodes"), 4);
}

#[tokio::test]
async fn resolve_returns_written_quad() {
    let store = store_with(10);
    let quad = Quad::new("A", "knows", "B", "g");
    store
        .apply_writes(&[Delta::add(quad.clone())])
        .await
        .expect("writes");
    let id = Value::from(quad_id(&quad));
    assert_eq!(store.resolve_quad(&id).await.expect("resolve"), quad);
}

// =============================================================================
// ENUMERATION
// =============================================================================

#[tokio::test]
async fn full_enumeration_yields_each_quad_once() {
    let store = store_with(7);
    store.apply_writes(&chain(50)).await.expect("writes");

    let mut cursor = store.all_quads().await.expect("quads");
    assert_eq!(cursor.size(), 50);
    let ids = drain(&mut cursor).await;
    assert_eq!(ids.len(), 50);
    assert_eq!(ids.iter().collect::<BTreeSet<_>>().len(), 50);

    assert_eq!(cursor.state(), CursorState::Exhausted);
    for _ in 0..3 {
        assert!(!cursor.advance().await.expect("advance"));
    }
    assert!(wait_for_release(store.client()).await);
}

#[tokio::test]
async fn quad_cursor_exposes_decoded_quads() {
    let store = store_with(3);
    store.apply_writes(&chain(5)).await.expect("writes");

    let mut cursor = store
        .quads_by_direction(Direction::Predicate, &store.value_of("next"))
        .await
        .expect("lookup");
    while cursor.advance().await.expect("advance") {
        let quad = cursor.result_quad().expect("quad").clone();
        let id = cursor.result().expect("result");
        assert_eq!(id, &Value::from(quad_id(&quad)));
        assert_eq!(quad.predicate, "next");
    }
}

#[tokio::test]
async fn reset_reproduces_sequence() {
    let store = store_with(4);
    store.apply_writes(&chain(15)).await.expect("writes");

    let mut cursor = store.all_quads().await.expect("quads");
    let first = drain(&mut cursor).await;
    cursor.reset();
    assert!(cursor.result().is_err());
    let second = drain(&mut cursor).await;
    assert_eq!(first, second);

    let mut lookup = store
        .quads_by_direction(Direction::Predicate, &store.value_of("next"))
        .await
        .expect("lookup");
    let first = drain(&mut lookup).await;
    lookup.reset();
    assert_eq!(drain(&mut lookup).await, first);
}

#[tokio::test]
async fn clone_is_independent() {
    let store = store_with(3);
    store.apply_writes(&chain(10)).await.expect("writes");

    let mut original = store.all_nodes().await.expect("nodes");
    assert!(original.advance().await.expect("advance"));
    assert!(original.advance().await.expect("advance"));
    let held = original.result().expect("result").clone();

    // n0..n10 plus the predicate.
    let mut clone = original.fresh_clone();
    assert_eq!(drain(&mut clone).await.len(), 12);

    assert_eq!(original.position(), 2);
    assert_eq!(original.result().expect("result"), &held);
    assert_eq!(drain(&mut original).await.len(), 10);
}

#[tokio::test]
async fn contains_leaves_position_untouched() {
    let store = store_with(2);
    store.apply_writes(&chain(6)).await.expect("writes");

    let mut cursor = store.all_nodes().await.expect("nodes");
    assert!(cursor.advance().await.expect("advance"));
    let current = cursor.result().expect("result").clone();
    assert!(cursor.contains(&store.value_of("n6")).await.expect("contains"));
    assert!(!cursor.contains(&store.value_of("n99")).await.expect("contains"));
    assert_eq!(cursor.position(), 1);
    assert_eq!(cursor.result().expect("result"), &current);
    assert!(cursor.stats().contains_cost > cursor.stats().next_cost);
}

#[tokio::test]
async fn malformed_documents_are_skipped() {
    let store = store_with(2);
    store.apply_writes(&chain(3)).await.expect("writes");
    store
        .client()
        .put("quads", "broken", &json!({ "s": "A", "p": 7 }))
        .await
        .expect("put");

    let mut cursor = store.all_quads().await.expect("quads");
    assert_eq!(cursor.size(), 4);
    assert_eq!(drain(&mut cursor).await.len(), 3);
    assert_eq!(cursor.skipped(), 1);
}

// =============================================================================
// ERROR PATHS & RESOURCES
// =============================================================================

#[tokio::test]
async fn transport_failure_is_an_error_not_zero() {
    let store = store_with(10);
    store.apply_writes(&chain(2)).await.expect("writes");
    store.client().set_unavailable(true).await;

    assert!(matches!(store.size().await, Err(QuadexError::Transport(_))));
    assert!(matches!(
        store.all_nodes().await,
        Err(QuadexError::Transport(_))
    ));
    assert!(matches!(
        store
            .quads_by_direction(Direction::Subject, &store.value_of("n0"))
            .await,
        Err(QuadexError::Transport(_))
    ));
}

#[tokio::test]
async fn transport_failure_mid_enumeration_ends_cursor() {
    let store = store_with(2);
    store.apply_writes(&chain(20)).await.expect("writes");

    let mut cursor = store.all_quads().await.expect("quads");
    assert!(cursor.advance().await.expect("advance"));
    store.client().set_unavailable(true).await;

    let mut failed = false;
    for _ in 0..20 {
        match cursor.advance().await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                assert!(matches!(e, QuadexError::Transport(_)));
                failed = true;
                break;
            }
        }
    }
    assert!(failed);
    assert_eq!(cursor.state(), CursorState::Exhausted);
}

#[tokio::test]
async fn expired_scroll_resumes_without_duplicates() {
    let store = store_with(2);
    store.apply_writes(&chain(20)).await.expect("writes");

    let mut reference = store.all_nodes().await.expect("nodes");
    let expected = drain(&mut reference).await;

    let mut cursor = store.all_nodes().await.expect("nodes");
    let mut seen = Vec::new();
    for _ in 0..3 {
        assert!(cursor.advance().await.expect("advance"));
        seen.push(cursor.result().expect("result").clone());
    }
    store.client().expire_scrolls().await;
    seen.extend(drain(&mut cursor).await);

    assert_eq!(seen, expected);
}

#[tokio::test]
async fn close_releases_scroll_session() {
    let store = store_with(2);
    store.apply_writes(&chain(30)).await.expect("writes");

    let mut cursor = store.all_quads().await.expect("quads");
    assert!(cursor.advance().await.expect("advance"));
    assert!(store.client().open_scrolls().await >= 1);

    cursor.close();
    cursor.close();
    assert!(!cursor.advance().await.expect("advance"));
    assert!(wait_for_release(store.client()).await);
}

#[tokio::test]
async fn dropped_cursor_releases_scroll_session() {
    let store = store_with(2);
    store.apply_writes(&chain(30)).await.expect("writes");

    {
        let mut cursor = store.all_nodes().await.expect("nodes");
        assert!(cursor.advance().await.expect("advance"));
    }
    assert!(wait_for_release(store.client()).await);
}

#[tokio::test]
async fn tags_bind_current_result() {
    let store = store_with(5);
    store.apply_writes(&chain(2)).await.expect("writes");

    let mut cursor = store
        .quads_by_direction(Direction::Subject, &store.value_of("n0"))
        .await
        .expect("lookup");
    cursor.tagger_mut().add("edge");
    cursor
        .tagger_mut()
        .add_fixed("source", store.value_of("n0"));

    assert!(cursor.advance().await.expect("advance"));
    let mut tags = std::collections::BTreeMap::new();
    cursor.collect_tags(&mut tags).expect("tags");
    assert_eq!(tags.get("edge"), Some(cursor.result().expect("result")));
    assert_eq!(tags.get("source"), Some(&store.value_of("n0")));

    let description = cursor.describe();
    assert_eq!(description.uid, cursor.uid());
    assert_eq!(description.size, 1);
}

// =============================================================================
// RESULT WINDOW
// =============================================================================

fn windowed_store(window: u64) -> (MemoryIndex, QuadStore<MemoryIndex>) {
    let index = MemoryIndex::new();
    let config = StoreConfig {
        batch_size: 100,
        max_result_window: window,
        handoff_capacity: 1,
        ..StoreConfig::default()
    };
    let store = QuadStore::new(index.clone(), config).expect("store");
    (index, store)
}

#[tokio::test]
async fn lookup_larger_than_window_completes() {
    let (index, store) = windowed_store(250);
    index.set_max_result_window(Some(250)).await;
    store.apply_writes(&chain(600)).await.expect("writes");

    let mut cursor = store
        .quads_by_direction(Direction::Predicate, &store.value_of("next"))
        .await
        .expect("lookup");
    assert_eq!(cursor.size(), 600);
    let ids: BTreeSet<Value> = drain(&mut cursor).await.into_iter().collect();
    assert_eq!(ids.len(), 600);
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(wait_for_release(&index).await);
}

#[tokio::test]
async fn lookup_filling_window_uses_offsets() {
    let (index, store) = windowed_store(250);
    index.set_max_result_window(Some(250)).await;
    store.apply_writes(&chain(250)).await.expect("writes");

    let mut cursor = store
        .quads_by_direction(Direction::Predicate, &store.value_of("next"))
        .await
        .expect("lookup");
    assert_eq!(drain(&mut cursor).await.len(), 250);
    assert_eq!(index.open_scrolls().await, 0);
}

// =============================================================================
// FIXED CURSOR
// =============================================================================

fn values(names: &[&str]) -> Vec<Value> {
    names.iter().map(|n| Value::new(*n)).collect()
}

#[tokio::test]
async fn fixed_cursor_add_contains_reset() {
    let store = store_with(2);
    let mut cursor = store.fixed_cursor(values(&["b", "a", "c"]));
    assert_eq!(cursor.kind(), ResultKind::Values);
    assert_eq!(cursor.size(), 3);

    assert!(cursor.contains(&store.value_of("a")).await.expect("contains"));
    assert!(!cursor.contains(&store.value_of("z")).await.expect("contains"));
    assert!(cursor.add(store.value_of("z")));
    assert!(cursor.contains(&store.value_of("z")).await.expect("contains"));
    assert_eq!(cursor.size(), 4);

    assert_eq!(drain(&mut cursor).await, values(&["b", "a", "c", "z"]));
    assert!(cursor.result_quad().is_err());

    // An exhausted fixed cursor picks up values added afterwards.
    assert!(cursor.add(store.value_of("y")));
    assert!(cursor.advance().await.expect("advance"));
    assert_eq!(cursor.result().expect("result"), &store.value_of("y"));
    assert!(!cursor.advance().await.expect("advance"));

    cursor.reset();
    assert_eq!(drain(&mut cursor).await, values(&["b", "a", "c", "z", "y"]));

    let mut clone = cursor.fresh_clone();
    assert_eq!(drain(&mut clone).await.len(), 5);
    assert_eq!(store.client().request_count().await, 0);
}

#[tokio::test]
async fn add_is_refused_by_index_cursors_and_closed_cursors() {
    let store = store_with(2);
    store.apply_writes(&chain(2)).await.expect("writes");

    let mut nodes = store.all_nodes().await.expect("nodes");
    assert!(!nodes.add(store.value_of("extra")));
    assert_eq!(nodes.size(), 4);
    nodes.close();

    let mut fixed = store.fixed_cursor(values(&["a"]));
    fixed.close();
    assert!(!fixed.add(store.value_of("b")));
    assert_eq!(fixed.size(), 1);
    assert!(!fixed.advance().await.expect("advance"));
}
