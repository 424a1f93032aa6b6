//! Conformance test suite for [`SortedSetStore`] implementations.
//!
//! A set of async test functions that check whether a store satisfies the
//! trait contract the relationship engine relies on. Every store, whether
//! in-memory or backed by a remote server, can run the same suite.
//!
//! # Usage
//!
//! Enable the `testutil` feature and call each function with a fresh store:
//!
//! ```no_run
//! use socialgraph_store::conformance;
//! use socialgraph_store::MemoryStore;
//!
//! #[tokio::test]
//! async fn add_is_insert_if_absent() {
//!     conformance::add_is_insert_if_absent(&MemoryStore::new()).await;
//! }
//! ```
//!
//! # Test Categories
//!
//! | Category | Contract aspect |
//! |----------|-----------------|
//! | Membership | add/remove/contains/score/cardinality semantics |
//! | Range | rank windows, ordering, tie-breaking, out-of-range windows |
//! | Pipeline | all-or-nothing commit, ordering, drop discards |
//! | Concurrent | thread-safety under parallel writers |
//! | Errors | argument validation, health |

use std::sync::Arc;

use bytes::Bytes;

use crate::{
    backend::SortedSetStore, error::StoreError, health::HealthProbe, testutil::make_member,
    types::RangeOrder,
};

fn as_strs(members: &[Bytes]) -> Vec<&str> {
    members.iter().map(|m| std::str::from_utf8(m).expect("utf-8 member")).collect()
}

// ============================================================================
// Membership
// ============================================================================

/// Reads of a set that was never written behave like an empty set.
pub async fn missing_set_is_empty<S: SortedSetStore>(store: &S) {
    assert_eq!(store.cardinality(b"c:missing").await.expect("cardinality"), 0);
    assert_eq!(store.score(b"c:missing", b"x").await.expect("score"), None);
    assert!(!store.contains(b"c:missing", b"x").await.expect("contains"));
    assert!(store.range_desc(b"c:missing", 0..=9).await.expect("range").is_empty());
}

/// `add` reports insertion and keeps the first score on re-insert.
pub async fn add_is_insert_if_absent<S: SortedSetStore>(store: &S) {
    assert!(store.add(b"c:add", b"a".to_vec(), 1.0).await.expect("first add"));
    assert!(!store.add(b"c:add", b"a".to_vec(), 50.0).await.expect("second add"));
    assert_eq!(store.score(b"c:add", b"a").await.expect("score"), Some(1.0));
    assert_eq!(store.cardinality(b"c:add").await.expect("cardinality"), 1);
}

/// `remove` reports whether the member was present.
pub async fn remove_reports_presence<S: SortedSetStore>(store: &S) {
    store.add(b"c:rm", b"a".to_vec(), 1.0).await.expect("add");
    assert!(store.remove(b"c:rm", b"a").await.expect("remove present"));
    assert!(!store.remove(b"c:rm", b"a").await.expect("remove absent"));
    assert!(!store.remove(b"c:rm-missing", b"a").await.expect("remove from missing set"));
}

/// Sets under different keys are independent.
pub async fn keys_are_independent<S: SortedSetStore>(store: &S) {
    store.add(b"c:k1", b"m".to_vec(), 1.0).await.expect("add k1");
    assert!(!store.contains(b"c:k2", b"m").await.expect("contains k2"));
    store.delete(b"c:k2").await.expect("delete k2");
    assert!(store.contains(b"c:k1", b"m").await.expect("contains k1"));
}

/// `delete` drops the whole set and is idempotent.
pub async fn delete_drops_set<S: SortedSetStore>(store: &S) {
    store.add(b"c:del", b"a".to_vec(), 1.0).await.expect("add a");
    store.add(b"c:del", b"b".to_vec(), 2.0).await.expect("add b");
    store.delete(b"c:del").await.expect("delete");
    assert_eq!(store.cardinality(b"c:del").await.expect("cardinality"), 0);
    store.delete(b"c:del").await.expect("second delete should be a no-op");
}

// ============================================================================
// Range
// ============================================================================

/// Descending reads return the highest score first; ascending the lowest.
pub async fn range_orders_by_score<S: SortedSetStore>(store: &S) {
    store.add(b"c:ord", b"second".to_vec(), 2.0).await.expect("add");
    store.add(b"c:ord", b"first".to_vec(), 1.0).await.expect("add");
    store.add(b"c:ord", b"third".to_vec(), 3.0).await.expect("add");

    let desc = store.range_desc(b"c:ord", 0..=2).await.expect("desc");
    assert_eq!(as_strs(&desc), ["third", "second", "first"]);
    let asc = store.range_asc(b"c:ord", 0..=2).await.expect("asc");
    assert_eq!(as_strs(&asc), ["first", "second", "third"]);
}

/// Equal scores are ordered by member bytes (reversed for descending reads).
pub async fn range_breaks_ties_by_member<S: SortedSetStore>(store: &S) {
    for member in ["b", "c", "a"] {
        store.add(b"c:tie", member.as_bytes().to_vec(), 7.0).await.expect("add");
    }
    let asc = store.range_asc(b"c:tie", 0..=2).await.expect("asc");
    assert_eq!(as_strs(&asc), ["a", "b", "c"]);
    let desc = store.range_desc(b"c:tie", 0..=2).await.expect("desc");
    assert_eq!(as_strs(&desc), ["c", "b", "a"]);
}

/// A window that runs past the end is truncated; one that starts past the
/// end is empty.
pub async fn range_window_bounds<S: SortedSetStore>(store: &S) {
    for i in 0..5 {
        store.add(b"c:win", make_member(i), i as f64).await.expect("add");
    }
    assert_eq!(store.range_desc(b"c:win", 3..=10).await.expect("tail").len(), 2);
    assert!(store.range_desc(b"c:win", 5..=9).await.expect("past end").is_empty());
    assert!(
        store
            .range_desc(b"c:win", std::ops::RangeInclusive::new(4, 1))
            .await
            .expect("inverted")
            .is_empty()
    );
}

/// `range_with_scores` reports the stored scores.
pub async fn range_with_scores_reports_scores<S: SortedSetStore>(store: &S) {
    store.add(b"c:scores", b"a".to_vec(), 10.0).await.expect("add");
    store.add(b"c:scores", b"b".to_vec(), 20.0).await.expect("add");
    let scored = store
        .range_with_scores(b"c:scores", 0..=1, RangeOrder::Descending)
        .await
        .expect("range_with_scores");
    let scores: Vec<f64> = scored.iter().map(|entry| entry.score).collect();
    assert_eq!(scores, vec![20.0, 10.0]);
}

// ============================================================================
// Pipeline
// ============================================================================

/// A committed pipeline applies writes to every key it touches.
pub async fn pipeline_commit_applies_all<S: SortedSetStore>(store: &S) {
    store.add(b"c:p3", b"x".to_vec(), 1.0).await.expect("seed");

    let mut pipeline = store.pipeline().await.expect("pipeline");
    pipeline.add(b"c:p1".to_vec(), b"a".to_vec(), 1.0);
    pipeline.add(b"c:p2".to_vec(), b"b".to_vec(), 1.0);
    pipeline.remove(b"c:p3".to_vec(), b"x".to_vec());
    pipeline.commit().await.expect("commit");

    assert!(store.contains(b"c:p1", b"a").await.expect("contains"));
    assert!(store.contains(b"c:p2", b"b").await.expect("contains"));
    assert_eq!(store.cardinality(b"c:p3").await.expect("cardinality"), 0);
}

/// A pipeline with an invalid operation applies nothing.
pub async fn pipeline_is_all_or_nothing<S: SortedSetStore>(store: &S) {
    let mut pipeline = store.pipeline().await.expect("pipeline");
    pipeline.add(b"c:aon1".to_vec(), b"a".to_vec(), 1.0);
    pipeline.add(b"c:aon2".to_vec(), b"b".to_vec(), f64::NAN);
    let result = pipeline.commit().await;

    assert!(
        matches!(result, Err(StoreError::InvalidArgument { .. })),
        "NaN score should be rejected: {result:?}"
    );
    assert!(!store.contains(b"c:aon1", b"a").await.expect("contains"));
}

/// Dropping a pipeline without committing discards it.
pub async fn pipeline_drop_is_noop<S: SortedSetStore>(store: &S) {
    let mut pipeline = store.pipeline().await.expect("pipeline");
    pipeline.add(b"c:drop".to_vec(), b"a".to_vec(), 1.0);
    drop(pipeline);
    assert_eq!(store.cardinality(b"c:drop").await.expect("cardinality"), 0);
}

// ============================================================================
// Concurrent
// ============================================================================

/// Parallel adds of distinct members to one set all land.
///
/// Requires `S: 'static` so the store can be shared across spawned tasks.
pub async fn concurrent_adds_to_one_set<S: SortedSetStore + 'static>(store: Arc<S>) {
    let mut handles = Vec::new();
    for task in 0..8usize {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for i in 0..25usize {
                let member = make_member(task * 100 + i);
                store.add(b"c:conc", member, (task * 100 + i) as f64).await.expect("add");
            }
        }));
    }
    for handle in handles {
        handle.await.expect("task panicked");
    }
    assert_eq!(store.cardinality(b"c:conc").await.expect("cardinality"), 200);
}

/// Parallel re-adds of the same member insert it exactly once.
pub async fn concurrent_add_same_member_inserts_once<S: SortedSetStore + 'static>(
    store: Arc<S>,
) {
    let mut handles = Vec::new();
    for task in 0..10u32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.add(b"c:once", b"m".to_vec(), f64::from(task)).await.expect("add")
        }));
    }
    let mut inserted = 0;
    for handle in handles {
        if handle.await.expect("task panicked") {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1, "exactly one add should report insertion");
    assert_eq!(store.cardinality(b"c:once").await.expect("cardinality"), 1);
}

// ============================================================================
// Errors
// ============================================================================

/// Non-finite scores are rejected without modifying the set.
pub async fn non_finite_scores_rejected<S: SortedSetStore>(store: &S) {
    for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let result = store.add(b"c:nan", b"a".to_vec(), score).await;
        assert!(
            matches!(result, Err(StoreError::InvalidArgument { .. })),
            "score {score} should be rejected: {result:?}"
        );
    }
    assert_eq!(store.cardinality(b"c:nan").await.expect("cardinality"), 0);
}

/// A readiness probe on a working store reports healthy.
pub async fn health_check_returns_healthy<S: SortedSetStore>(store: &S) {
    let status = store.health_check(HealthProbe::Readiness).await.expect("health_check");
    assert!(status.is_healthy(), "expected healthy, got {status}");
}

// ============================================================================
// Convenience runner
// ============================================================================

/// Run the full conformance suite against the given store.
///
/// ```no_run
/// use std::sync::Arc;
/// use socialgraph_store::conformance;
/// use socialgraph_store::MemoryStore;
///
/// #[tokio::test]
/// async fn memory_store_conformance() {
///     conformance::run_all(Arc::new(MemoryStore::new())).await;
/// }
/// ```
///
/// Every test uses its own `c:`-prefixed keys, so one store can run them all.
pub async fn run_all<S: SortedSetStore + 'static>(store: Arc<S>) {
    // Membership
    missing_set_is_empty(store.as_ref()).await;
    add_is_insert_if_absent(store.as_ref()).await;
    remove_reports_presence(store.as_ref()).await;
    keys_are_independent(store.as_ref()).await;
    delete_drops_set(store.as_ref()).await;

    // Range
    range_orders_by_score(store.as_ref()).await;
    range_breaks_ties_by_member(store.as_ref()).await;
    range_window_bounds(store.as_ref()).await;
    range_with_scores_reports_scores(store.as_ref()).await;

    // Pipeline
    pipeline_commit_applies_all(store.as_ref()).await;
    pipeline_is_all_or_nothing(store.as_ref()).await;
    pipeline_drop_is_noop(store.as_ref()).await;

    // Concurrent
    concurrent_adds_to_one_set(Arc::clone(&store)).await;
    concurrent_add_same_member_inserts_once(Arc::clone(&store)).await;

    // Errors
    non_finite_scores_rejected(store.as_ref()).await;
    health_check_returns_healthy(store.as_ref()).await;
}
