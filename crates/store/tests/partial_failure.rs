//! Partial failure tests for pipelines.
//!
//! Validates that pipeline commit provides all-or-nothing atomicity under
//! injected connection failures, size limit rejection and invalid scores,
//! and that a failed write can be retried to the same end state.

#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

use socialgraph_store::{
    MemoryStore, SizeLimits, SortedSetStore, StoreError, StoreResult, assert_connection_error,
    testutil::{FailingStore, make_member},
};

/// Buffers the four writes of a reciprocal follow between `a` and `b`.
async fn reciprocal_follow_pipeline<S: SortedSetStore>(
    store: &S,
    a: &str,
    b: &str,
) -> StoreResult<()> {
    let mut pipeline = store.pipeline().await?;
    pipeline.add(format!("following:{a}").into_bytes(), b.as_bytes().to_vec(), 1.0);
    pipeline.add(format!("followers:{b}").into_bytes(), a.as_bytes().to_vec(), 1.0);
    pipeline.add(format!("reciprocated:{a}").into_bytes(), b.as_bytes().to_vec(), 1.0);
    pipeline.add(format!("reciprocated:{b}").into_bytes(), a.as_bytes().to_vec(), 1.0);
    pipeline.commit().await
}

#[tokio::test]
async fn failed_commit_applies_nothing() {
    let store = FailingStore::new(MemoryStore::new(), [0]);

    let result = reciprocal_follow_pipeline(&store, "1", "2").await;

    assert_connection_error!(result);
    assert_eq!(store.inner().set_count(), 0, "no set should exist after a failed commit");
}

#[tokio::test]
async fn retry_after_failed_commit_converges() {
    let store = FailingStore::new(MemoryStore::new(), [0]);

    assert!(reciprocal_follow_pipeline(&store, "1", "2").await.is_err());
    reciprocal_follow_pipeline(&store, "1", "2").await.expect("retry should succeed");

    let inner = store.inner();
    assert!(inner.contains(b"following:1", b"2").await.unwrap());
    assert!(inner.contains(b"followers:2", b"1").await.unwrap());
    assert!(inner.contains(b"reciprocated:1", b"2").await.unwrap());
    assert!(inner.contains(b"reciprocated:2", b"1").await.unwrap());
    assert_eq!(inner.member_count(), 4);
}

#[tokio::test]
async fn only_selected_commit_fails() {
    let store = FailingStore::new(MemoryStore::new(), [1]);

    reciprocal_follow_pipeline(&store, "1", "2").await.expect("first commit");
    assert!(reciprocal_follow_pipeline(&store, "3", "4").await.is_err());
    reciprocal_follow_pipeline(&store, "5", "6").await.expect("third commit");

    let inner = store.inner();
    assert!(inner.contains(b"following:1", b"2").await.unwrap());
    assert!(!inner.contains(b"following:3", b"4").await.unwrap());
    assert!(inner.contains(b"following:5", b"6").await.unwrap());
    assert_eq!(store.write_count(), 3);
}

#[tokio::test]
async fn oversized_member_rejects_whole_pipeline() {
    let store = MemoryStore::with_size_limits(SizeLimits::new(64, 8).unwrap());

    let mut pipeline = store.pipeline().await.unwrap();
    pipeline.add(b"following:1".to_vec(), b"2".to_vec(), 1.0);
    pipeline.add(b"followers:2".to_vec(), vec![b'x'; 9], 1.0);
    let result = pipeline.commit().await;

    assert!(
        matches!(result, Err(StoreError::SizeLimitExceeded { kind: "member", actual: 9, limit: 8 })),
        "expected member size rejection, got {result:?}"
    );
    assert_eq!(store.set_count(), 0);
}

#[tokio::test]
async fn direct_and_pipelined_writes_share_size_limits() {
    let store = MemoryStore::with_size_limits(SizeLimits::new(8, 4).unwrap());
    let long_key = vec![b'k'; 9];

    for result in [
        store.remove(&long_key, b"1").await.map(|_| ()),
        store.remove(b"k", b"12345").await.map(|_| ()),
        store.delete(&long_key).await,
    ] {
        assert!(
            matches!(result, Err(StoreError::SizeLimitExceeded { .. })),
            "expected size rejection, got {result:?}"
        );
    }

    let mut pipeline = store.pipeline().await.unwrap();
    pipeline.delete(long_key);
    assert!(matches!(pipeline.commit().await, Err(StoreError::SizeLimitExceeded { .. })));
}

#[tokio::test]
async fn invalid_score_late_in_pipeline_rejects_earlier_ops() {
    let store = MemoryStore::new();
    for i in 0..3 {
        store.add(b"blocked:1", make_member(i), i as f64).await.unwrap();
    }

    let mut pipeline = store.pipeline().await.unwrap();
    pipeline.delete(b"blocked:1".to_vec());
    pipeline.add(b"following:1".to_vec(), b"2".to_vec(), f64::NAN);
    assert!(pipeline.commit().await.is_err());

    assert_eq!(store.cardinality(b"blocked:1").await.unwrap(), 3, "delete must not be applied");
}

#[tokio::test]
async fn sequential_writes_fail_independently() {
    // Without a pipeline, writes before the failure stay applied.
    let store = FailingStore::new(MemoryStore::new(), [2]);

    store.add(b"following:1", b"2".to_vec(), 1.0).await.unwrap();
    store.add(b"followers:2", b"1".to_vec(), 1.0).await.unwrap();
    assert_connection_error!(store.add(b"reciprocated:1", b"2".to_vec(), 1.0).await);

    let inner = store.inner();
    assert!(inner.contains(b"following:1", b"2").await.unwrap());
    assert!(inner.contains(b"followers:2", b"1").await.unwrap());
    assert!(!inner.contains(b"reciprocated:1", b"2").await.unwrap());
}
