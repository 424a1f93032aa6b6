//! Shared test utilities for ordered-set store testing.
//!
//! This module provides helpers for generating test data, a failure-injecting
//! store wrapper, a store that yields after every read (to interleave
//! concurrent callers deterministically), and assertion macros for [`StoreResult`] values. It is
//! feature-gated behind `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! socialgraph-store = { path = "../store", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use socialgraph_store::testutil::{FailingStore, YieldingStore, make_member, populated_store};
//! ```

use std::{
    collections::HashSet,
    ops::RangeInclusive,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    backend::SortedSetStore,
    error::{StoreError, StoreResult},
    health::{HealthProbe, HealthStatus},
    memory::MemoryStore,
    pipeline::Pipeline,
    types::{RangeOrder, Score, ScoredMember},
};

/// Create a deterministic test member from an index.
///
/// Produces members like `"m000042"` (zero-padded to 6 digits), so byte
/// order matches numeric order.
#[must_use]
pub fn make_member(idx: usize) -> Vec<u8> {
    format!("m{idx:06}").into_bytes()
}

/// Create a deterministic set key from a prefix and index, e.g. `"following:7"`.
#[must_use]
pub fn make_key(prefix: &str, idx: usize) -> Vec<u8> {
    format!("{prefix}:{idx}").into_bytes()
}

/// Create a [`MemoryStore`] whose set at `key` holds `count` members.
///
/// Member `i` is [`make_member(i)`](make_member) with score `i`, so the
/// highest index ranks first in a descending read.
///
/// # Panics
///
/// Panics if any `add` fails (should not happen with `MemoryStore`).
pub async fn populated_store(key: &[u8], count: usize) -> MemoryStore {
    let store = MemoryStore::new();
    for i in 0..count {
        store.add(key, make_member(i), i as f64).await.expect("populate add failed");
    }
    store
}

/// Assert that a [`StoreResult`] is `Ok`, returning the inner value.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use socialgraph_store::{assert_store_ok, StoreResult};
///
/// let result: StoreResult<i32> = Ok(42);
/// let value = assert_store_ok!(result);
/// assert_eq!(value, 42);
/// ```
#[macro_export]
macro_rules! assert_store_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StoreError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StoreError: {e:?}", $msg),
        }
    };
}

/// Assert that a [`StoreResult`] is a [`StoreError::InvalidArgument`].
#[macro_export]
macro_rules! assert_invalid_argument {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StoreError::InvalidArgument { .. })),
            "expected StoreError::InvalidArgument, got: {:?}",
            $result,
        );
    };
}

/// Assert that a [`StoreResult`] is a [`StoreError::Connection`].
#[macro_export]
macro_rules! assert_connection_error {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StoreError::Connection { .. })),
            "expected StoreError::Connection, got: {:?}",
            $result,
        );
    };
    ($result:expr, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::StoreError::Connection { .. })),
            "{}: expected StoreError::Connection, got: {:?}",
            $msg,
            $result,
        );
    };
}

/// Helper to check whether a result failed with a transient error.
pub fn is_transient<T>(result: &StoreResult<T>) -> bool {
    matches!(result, Err(e) if e.is_transient())
}

// ---------------------------------------------------------------------------
// FailingStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FailureState {
    write_count: AtomicUsize,
    fail_writes: HashSet<usize>,
    fail_reads: AtomicBool,
}

impl FailureState {
    /// Claims the next write index and fails if it was selected.
    fn next_write(&self) -> StoreResult<()> {
        let idx = self.write_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.contains(&idx) {
            return Err(StoreError::connection(format!("injected failure on write {idx}")));
        }
        Ok(())
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::connection("injected read failure"));
        }
        Ok(())
    }
}

/// A [`MemoryStore`] wrapper that injects connection failures.
///
/// Every write (`add`, `remove`, `delete`, or a pipeline commit) claims the
/// next 0-based write index; writes whose index is in `fail_writes` fail with
/// [`StoreError::Connection`] without touching the store. Reads can be failed
/// wholesale with [`set_fail_reads`](Self::set_fail_reads).
///
/// Clones share the same counters and the same underlying data.
#[derive(Clone)]
pub struct FailingStore {
    inner: MemoryStore,
    state: Arc<FailureState>,
}

impl FailingStore {
    /// Wraps `inner`, failing the writes at the given indices.
    pub fn new(inner: MemoryStore, fail_writes: impl IntoIterator<Item = usize>) -> Self {
        let state = FailureState {
            fail_writes: fail_writes.into_iter().collect(),
            ..FailureState::default()
        };
        Self { inner, state: Arc::new(state) }
    }

    /// Returns the wrapped store, for inspecting state behind the failures.
    #[must_use]
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Returns how many writes have been attempted so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.write_count.load(Ordering::SeqCst)
    }

    /// Makes every read fail (or succeed again) from now on.
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SortedSetStore for FailingStore {
    async fn add(&self, key: &[u8], member: Vec<u8>, score: Score) -> StoreResult<bool> {
        self.state.next_write()?;
        self.inner.add(key, member, score).await
    }

    async fn remove(&self, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        self.state.next_write()?;
        self.inner.remove(key, member).await
    }

    async fn cardinality(&self, key: &[u8]) -> StoreResult<u64> {
        self.state.check_read()?;
        self.inner.cardinality(key).await
    }

    async fn score(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<Score>> {
        self.state.check_read()?;
        self.inner.score(key, member).await
    }

    async fn range_with_scores(
        &self,
        key: &[u8],
        ranks: RangeInclusive<usize>,
        order: RangeOrder,
    ) -> StoreResult<Vec<ScoredMember>> {
        self.state.check_read()?;
        self.inner.range_with_scores(key, ranks, order).await
    }

    async fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.state.next_write()?;
        self.inner.delete(key).await
    }

    async fn pipeline(&self) -> StoreResult<Box<dyn Pipeline>> {
        let inner = self.inner.pipeline().await?;
        Ok(Box::new(FailingPipeline { inner, state: Arc::clone(&self.state) }))
    }

    async fn health_check(&self, probe: HealthProbe) -> StoreResult<HealthStatus> {
        self.state.check_read()?;
        self.inner.health_check(probe).await
    }
}

/// Pipeline whose commit claims one write index on the owning [`FailingStore`].
struct FailingPipeline {
    inner: Box<dyn Pipeline>,
    state: Arc<FailureState>,
}

#[async_trait]
impl Pipeline for FailingPipeline {
    fn add(&mut self, key: Vec<u8>, member: Vec<u8>, score: Score) {
        self.inner.add(key, member, score);
    }

    fn remove(&mut self, key: Vec<u8>, member: Vec<u8>) {
        self.inner.remove(key, member);
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.inner.delete(key);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.state.next_write()?;
        self.inner.commit().await
    }
}

// ---------------------------------------------------------------------------
// YieldingStore
// ---------------------------------------------------------------------------

/// A [`MemoryStore`] wrapper that yields to the scheduler after every read.
///
/// On a current-thread runtime, two futures driven with `tokio::join!`
/// alternate at each read, so a caller's read is always followed by the
/// other caller's next step before its own write lands.
#[derive(Clone, Default)]
pub struct YieldingStore {
    inner: MemoryStore,
}

impl YieldingStore {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

#[async_trait]
impl SortedSetStore for YieldingStore {
    async fn add(&self, key: &[u8], member: Vec<u8>, score: Score) -> StoreResult<bool> {
        self.inner.add(key, member, score).await
    }

    async fn remove(&self, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        self.inner.remove(key, member).await
    }

    async fn cardinality(&self, key: &[u8]) -> StoreResult<u64> {
        let result = self.inner.cardinality(key).await;
        tokio::task::yield_now().await;
        result
    }

    async fn score(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<Score>> {
        let result = self.inner.score(key, member).await;
        tokio::task::yield_now().await;
        result
    }

    async fn range_with_scores(
        &self,
        key: &[u8],
        ranks: RangeInclusive<usize>,
        order: RangeOrder,
    ) -> StoreResult<Vec<ScoredMember>> {
        let result = self.inner.range_with_scores(key, ranks, order).await;
        tokio::task::yield_now().await;
        result
    }

    async fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.inner.delete(key).await
    }

    async fn pipeline(&self) -> StoreResult<Box<dyn Pipeline>> {
        self.inner.pipeline().await
    }

    async fn health_check(&self, probe: HealthProbe) -> StoreResult<HealthStatus> {
        self.inner.health_check(probe).await
    }
}
