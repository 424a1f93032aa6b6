//! Metrics-recording store wrapper.
//!
//! [`MeteredStore`] wraps any [`SortedSetStore`] and records a latency sample
//! for every call into a shared [`Metrics`] instance. Failed calls count
//! toward the error (and, for timeouts, timeout) counters instead.
//!
//! ```
//! use socialgraph_store::{MemoryStore, MeteredStore, MetricsCollector, SortedSetStore};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = MeteredStore::new(MemoryStore::new());
//! store.add(b"following:1", b"2".to_vec(), 1.0).await.unwrap();
//! store.cardinality(b"following:1").await.unwrap();
//!
//! let snapshot = store.metrics().snapshot();
//! assert_eq!(snapshot.add.count, 1);
//! assert_eq!(snapshot.cardinality.count, 1);
//! # });
//! ```

use std::{ops::RangeInclusive, time::Instant};

use async_trait::async_trait;

use crate::{
    backend::SortedSetStore,
    error::{StoreError, StoreResult},
    health::{HealthProbe, HealthStatus},
    metrics::{Metrics, MetricsCollector, Operation},
    pipeline::Pipeline,
    types::{RangeOrder, Score, ScoredMember},
};

/// A [`SortedSetStore`] that records [`Metrics`] for an inner store.
#[derive(Clone)]
pub struct MeteredStore<S> {
    inner: S,
    metrics: Metrics,
}

impl<S: SortedSetStore> MeteredStore<S> {
    /// Wraps `inner` with a fresh metrics collector.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self::with_metrics(inner, Metrics::new())
    }

    /// Wraps `inner`, recording into an existing (possibly shared) collector.
    #[must_use]
    pub fn with_metrics(inner: S, metrics: Metrics) -> Self {
        Self { inner, metrics }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Consumes the wrapper, returning the inner store.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> MetricsCollector for MeteredStore<S> {
    fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

fn observe<T>(
    metrics: &Metrics,
    operation: Operation,
    start: Instant,
    result: StoreResult<T>,
) -> StoreResult<T> {
    match &result {
        Ok(_) => metrics.record(operation, start.elapsed()),
        Err(StoreError::Timeout) => metrics.record_timeout(),
        Err(_) => metrics.record_error(),
    }
    result
}

#[async_trait]
impl<S: SortedSetStore> SortedSetStore for MeteredStore<S> {
    async fn add(&self, key: &[u8], member: Vec<u8>, score: Score) -> StoreResult<bool> {
        let start = Instant::now();
        let result = self.inner.add(key, member, score).await;
        observe(&self.metrics, Operation::Add, start, result)
    }

    async fn remove(&self, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        let start = Instant::now();
        let result = self.inner.remove(key, member).await;
        observe(&self.metrics, Operation::Remove, start, result)
    }

    async fn cardinality(&self, key: &[u8]) -> StoreResult<u64> {
        let start = Instant::now();
        let result = self.inner.cardinality(key).await;
        observe(&self.metrics, Operation::Cardinality, start, result)
    }

    async fn score(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<Score>> {
        let start = Instant::now();
        let result = self.inner.score(key, member).await;
        observe(&self.metrics, Operation::Score, start, result)
    }

    async fn contains(&self, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        let start = Instant::now();
        let result = self.inner.contains(key, member).await;
        observe(&self.metrics, Operation::Score, start, result)
    }

    async fn range_with_scores(
        &self,
        key: &[u8],
        ranks: RangeInclusive<usize>,
        order: RangeOrder,
    ) -> StoreResult<Vec<ScoredMember>> {
        let start = Instant::now();
        let result = self.inner.range_with_scores(key, ranks, order).await;
        observe(&self.metrics, Operation::Range, start, result)
    }

    async fn delete(&self, key: &[u8]) -> StoreResult<()> {
        let start = Instant::now();
        let result = self.inner.delete(key).await;
        observe(&self.metrics, Operation::Delete, start, result)
    }

    async fn pipeline(&self) -> StoreResult<Box<dyn Pipeline>> {
        let inner = self.inner.pipeline().await.inspect_err(|_| self.metrics.record_error())?;
        Ok(Box::new(MeteredPipeline { inner, metrics: self.metrics.clone() }))
    }

    async fn health_check(&self, probe: HealthProbe) -> StoreResult<HealthStatus> {
        self.metrics.record_health_check();
        self.inner.health_check(probe).await
    }
}

/// Pipeline wrapper that records the commit under [`Operation::Pipeline`].
struct MeteredPipeline {
    inner: Box<dyn Pipeline>,
    metrics: Metrics,
}

#[async_trait]
impl Pipeline for MeteredPipeline {
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
        let start = Instant::now();
        let Self { inner, metrics } = *self;
        let result = inner.commit().await;
        observe(&metrics, Operation::Pipeline, start, result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn test_records_each_primitive() {
        let store = MeteredStore::new(MemoryStore::new());

        store.add(b"s", b"a".to_vec(), 1.0).await.unwrap();
        store.remove(b"s", b"missing").await.unwrap();
        store.cardinality(b"s").await.unwrap();
        store.contains(b"s", b"a").await.unwrap();
        store.range_desc(b"s", 0..=9).await.unwrap();
        store.delete(b"s").await.unwrap();

        let snapshot = store.metrics().snapshot();
        assert_eq!(snapshot.add.count, 1);
        assert_eq!(snapshot.remove.count, 1);
        assert_eq!(snapshot.cardinality.count, 1);
        assert_eq!(snapshot.score.count, 1);
        assert_eq!(snapshot.range.count, 1);
        assert_eq!(snapshot.delete.count, 1);
        assert_eq!(snapshot.error_count, 0);
    }

    #[tokio::test]
    async fn test_pipeline_commit_is_recorded() {
        let store = MeteredStore::new(MemoryStore::new());

        let mut pipeline = store.pipeline().await.unwrap();
        pipeline.add(b"a".to_vec(), b"1".to_vec(), 1.0);
        pipeline.add(b"b".to_vec(), b"2".to_vec(), 1.0);
        assert_eq!(pipeline.len(), 2);
        pipeline.commit().await.unwrap();

        let snapshot = store.metrics().snapshot();
        assert_eq!(snapshot.pipeline.count, 1);
        assert!(store.inner().contains(b"b", b"2").await.unwrap());
    }

    #[tokio::test]
    async fn test_errors_are_counted_not_timed() {
        let store = MeteredStore::new(MemoryStore::new());

        assert!(store.add(b"s", b"a".to_vec(), f64::NAN).await.is_err());

        let snapshot = store.metrics().snapshot();
        assert_eq!(snapshot.add.count, 0);
        assert_eq!(snapshot.error_count, 1);
    }

    #[tokio::test]
    async fn test_shared_metrics() {
        let metrics = Metrics::new();
        let a = MeteredStore::with_metrics(MemoryStore::new(), metrics.clone());
        let b = MeteredStore::with_metrics(MemoryStore::new(), metrics.clone());

        a.cardinality(b"s").await.unwrap();
        b.cardinality(b"s").await.unwrap();
        a.health_check(HealthProbe::Liveness).await.unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cardinality.count, 2);
        assert_eq!(snapshot.health_check_count, 1);
    }
}
