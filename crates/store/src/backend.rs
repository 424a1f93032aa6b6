//! Ordered-set store trait definition.
//!
//! This module defines [`SortedSetStore`], the set of primitives the
//! relationship engine is built on. The shape follows the sorted-set commands
//! of common key-value servers: each named set holds unique members with a
//! numeric score, and members can be read back by rank in either direction.
//!
//! # Design
//!
//! - **Keys and members are bytes**: no assumption about how callers encode them
//! - **Per-key atomicity**: every primitive is atomic on its own key; cross-key
//!   atomicity is only available through a [`Pipeline`]
//! - **Insert-if-absent adds**: adding a member that is already present keeps
//!   its original score, so replaying a write never reorders a set
//! - **Empty sets vanish**: a set whose last member is removed no longer exists
//!
//! See [`MemoryStore`](crate::MemoryStore) for a reference implementation.

use std::{ops::RangeInclusive, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    error::StoreResult,
    health::{HealthProbe, HealthStatus},
    pipeline::Pipeline,
    types::{RangeOrder, Score, ScoredMember},
};

/// Abstract ordered-set store.
///
/// Implementations must be thread-safe (`Send + Sync`); callers share one
/// handle across tasks and never hold a lock across calls.
///
/// # Primitives
///
/// | Method | Description |
/// |--------|-------------|
/// | [`add`](SortedSetStore::add) | Insert a member with a score unless present |
/// | [`remove`](SortedSetStore::remove) | Remove a member |
/// | [`cardinality`](SortedSetStore::cardinality) | Count members |
/// | [`score`](SortedSetStore::score) | Look up a member's score |
/// | [`contains`](SortedSetStore::contains) | Membership test |
/// | [`range_with_scores`](SortedSetStore::range_with_scores) | Ranked read with scores |
/// | [`range_desc`](SortedSetStore::range_desc) | Ranked read, highest score first |
/// | [`range_asc`](SortedSetStore::range_asc) | Ranked read, lowest score first |
/// | [`delete`](SortedSetStore::delete) | Drop a whole set |
/// | [`pipeline`](SortedSetStore::pipeline) | Begin an atomic multi-key batch |
/// | [`health_check`](SortedSetStore::health_check) | Verify store availability |
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use socialgraph_store::{MemoryStore, SortedSetStore};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = MemoryStore::new();
///
/// store.add(b"following:1", b"11".to_vec(), 1.0).await.unwrap();
/// store.add(b"following:1", b"12".to_vec(), 2.0).await.unwrap();
///
/// let newest_first = store.range_desc(b"following:1", 0..=9).await.unwrap();
/// assert_eq!(newest_first, vec![Bytes::from("12"), Bytes::from("11")]);
/// # });
/// ```
#[async_trait]
pub trait SortedSetStore: Send + Sync {
    /// Inserts `member` into the set at `key` with `score`.
    ///
    /// If the member is already present its score is left unchanged.
    ///
    /// # Returns
    ///
    /// `true` if the member was inserted, `false` if it was already present.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidArgument`](crate::StoreError::InvalidArgument) if `score` is NaN or
    ///   infinite
    /// - [`StoreError::SizeLimitExceeded`](crate::StoreError::SizeLimitExceeded) if `key` or
    ///   `member` exceed the store's limits
    #[must_use = "store operations may fail and errors must be handled"]
    async fn add(&self, key: &[u8], member: Vec<u8>, score: Score) -> StoreResult<bool>;

    /// Removes `member` from the set at `key`.
    ///
    /// Removing an absent member (or from an absent set) is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if the member was present and has been removed.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn remove(&self, key: &[u8], member: &[u8]) -> StoreResult<bool>;

    /// Returns the number of members in the set at `key` (0 if absent).
    #[must_use = "store operations may fail and errors must be handled"]
    async fn cardinality(&self, key: &[u8]) -> StoreResult<u64>;

    /// Returns the score of `member` in the set at `key`, if present.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn score(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<Score>>;

    /// Returns `true` if `member` is in the set at `key`.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn contains(&self, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        Ok(self.score(key, member).await?.is_some())
    }

    /// Reads the members whose ranks fall in `ranks`, with their scores.
    ///
    /// Ranks are 0-based positions in `order`. Ranks past the end of the set
    /// are simply absent from the result; an inverted window yields an empty
    /// result.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn range_with_scores(
        &self,
        key: &[u8],
        ranks: RangeInclusive<usize>,
        order: RangeOrder,
    ) -> StoreResult<Vec<ScoredMember>>;

    /// Reads members by rank, highest score first.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn range_desc(&self, key: &[u8], ranks: RangeInclusive<usize>) -> StoreResult<Vec<Bytes>> {
        let scored = self.range_with_scores(key, ranks, RangeOrder::Descending).await?;
        Ok(scored.into_iter().map(|entry| entry.member).collect())
    }

    /// Reads members by rank, lowest score first.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn range_asc(&self, key: &[u8], ranks: RangeInclusive<usize>) -> StoreResult<Vec<Bytes>> {
        let scored = self.range_with_scores(key, ranks, RangeOrder::Ascending).await?;
        Ok(scored.into_iter().map(|entry| entry.member).collect())
    }

    /// Drops the whole set at `key`. A no-op if the set does not exist.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Begins a new pipeline whose buffered writes commit atomically.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn pipeline(&self) -> StoreResult<Box<dyn Pipeline>>;

    /// Checks store health for the given [`HealthProbe`].
    ///
    /// # Returns
    ///
    /// - `Ok(HealthStatus::Healthy(_))`: probe passed
    /// - `Ok(HealthStatus::Degraded(_, reason))`: probe passed with caveats
    /// - `Ok(HealthStatus::Unhealthy(_, reason))`: probe failed
    /// - `Err(...)`: the health check itself failed (e.g., timeout)
    #[must_use = "health check results indicate store availability and must be inspected"]
    async fn health_check(&self, probe: HealthProbe) -> StoreResult<HealthStatus>;
}

#[async_trait]
impl<S: SortedSetStore + ?Sized> SortedSetStore for Arc<S> {
    async fn add(&self, key: &[u8], member: Vec<u8>, score: Score) -> StoreResult<bool> {
        (**self).add(key, member, score).await
    }

    async fn remove(&self, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        (**self).remove(key, member).await
    }

    async fn cardinality(&self, key: &[u8]) -> StoreResult<u64> {
        (**self).cardinality(key).await
    }

    async fn score(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<Score>> {
        (**self).score(key, member).await
    }

    async fn contains(&self, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        (**self).contains(key, member).await
    }

    async fn range_with_scores(
        &self,
        key: &[u8],
        ranks: RangeInclusive<usize>,
        order: RangeOrder,
    ) -> StoreResult<Vec<ScoredMember>> {
        (**self).range_with_scores(key, ranks, order).await
    }

    async fn range_desc(&self, key: &[u8], ranks: RangeInclusive<usize>) -> StoreResult<Vec<Bytes>> {
        (**self).range_desc(key, ranks).await
    }

    async fn range_asc(&self, key: &[u8], ranks: RangeInclusive<usize>) -> StoreResult<Vec<Bytes>> {
        (**self).range_asc(key, ranks).await
    }

    async fn delete(&self, key: &[u8]) -> StoreResult<()> {
        (**self).delete(key).await
    }

    async fn pipeline(&self) -> StoreResult<Box<dyn Pipeline>> {
        (**self).pipeline().await
    }

    async fn health_check(&self, probe: HealthProbe) -> StoreResult<HealthStatus> {
        (**self).health_check(probe).await
    }
}
