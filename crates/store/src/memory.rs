//! In-memory ordered-set store implementation.
//!
//! This module provides [`MemoryStore`], an in-memory implementation of
//! [`SortedSetStore`] suitable for testing, development and single-process
//! deployments.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Dual index**: Each set keeps a member → score map for point lookups and
//!   a `(score, member)` tree for ranked reads
//! - **Atomic pipelines**: A pipeline is validated up front and applied under a
//!   single write lock
//!
//! # Example
//!
//! ```
//! use socialgraph_store::{MemoryStore, SortedSetStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!
//!     store.add(b"followers:7", b"3".to_vec(), 10.0).await.unwrap();
//!     assert_eq!(store.cardinality(b"followers:7").await.unwrap(), 1);
//! }
//! ```
//!
//! # Performance Characteristics
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | add | O(log n) |
//! | remove | O(log n) |
//! | score / contains | O(1) |
//! | cardinality | O(1) |
//! | range_with_scores | O(start + k) where k is result size |
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - Ranked reads walk the tree from one end, so deep pages cost more than
//!   shallow ones

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
    ops::RangeInclusive,
    sync::Arc,
    time::Instant,
};

use async_trait::async_trait;
use bytes::Bytes;
use fail::fail_point;
use parking_lot::RwLock;

use crate::{
    backend::SortedSetStore,
    error::{StoreError, StoreResult},
    health::{HealthMetadata, HealthProbe, HealthStatus},
    pipeline::{Pipeline, PipelineOp},
    size_limits::{SizeLimits, validate_entry, validate_key_size},
    types::{RangeOrder, Score, ScoredMember, rank_window_len, validate_score},
};

/// Total order over finite scores, used as the primary key of the rank index.
#[derive(Debug, Clone, Copy)]
struct OrderedScore(Score);

impl PartialEq for OrderedScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderedScore {}

impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A single named set.
///
/// `scores` and `ranked` always hold exactly the same members.
#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<Bytes, Score>,
    ranked: BTreeSet<(OrderedScore, Bytes)>,
}

impl SortedSet {
    fn insert(&mut self, member: Bytes, score: Score) -> bool {
        if self.scores.contains_key(&member) {
            return false;
        }
        self.ranked.insert((OrderedScore(score), member.clone()));
        self.scores.insert(member, score);
        true
    }

    fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove_entry(member) {
            Some((member, score)) => {
                self.ranked.remove(&(OrderedScore(score), member));
                true
            },
            None => false,
        }
    }

    fn score(&self, member: &[u8]) -> Option<Score> {
        self.scores.get(member).copied()
    }

    fn len(&self) -> usize {
        self.scores.len()
    }

    fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn range(&self, ranks: &RangeInclusive<usize>, order: RangeOrder) -> Vec<ScoredMember> {
        let take = rank_window_len(ranks);
        if take == 0 {
            return Vec::new();
        }
        let skip = *ranks.start();
        match order {
            RangeOrder::Ascending => {
                self.ranked.iter().skip(skip).take(take).map(to_scored_member).collect()
            },
            RangeOrder::Descending => {
                self.ranked.iter().rev().skip(skip).take(take).map(to_scored_member).collect()
            },
        }
    }
}

fn to_scored_member((score, member): &(OrderedScore, Bytes)) -> ScoredMember {
    ScoredMember::new(member.clone(), score.0)
}

type SetMap = BTreeMap<Vec<u8>, SortedSet>;

fn remove_member(sets: &mut SetMap, key: &[u8], member: &[u8]) -> bool {
    let Some(set) = sets.get_mut(key) else {
        return false;
    };
    let removed = set.remove(member);
    if set.is_empty() {
        sets.remove(key);
    }
    removed
}

fn apply_op(sets: &mut SetMap, op: PipelineOp) {
    match op {
        PipelineOp::Add { key, member, score } => {
            sets.entry(key).or_default().insert(Bytes::from(member), score);
        },
        PipelineOp::Remove { key, member } => {
            remove_member(sets, &key, &member);
        },
        PipelineOp::Delete { key } => {
            sets.remove(&key);
        },
    }
}

fn validate_op(op: &PipelineOp, limits: &SizeLimits) -> StoreResult<()> {
    match op {
        PipelineOp::Add { key, member, score } => {
            validate_entry(key, member, limits)?;
            validate_score(*score)
        },
        PipelineOp::Remove { key, member } => validate_entry(key, member, limits),
        PipelineOp::Delete { key } => validate_key_size(key, limits),
    }
}

/// In-memory ordered-set store.
///
/// # Cloning
///
/// `MemoryStore` is cheaply cloneable via [`Arc`]. All clones share the same
/// underlying sets.
#[derive(Clone)]
pub struct MemoryStore {
    sets: Arc<RwLock<SetMap>>,
    limits: SizeLimits,
}

impl MemoryStore {
    /// Creates an empty store with default [`SizeLimits`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_size_limits(SizeLimits::default())
    }

    /// Creates an empty store that enforces the given size limits on writes.
    #[must_use]
    pub fn with_size_limits(limits: SizeLimits) -> Self {
        Self { sets: Arc::new(RwLock::new(BTreeMap::new())), limits }
    }

    /// Returns the size limits enforced by this store.
    #[must_use]
    pub fn size_limits(&self) -> SizeLimits {
        self.limits
    }

    /// Returns the number of non-empty sets currently held.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.read().len()
    }

    /// Returns the total number of members across all sets.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.sets.read().values().map(SortedSet::len).sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SortedSetStore for MemoryStore {
    #[tracing::instrument(skip(self, key, member), fields(key_len = key.len()))]
    async fn add(&self, key: &[u8], member: Vec<u8>, score: Score) -> StoreResult<bool> {
        validate_entry(key, &member, &self.limits)?;
        validate_score(score)?;

        let mut sets = self.sets.write();
        if let Some(set) = sets.get_mut(key) {
            return Ok(set.insert(Bytes::from(member), score));
        }
        let mut set = SortedSet::default();
        set.insert(Bytes::from(member), score);
        sets.insert(key.to_vec(), set);
        Ok(true)
    }

    #[tracing::instrument(skip(self, key, member), fields(key_len = key.len()))]
    async fn remove(&self, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        validate_entry(key, member, &self.limits)?;
        let mut sets = self.sets.write();
        Ok(remove_member(&mut sets, key, member))
    }

    #[tracing::instrument(skip(self, key), fields(key_len = key.len()))]
    async fn cardinality(&self, key: &[u8]) -> StoreResult<u64> {
        let sets = self.sets.read();
        Ok(sets.get(key).map_or(0, |set| set.len() as u64))
    }

    #[tracing::instrument(skip(self, key, member), fields(key_len = key.len()))]
    async fn score(&self, key: &[u8], member: &[u8]) -> StoreResult<Option<Score>> {
        let sets = self.sets.read();
        Ok(sets.get(key).and_then(|set| set.score(member)))
    }

    #[tracing::instrument(skip(self, key), fields(key_len = key.len()))]
    async fn range_with_scores(
        &self,
        key: &[u8],
        ranks: RangeInclusive<usize>,
        order: RangeOrder,
    ) -> StoreResult<Vec<ScoredMember>> {
        let sets = self.sets.read();
        Ok(sets.get(key).map(|set| set.range(&ranks, order)).unwrap_or_default())
    }

    #[tracing::instrument(skip(self, key), fields(key_len = key.len()))]
    async fn delete(&self, key: &[u8]) -> StoreResult<()> {
        validate_key_size(key, &self.limits)?;
        self.sets.write().remove(key);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn pipeline(&self) -> StoreResult<Box<dyn Pipeline>> {
        Ok(Box::new(MemoryPipeline::new(self.clone())))
    }

    #[tracing::instrument(skip(self))]
    async fn health_check(&self, probe: HealthProbe) -> StoreResult<HealthStatus> {
        fail_point!("health-check", |_| {
            Err(StoreError::internal("injected failure in health check"))
        });

        let start = Instant::now();
        // Taking the read lock proves the store is not wedged by a writer.
        let (set_count, member_count) = {
            let sets = self.sets.read();
            (sets.len(), sets.values().map(SortedSet::len).sum::<usize>())
        };
        let metadata = HealthMetadata::new(start.elapsed(), "memory")
            .with_detail("set_count", set_count.to_string())
            .with_detail("member_count", member_count.to_string());
        Ok(HealthStatus::healthy(metadata))
    }
}

/// In-memory pipeline implementation.
///
/// Buffers operations until commit, then validates all of them and applies
/// them under one write lock.
struct MemoryPipeline {
    store: MemoryStore,
    ops: Vec<PipelineOp>,
}

impl MemoryPipeline {
    fn new(store: MemoryStore) -> Self {
        Self { store, ops: Vec::new() }
    }
}

#[async_trait]
impl Pipeline for MemoryPipeline {
    fn add(&mut self, key: Vec<u8>, member: Vec<u8>, score: Score) {
        self.ops.push(PipelineOp::Add { key, member, score });
    }

    fn remove(&mut self, key: Vec<u8>, member: Vec<u8>) {
        self.ops.push(PipelineOp::Remove { key, member });
    }

    fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(PipelineOp::Delete { key });
    }

    fn len(&self) -> usize {
        self.ops.len()
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        for op in &self.ops {
            validate_op(op, &self.store.limits)?;
        }

        fail_point!("pipeline-before-commit", |_| {
            Err(StoreError::internal("injected failure before pipeline commit"))
        });

        let mut sets = self.store.sets.write();
        for op in self.ops {
            apply_op(&mut sets, op);
        }
        Ok(())
    }
}
