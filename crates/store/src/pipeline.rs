//! Pipeline trait for atomic multi-set writes.
//!
//! A [`Pipeline`] buffers sorted-set mutations that may touch several keys
//! and applies them in one atomic step on [`commit`](Pipeline::commit). It is
//! the store-side counterpart of a MULTI/EXEC block: no reads happen inside
//! the pipeline, and either every buffered operation is applied or none is.
//!
//! # Example
//!
//! ```
//! use socialgraph_store::{MemoryStore, SortedSetStore};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = MemoryStore::new();
//!
//! let mut pipeline = store.pipeline().await.unwrap();
//! pipeline.add(b"following:1".to_vec(), b"2".to_vec(), 1.0);
//! pipeline.add(b"followers:2".to_vec(), b"1".to_vec(), 1.0);
//! pipeline.commit().await.unwrap();
//!
//! assert!(store.contains(b"following:1", b"2").await.unwrap());
//! assert!(store.contains(b"followers:2", b"1").await.unwrap());
//! # });
//! ```

use async_trait::async_trait;

use crate::{error::StoreResult, types::Score};

/// A single buffered mutation.
///
/// Backends that implement [`Pipeline`] by replaying operations (or by
/// translating them into a native batch) share this representation.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOp {
    /// Insert `member` into `key` with `score` unless it is already present.
    Add {
        /// Target set.
        key: Vec<u8>,
        /// Member to insert.
        member: Vec<u8>,
        /// Score for a newly inserted member.
        score: Score,
    },
    /// Remove `member` from `key`.
    Remove {
        /// Target set.
        key: Vec<u8>,
        /// Member to remove.
        member: Vec<u8>,
    },
    /// Drop the whole set stored at `key`.
    Delete {
        /// Set to drop.
        key: Vec<u8>,
    },
}

impl PipelineOp {
    /// Returns the key this operation targets.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Add { key, .. } | Self::Remove { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// Handle for buffering sorted-set mutations and committing them atomically.
///
/// Operations are applied in the order they were buffered. Each buffered
/// operation keeps the semantics of the matching
/// [`SortedSetStore`](crate::SortedSetStore) primitive: adding a present
/// member keeps its score, removing an absent member is a no-op.
///
/// Dropping a pipeline without committing discards every buffered operation.
#[async_trait]
pub trait Pipeline: Send {
    /// Buffers an insert-if-absent of `member` into the set at `key`.
    fn add(&mut self, key: Vec<u8>, member: Vec<u8>, score: Score);

    /// Buffers the removal of `member` from the set at `key`.
    fn remove(&mut self, key: Vec<u8>, member: Vec<u8>);

    /// Buffers the removal of the whole set at `key`.
    fn delete(&mut self, key: Vec<u8>);

    /// Returns the number of buffered operations.
    fn len(&self) -> usize;

    /// Returns `true` if nothing has been buffered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies all buffered operations atomically.
    ///
    /// Every operation is validated before any is applied, so a rejected
    /// pipeline leaves the store untouched.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidArgument`](crate::StoreError::InvalidArgument) for a non-finite score
    /// - [`StoreError::SizeLimitExceeded`](crate::StoreError::SizeLimitExceeded) for oversized keys
    ///   or members
    /// - Other [`StoreError`](crate::StoreError) variants on backend failures
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
