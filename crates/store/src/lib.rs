//! Ordered-set store abstraction for the socialgraph relationship engine.
//!
//! This crate provides the [`SortedSetStore`] trait and related types that the
//! relationship engine is built on. A store holds named sets of unique members,
//! each member carrying a numeric score, and serves ranked reads over them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  RelationshipEngine                         │
//! │   (follow / unfollow / block / unblock, listings, counts)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  socialgraph-store                          │
//! │                SortedSetStore trait                         │
//! │  (add, remove, cardinality, score, range, delete, pipeline) │
//! ├──────────────┬──────────────────────────────────────────────┤
//! │ MemoryStore  │  MeteredStore<S> (metrics around any store)  │
//! └──────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use socialgraph_store::{MemoryStore, SortedSetStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryStore::new();
//!
//!     store.add(b"following:1", b"11".to_vec(), 1.0).await?;
//!     store.add(b"following:1", b"12".to_vec(), 2.0).await?;
//!
//!     // Highest score (most recent) first
//!     let page = store.range_desc(b"following:1", 0..=24).await?;
//!     assert_eq!(page.len(), 2);
//!
//!     // Pipelines commit writes to several sets atomically
//!     let mut pipeline = store.pipeline().await?;
//!     pipeline.remove(b"following:1".to_vec(), b"11".to_vec());
//!     pipeline.remove(b"followers:11".to_vec(), b"1".to_vec());
//!     pipeline.commit().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Implementing a Store
//!
//! 1. Implement the [`SortedSetStore`] trait
//! 2. Implement a corresponding [`Pipeline`] type
//! 3. Map backend-specific errors to [`StoreError`]
//! 4. Run the [`conformance`] suite against it (requires `testutil`)
//!
//! See the [`memory`] module source for a reference implementation.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` and `conformance` modules (member generators,
//!   `FailingStore`, assertion macros, the store contract suite).
//! - **`failpoints`**: Activates `fail` injection points (`pipeline-before-commit`,
//!   `health-check`) for fault-injection tests.

#![deny(unsafe_code)]

pub mod backend;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod conformance;
pub mod error;
pub mod health;
pub mod memory;
pub mod metered;
pub mod metrics;
pub mod pipeline;
pub mod size_limits;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod types;

// Re-export primary types at crate root for convenience
pub use backend::SortedSetStore;
pub use error::{BoxError, ConfigError, StoreError, StoreResult};
pub use health::{HealthMetadata, HealthProbe, HealthStatus};
pub use memory::MemoryStore;
pub use metered::MeteredStore;
pub use metrics::{
    LatencyPercentiles, Metrics, MetricsCollector, MetricsSnapshot, Operation, OperationSnapshot,
};
pub use pipeline::{Pipeline, PipelineOp};
pub use size_limits::{
    DEFAULT_MAX_KEY_SIZE, DEFAULT_MAX_MEMBER_SIZE, SizeLimits, validate_entry, validate_key_size,
};
pub use types::{RangeOrder, Score, ScoredMember, rank_window_len, validate_score};
