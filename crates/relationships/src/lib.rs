//! Social-graph relationships over an ordered-set store.
//!
//! This crate tracks who follows whom, who blocks whom, and which follows are
//! mutual, for a population of opaque [`Identity`] values. All state lives in
//! a [`SortedSetStore`](socialgraph_store::SortedSetStore); the engine itself
//! is stateless apart from its configuration and score clock.
//!
//! # Data Model
//!
//! Each identity owns four sorted sets, scored by the time an entry was made:
//!
//! | Relation | Members of `X`'s set |
//! |----------|----------------------|
//! | [`Following`](Relation::Following) | identities `X` follows |
//! | [`Followers`](Relation::Followers) | identities following `X` |
//! | [`Blocked`](Relation::Blocked) | identities `X` has blocked |
//! | [`Reciprocated`](Relation::Reciprocated) | identities in a mutual follow with `X` |
//!
//! The engine keeps these consistent: following and followers mirror each
//! other, reciprocated holds exactly the mutual pairs, nobody relates to
//! themselves, and a block in either direction excludes a follow.
//!
//! # Quick Start
//!
//! ```
//! use socialgraph::{Identity, Page, RelationshipEngine};
//! use socialgraph_store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = RelationshipEngine::new(MemoryStore::new());
//!     let me = Identity::from(1_u64);
//!
//!     for other in 11..=15_u64 {
//!         engine.follow(&me, &Identity::from(other)).await?;
//!     }
//!
//!     // Most recent first
//!     let page = engine.following(&me, Page::with_size(1, 2)).await?;
//!     assert_eq!(page, vec![Identity::from(15_u64), Identity::from(14_u64)]);
//!     assert_eq!(engine.following_page_count(&me, Some(2)).await?, 3);
//!
//!     engine.block(&Identity::from(15_u64), &me).await?;
//!     assert!(!engine.is_following(&me, &Identity::from(15_u64)).await?);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - **`failpoints`**: Activates the store's `fail` injection points for
//!   fault-injection tests.

#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod keys;
pub mod pagination;

pub use clock::{MonotonicClock, ScoreClock, SequenceClock};
pub use config::{RelationshipConfig, WriteMode};
pub use engine::RelationshipEngine;
pub use error::{RelationshipError, Result};
pub use identity::Identity;
pub use keys::{KeySpace, Relation};
pub use pagination::Page;
