#![allow(clippy::expect_used, clippy::panic)]
//! Interleaved mutations on a single-threaded runtime.
//!
//! `YieldingStore` yields after every read, so futures joined with
//! `tokio::join!` alternate at each read and every read that shapes a write
//! plan goes stale before the write lands.

use rstest::rstest;
use socialgraph::{Identity, RelationshipConfig, RelationshipEngine, WriteMode};
use socialgraph_store::{MemoryStore, testutil::YieldingStore};

fn engine(mode: WriteMode) -> RelationshipEngine<YieldingStore> {
    let config = RelationshipConfig::builder().write_mode(mode).build().expect("valid config");
    RelationshipEngine::with_config(YieldingStore::new(MemoryStore::new()), config)
        .expect("valid config")
}

#[rstest]
#[tokio::test]
async fn simultaneous_follows_are_reciprocated(
    #[values(WriteMode::Pipelined, WriteMode::Sequential)] mode: WriteMode,
) {
    let engine = engine(mode);
    let (a, b) = (Identity::from(1_u64), Identity::from(2_u64));

    let (ab, ba) = tokio::join!(engine.follow(&a, &b), engine.follow(&b, &a));
    ab.expect("follow");
    ba.expect("follow back");

    assert!(engine.is_following(&a, &b).await.expect("is_following"));
    assert!(engine.is_following(&b, &a).await.expect("is_following"));
    assert!(engine.is_reciprocated(&a, &b).await.expect("is_reciprocated"));
    assert!(engine.is_reciprocated(&b, &a).await.expect("is_reciprocated"));
    assert_eq!(engine.reciprocated_count(&a).await.expect("count"), 1);
    assert_eq!(engine.reciprocated_count(&b).await.expect("count"), 1);
}

#[rstest]
#[tokio::test]
async fn simultaneous_follows_across_many_pairs(
    #[values(WriteMode::Pipelined, WriteMode::Sequential)] mode: WriteMode,
) {
    let engine = engine(mode);
    let hub = Identity::from(0_u64);

    for n in 1..=5_u64 {
        let other = Identity::from(n);
        let (out, back) = tokio::join!(engine.follow(&hub, &other), engine.follow(&other, &hub));
        out.expect("follow");
        back.expect("follow back");
    }

    assert_eq!(engine.reciprocated_count(&hub).await.expect("count"), 5);
    for n in 1..=5_u64 {
        assert!(engine.is_reciprocated(&Identity::from(n), &hub).await.expect("is_reciprocated"));
    }
}

#[tokio::test]
async fn simultaneous_follow_and_block_keeps_block() {
    let engine = engine(WriteMode::Pipelined);
    let (a, b) = (Identity::from(1_u64), Identity::from(2_u64));

    let (follow, block) = tokio::join!(engine.follow(&a, &b), engine.block(&b, &a));
    follow.expect("follow");
    block.expect("block");

    assert!(engine.is_blocked(&b, &a).await.expect("is_blocked"));
    assert!(!engine.is_following(&a, &b).await.expect("is_following"));
    assert!(!engine.is_reciprocated(&a, &b).await.expect("is_reciprocated"));
}
