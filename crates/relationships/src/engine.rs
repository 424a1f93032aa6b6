//! The relationship engine.
//!
//! [`RelationshipEngine`] maps follow, unfollow, block and unblock onto a
//! short, fixed list of sorted-set writes against the sets named by
//! [`KeySpace`], and answers predicates, listings and counts with single
//! store reads. It keeps no relationship state of its own.
//!
//! # Write plans
//!
//! Every mutation first performs the reads it needs (is either side
//! blocked? does the target already follow back?), then produces an ordered
//! list of [`PipelineOp`]s. In [`WriteMode::Pipelined`] the list is committed
//! through one store [`Pipeline`](socialgraph_store::Pipeline), so other
//! readers see all of it or none of it. In [`WriteMode::Sequential`] the
//! operations are applied one at a time, in list order:
//!
//! | Operation  | Order |
//! |------------|-------|
//! | `follow`   | following, followers, then both reciprocated entries |
//! | `unfollow` | both reciprocated entries, then following, followers |
//! | `block`    | blocked, then both directions as `unfollow` |
//! | `clear`    | per set, reciprocated first: counterpart entries, then the own set |
//!
//! A failure part-way leaves at worst a follow edge without its reciprocated
//! entries, never the reverse. Every operation is idempotent, so re-running
//! a failed one converges.
//!
//! # Concurrency
//!
//! The engine takes no locks, and the reads that shape a write plan are not
//! part of its pipeline. `follow` therefore re-checks for a follow back
//! after its edge is committed: when `A` follows `B` while `B` follows `A`,
//! whichever commits second sees the other edge and records the
//! reciprocation. Other races are not serialized. A `follow` that overlaps
//! a `block` or `unfollow` of the same pair can leave a stale entry, and
//! nothing repairs it until one of the pair's operations is run again.

use socialgraph_store::{HealthProbe, HealthStatus, PipelineOp, Score, SortedSetStore};
use tracing::debug;

use crate::{
    clock::{MonotonicClock, ScoreClock},
    config::{RelationshipConfig, WriteMode},
    error::Result,
    identity::Identity,
    keys::{KeySpace, Relation},
    pagination::{Page, ResolvedPage, page_count},
};

/// Follow, follower, block and reciprocated relationships over a
/// [`SortedSetStore`].
///
/// The store handle is shared, never locked across calls; an engine is cheap
/// to share behind an `Arc` or to build per request around a cloned handle.
///
/// # Example
///
/// ```
/// use socialgraph::{Identity, Page, RelationshipEngine};
/// use socialgraph_store::MemoryStore;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let engine = RelationshipEngine::new(MemoryStore::new());
/// let (alice, bob) = (Identity::from("alice"), Identity::from("bob"));
///
/// engine.follow(&alice, &bob).await?;
/// engine.follow(&bob, &alice).await?;
///
/// assert!(engine.is_following(&alice, &bob).await?);
/// assert!(engine.is_follower(&bob, &alice).await?);
/// assert!(engine.is_reciprocated(&alice, &bob).await?);
/// assert_eq!(engine.followers(&bob, Page::first()).await?, vec![alice.clone()]);
/// # Ok::<(), socialgraph::RelationshipError>(())
/// # }).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RelationshipEngine<S, C = MonotonicClock> {
    store: S,
    clock: C,
    keys: KeySpace,
    config: RelationshipConfig,
}

impl<S: SortedSetStore> RelationshipEngine<S> {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(store: S) -> Self {
        let config = RelationshipConfig::default();
        Self { store, clock: MonotonicClock::new(), keys: KeySpace::new(&config), config }
    }

    /// Creates an engine with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RelationshipError::Config`](crate::RelationshipError::Config)
    /// if `config` fails validation (possible for deserialized values).
    pub fn with_config(store: S, config: RelationshipConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, clock: MonotonicClock::new(), keys: KeySpace::new(&config), config })
    }
}

impl<S: SortedSetStore, C: ScoreClock> RelationshipEngine<S, C> {
    /// Replaces the score clock.
    #[must_use]
    pub fn with_clock<C2: ScoreClock>(self, clock: C2) -> RelationshipEngine<S, C2> {
        RelationshipEngine { store: self.store, clock, keys: self.keys, config: self.config }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &RelationshipConfig {
        &self.config
    }

    /// Returns the key space the engine writes to.
    #[must_use]
    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Makes `actor` follow `target`.
    ///
    /// A no-op when `actor == target` or when either has blocked the other.
    /// When `target` already follows `actor`, both also join each other's
    /// reciprocated set. Following twice keeps the original position.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    #[tracing::instrument(skip(self, actor, target), fields(actor = %actor, target = %target))]
    pub async fn follow(&self, actor: &Identity, target: &Identity) -> Result<()> {
        validate_pair(actor, target)?;
        if actor == target {
            debug!("ignoring self-follow");
            return Ok(());
        }
        if self.either_blocked(actor, target).await? {
            debug!("ignoring follow between blocked identities");
            return Ok(());
        }

        let reciprocal = self.contains(Relation::Following, target, actor).await?;
        let score = self.clock.next_score();

        let mut ops = vec![
            self.add_op(Relation::Following, actor, target, score),
            self.add_op(Relation::Followers, target, actor, score),
        ];
        if reciprocal {
            ops.extend(self.reciprocate_ops(actor, target, score));
            return self.apply(ops).await;
        }
        self.apply(ops).await?;

        // A concurrent follow back may have committed after the read above.
        // Of two racing follows, at least one sees the other's edge here.
        if self.contains(Relation::Following, target, actor).await? {
            debug!("follow back landed concurrently, recording reciprocation");
            self.apply(self.reciprocate_ops(actor, target, score).into()).await?;
        }
        Ok(())
    }

    /// Makes `actor` stop following `target`.
    ///
    /// Removes the edge and any reciprocation between the two. Safe to call
    /// when no edge exists.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    #[tracing::instrument(skip(self, actor, target), fields(actor = %actor, target = %target))]
    pub async fn unfollow(&self, actor: &Identity, target: &Identity) -> Result<()> {
        validate_pair(actor, target)?;
        let mut ops = Vec::with_capacity(4);
        self.push_unfollow(&mut ops, actor, target);
        self.apply(ops).await
    }

    /// Makes `actor` block `target`.
    ///
    /// Severs follow edges in both directions (and the reciprocation they
    /// supported), and prevents either from following the other until
    /// unblocked. A no-op when `actor == target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    #[tracing::instrument(skip(self, actor, target), fields(actor = %actor, target = %target))]
    pub async fn block(&self, actor: &Identity, target: &Identity) -> Result<()> {
        validate_pair(actor, target)?;
        if actor == target {
            debug!("ignoring self-block");
            return Ok(());
        }

        let score = self.clock.next_score();
        let mut ops = Vec::with_capacity(7);
        ops.push(self.add_op(Relation::Blocked, actor, target, score));
        self.push_unfollow(&mut ops, actor, target);
        ops.push(self.remove_op(Relation::Following, target, actor));
        ops.push(self.remove_op(Relation::Followers, actor, target));
        self.apply(ops).await
    }

    /// Lifts `actor`'s block on `target`.
    ///
    /// Edges severed by the block are not restored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    #[tracing::instrument(skip(self, actor, target), fields(actor = %actor, target = %target))]
    pub async fn unblock(&self, actor: &Identity, target: &Identity) -> Result<()> {
        validate_pair(actor, target)?;
        let key = self.keys.key(Relation::Blocked, actor);
        if !self.store.remove(&key, target.as_bytes()).await? {
            debug!("ignoring unblock of identity that was not blocked");
        }
        Ok(())
    }

    /// Removes every relationship `identity` takes part in.
    ///
    /// Deletes the identity's own four sets and removes it from the
    /// following, followers and reciprocated sets of everyone it was linked
    /// to. Blocks placed on `identity` by others are not tracked in any of its
    /// own sets and are left in place.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    #[tracing::instrument(skip(self, identity), fields(identity = %identity))]
    pub async fn clear(&self, identity: &Identity) -> Result<()> {
        identity.validate()?;
        let following = self.all(Relation::Following, identity).await?;
        let followers = self.all(Relation::Followers, identity).await?;
        let reciprocated = self.all(Relation::Reciprocated, identity).await?;

        let mut ops = Vec::with_capacity(
            reciprocated.len() + following.len() + followers.len() + Relation::ALL.len(),
        );
        // Reciprocated entries go first so a partial failure never leaves
        // one behind without its supporting edges.
        for (relation, others) in [
            (Relation::Reciprocated, &reciprocated),
            (Relation::Following, &following),
            (Relation::Followers, &followers),
        ] {
            for other in others {
                ops.push(self.remove_op(relation.inverse(), other, identity));
            }
            ops.push(self.delete_op(relation, identity));
        }
        ops.push(self.delete_op(Relation::Blocked, identity));

        debug!(
            following = following.len(),
            followers = followers.len(),
            reciprocated = reciprocated.len(),
            "clearing identity"
        );
        self.apply(ops).await
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    /// Returns `true` if `member` is in `identity`'s set for `relation`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    #[tracing::instrument(
        skip(self, relation, identity, member),
        fields(relation = %relation, identity = %identity, member = %member)
    )]
    pub async fn contains(
        &self,
        relation: Relation,
        identity: &Identity,
        member: &Identity,
    ) -> Result<bool> {
        validate_pair(identity, member)?;
        let key = self.keys.key(relation, identity);
        Ok(self.store.contains(&key, member.as_bytes()).await?)
    }

    /// Returns `true` if `actor` follows `target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    pub async fn is_following(&self, actor: &Identity, target: &Identity) -> Result<bool> {
        self.contains(Relation::Following, actor, target).await
    }

    /// Returns `true` if `follower` follows `identity`.
    ///
    /// After `follow(a, b)`, `is_follower(b, a)` holds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    pub async fn is_follower(&self, identity: &Identity, follower: &Identity) -> Result<bool> {
        self.contains(Relation::Followers, identity, follower).await
    }

    /// Returns `true` if `actor` has blocked `target`. Always `false` for
    /// `actor == target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    pub async fn is_blocked(&self, actor: &Identity, target: &Identity) -> Result<bool> {
        if actor == target {
            actor.validate()?;
            return Ok(false);
        }
        self.contains(Relation::Blocked, actor, target).await
    }

    /// Returns `true` if `a` and `b` follow each other.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    pub async fn is_reciprocated(&self, a: &Identity, b: &Identity) -> Result<bool> {
        self.contains(Relation::Reciprocated, a, b).await
    }

    // ------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------

    /// Returns one page of `identity`'s set for `relation`, most recent first.
    ///
    /// Pages past the end are empty unless `clamp_pages` is configured, in
    /// which case the last page is returned instead.
    ///
    /// # Errors
    ///
    /// - `InvalidIdentity` for an empty identity
    /// - `InvalidPage` for page 0 (unless clamping) or page size 0
    /// - `Store` if a member cannot be decoded or the store fails
    #[tracing::instrument(
        skip(self, relation, identity),
        fields(relation = %relation, identity = %identity)
    )]
    pub async fn members(
        &self,
        relation: Relation,
        identity: &Identity,
        page: Page,
    ) -> Result<Vec<Identity>> {
        identity.validate()?;
        let clamp = self.config.clamp_pages();
        let mut resolved = ResolvedPage::resolve(page, self.config.page_size(), clamp)?;
        let key = self.keys.key(relation, identity);
        if clamp {
            resolved = resolved.clamp_to(self.store.cardinality(&key).await?);
        }

        let members = self.store.range_desc(&key, resolved.ranks()).await?;
        members.into_iter().map(Identity::from_member).collect()
    }

    /// Returns the whole of `identity`'s set for `relation`, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    #[tracing::instrument(
        skip(self, relation, identity),
        fields(relation = %relation, identity = %identity)
    )]
    pub async fn all(&self, relation: Relation, identity: &Identity) -> Result<Vec<Identity>> {
        identity.validate()?;
        let key = self.keys.key(relation, identity);
        let members = self.store.range_desc(&key, 0..=usize::MAX).await?;
        members.into_iter().map(Identity::from_member).collect()
    }

    /// Identities `identity` follows, most recent first.
    ///
    /// # Errors
    ///
    /// See [`members`](Self::members).
    pub async fn following(&self, identity: &Identity, page: Page) -> Result<Vec<Identity>> {
        self.members(Relation::Following, identity, page).await
    }

    /// Identities following `identity`, most recent first.
    ///
    /// # Errors
    ///
    /// See [`members`](Self::members).
    pub async fn followers(&self, identity: &Identity, page: Page) -> Result<Vec<Identity>> {
        self.members(Relation::Followers, identity, page).await
    }

    /// Identities `identity` has blocked, most recent first.
    ///
    /// # Errors
    ///
    /// See [`members`](Self::members).
    pub async fn blocked(&self, identity: &Identity, page: Page) -> Result<Vec<Identity>> {
        self.members(Relation::Blocked, identity, page).await
    }

    /// Identities in a mutual follow with `identity`, most recent first.
    ///
    /// # Errors
    ///
    /// See [`members`](Self::members).
    pub async fn reciprocated(&self, identity: &Identity, page: Page) -> Result<Vec<Identity>> {
        self.members(Relation::Reciprocated, identity, page).await
    }

    // ------------------------------------------------------------------
    // Counts
    // ------------------------------------------------------------------

    /// Returns the size of `identity`'s set for `relation`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentity` for an empty or oversized identity, or the
    /// store error.
    #[tracing::instrument(
        skip(self, relation, identity),
        fields(relation = %relation, identity = %identity)
    )]
    pub async fn count(&self, relation: Relation, identity: &Identity) -> Result<u64> {
        identity.validate()?;
        let key = self.keys.key(relation, identity);
        Ok(self.store.cardinality(&key).await?)
    }

    /// Returns how many pages listing `identity`'s set for `relation` takes.
    ///
    /// `page_size` defaults to the configured page size. An empty set has one
    /// page.
    ///
    /// # Errors
    ///
    /// - `InvalidIdentity` for an empty identity
    /// - `InvalidPage` for a page size of 0
    /// - `Store` if the store fails
    pub async fn page_count(
        &self,
        relation: Relation,
        identity: &Identity,
        page_size: Option<u64>,
    ) -> Result<u64> {
        let page = Page::with_size(1, page_size.unwrap_or(self.config.page_size()));
        let resolved = ResolvedPage::resolve(page, self.config.page_size(), false)?;
        let count = self.count(relation, identity).await?;
        Ok(page_count(count, resolved.size))
    }

    /// Number of identities `identity` follows.
    ///
    /// # Errors
    ///
    /// See [`count`](Self::count).
    pub async fn following_count(&self, identity: &Identity) -> Result<u64> {
        self.count(Relation::Following, identity).await
    }

    /// Number of identities following `identity`.
    ///
    /// # Errors
    ///
    /// See [`count`](Self::count).
    pub async fn followers_count(&self, identity: &Identity) -> Result<u64> {
        self.count(Relation::Followers, identity).await
    }

    /// Number of identities `identity` has blocked.
    ///
    /// # Errors
    ///
    /// See [`count`](Self::count).
    pub async fn blocked_count(&self, identity: &Identity) -> Result<u64> {
        self.count(Relation::Blocked, identity).await
    }

    /// Number of identities in a mutual follow with `identity`.
    ///
    /// # Errors
    ///
    /// See [`count`](Self::count).
    pub async fn reciprocated_count(&self, identity: &Identity) -> Result<u64> {
        self.count(Relation::Reciprocated, identity).await
    }

    /// Pages of [`following`](Self::following) at `page_size`.
    ///
    /// # Errors
    ///
    /// See [`page_count`](Self::page_count).
    pub async fn following_page_count(
        &self,
        identity: &Identity,
        page_size: Option<u64>,
    ) -> Result<u64> {
        self.page_count(Relation::Following, identity, page_size).await
    }

    /// Pages of [`followers`](Self::followers) at `page_size`.
    ///
    /// # Errors
    ///
    /// See [`page_count`](Self::page_count).
    pub async fn followers_page_count(
        &self,
        identity: &Identity,
        page_size: Option<u64>,
    ) -> Result<u64> {
        self.page_count(Relation::Followers, identity, page_size).await
    }

    /// Pages of [`blocked`](Self::blocked) at `page_size`.
    ///
    /// # Errors
    ///
    /// See [`page_count`](Self::page_count).
    pub async fn blocked_page_count(
        &self,
        identity: &Identity,
        page_size: Option<u64>,
    ) -> Result<u64> {
        self.page_count(Relation::Blocked, identity, page_size).await
    }

    /// Pages of [`reciprocated`](Self::reciprocated) at `page_size`.
    ///
    /// # Errors
    ///
    /// See [`page_count`](Self::page_count).
    pub async fn reciprocated_page_count(
        &self,
        identity: &Identity,
        page_size: Option<u64>,
    ) -> Result<u64> {
        self.page_count(Relation::Reciprocated, identity, page_size).await
    }

    /// Checks the health of the underlying store.
    ///
    /// # Errors
    ///
    /// Returns the store error if the probe itself could not run.
    #[tracing::instrument(skip(self))]
    pub async fn health_check(&self, probe: HealthProbe) -> Result<HealthStatus> {
        Ok(self.store.health_check(probe).await?)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn either_blocked(&self, actor: &Identity, target: &Identity) -> Result<bool> {
        Ok(self.contains(Relation::Blocked, actor, target).await?
            || self.contains(Relation::Blocked, target, actor).await?)
    }

    fn push_unfollow(&self, ops: &mut Vec<PipelineOp>, actor: &Identity, target: &Identity) {
        ops.push(self.remove_op(Relation::Reciprocated, actor, target));
        ops.push(self.remove_op(Relation::Reciprocated, target, actor));
        ops.push(self.remove_op(Relation::Following, actor, target));
        ops.push(self.remove_op(Relation::Followers, target, actor));
    }

    fn reciprocate_ops(&self, a: &Identity, b: &Identity, score: Score) -> [PipelineOp; 2] {
        [
            self.add_op(Relation::Reciprocated, a, b, score),
            self.add_op(Relation::Reciprocated, b, a, score),
        ]
    }

    fn add_op(
        &self,
        relation: Relation,
        owner: &Identity,
        member: &Identity,
        score: Score,
    ) -> PipelineOp {
        PipelineOp::Add {
            key: self.keys.key(relation, owner),
            member: member.as_bytes().to_vec(),
            score,
        }
    }

    fn remove_op(&self, relation: Relation, owner: &Identity, member: &Identity) -> PipelineOp {
        PipelineOp::Remove { key: self.keys.key(relation, owner), member: member.as_bytes().to_vec() }
    }

    fn delete_op(&self, relation: Relation, owner: &Identity) -> PipelineOp {
        PipelineOp::Delete { key: self.keys.key(relation, owner) }
    }

    /// Writes `ops` according to the configured [`WriteMode`].
    async fn apply(&self, ops: Vec<PipelineOp>) -> Result<()> {
        match self.config.write_mode() {
            WriteMode::Pipelined => {
                let mut pipeline = self.store.pipeline().await?;
                for op in ops {
                    match op {
                        PipelineOp::Add { key, member, score } => pipeline.add(key, member, score),
                        PipelineOp::Remove { key, member } => pipeline.remove(key, member),
                        PipelineOp::Delete { key } => pipeline.delete(key),
                    }
                }
                debug!(ops = pipeline.len(), "committing pipeline");
                pipeline.commit().await?;
            },
            WriteMode::Sequential => {
                for op in ops {
                    match op {
                        PipelineOp::Add { key, member, score } => {
                            self.store.add(&key, member, score).await?;
                        },
                        PipelineOp::Remove { key, member } => {
                            self.store.remove(&key, &member).await?;
                        },
                        PipelineOp::Delete { key } => self.store.delete(&key).await?,
                    }
                }
            },
        }
        Ok(())
    }
}

fn validate_pair(a: &Identity, b: &Identity) -> Result<()> {
    a.validate()?;
    b.validate()
}
