//! Score sources for new relationship edges.
//!
//! Listings are ordered by score, most recent first, so every edge written by
//! one engine must get a larger score than the one before it.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use chrono::Utc;
use socialgraph_store::Score;

/// Source of scores for newly inserted members.
pub trait ScoreClock: Send + Sync {
    /// Returns a finite score strictly greater than any previously returned.
    fn next_score(&self) -> Score;
}

/// Wall-clock scores in microseconds since the Unix epoch.
///
/// Two edges written within the same microsecond still get distinct,
/// increasing scores: when the clock has not advanced, the previous score is
/// bumped by one. Clones share their last issued value.
#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    last: Arc<AtomicI64>,
}

impl MonotonicClock {
    /// Creates a clock that has issued nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_micros(&self) -> i64 {
        let now = Utc::now().timestamp_micros();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }
}

impl ScoreClock for MonotonicClock {
    #[allow(clippy::cast_precision_loss)]
    fn next_score(&self) -> Score {
        // Microsecond timestamps stay below 2^53 until long after year 2200.
        self.next_micros() as Score
    }
}

/// Deterministic clock counting up from a starting score.
///
/// Used in tests and benchmarks where scores must be reproducible.
#[derive(Debug, Clone)]
pub struct SequenceClock {
    next: Arc<AtomicI64>,
}

impl SequenceClock {
    /// Creates a clock whose first score is `start`.
    #[must_use]
    pub fn starting_at(start: i64) -> Self {
        Self { next: Arc::new(AtomicI64::new(start)) }
    }
}

impl Default for SequenceClock {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl ScoreClock for SequenceClock {
    #[allow(clippy::cast_precision_loss)]
    fn next_score(&self) -> Score {
        self.next.fetch_add(1, Ordering::SeqCst) as Score
    }
}

impl<C: ScoreClock + ?Sized> ScoreClock for Arc<C> {
    fn next_score(&self) -> Score {
        (**self).next_score()
    }
}
