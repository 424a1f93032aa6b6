//! Common types used across store operations.

use std::ops::RangeInclusive;

use bytes::Bytes;

use crate::error::{StoreError, StoreResult};

/// Score attached to a sorted-set member.
///
/// Scores are finite `f64` values, matching the numeric range of common
/// ordered-set stores.
pub type Score = f64;

/// A member returned from a scored range query.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use socialgraph_store::ScoredMember;
///
/// let entry = ScoredMember::new(Bytes::from("42"), 1_700_000_000.0);
/// assert_eq!(entry.member, Bytes::from("42"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    /// The member bytes.
    pub member: Bytes,

    /// The score the member was inserted with.
    pub score: Score,
}

impl ScoredMember {
    /// Creates a new scored member.
    pub fn new(member: Bytes, score: Score) -> Self {
        Self { member, score }
    }
}

/// Direction of a ranked read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeOrder {
    /// Lowest score first. Ties are ordered by member bytes, ascending.
    Ascending,
    /// Highest score first. Ties are ordered by member bytes, descending.
    Descending,
}

/// Number of ranks covered by an inclusive rank window.
///
/// Returns 0 for an inverted window (`start > end`).
#[must_use]
pub fn rank_window_len(ranks: &RangeInclusive<usize>) -> usize {
    if ranks.start() > ranks.end() { 0 } else { (ranks.end() - ranks.start()).saturating_add(1) }
}

/// Rejects NaN and infinite scores.
///
/// # Errors
///
/// Returns [`StoreError::InvalidArgument`] if `score` is not finite.
pub fn validate_score(score: Score) -> StoreResult<()> {
    if score.is_finite() {
        Ok(())
    } else {
        Err(StoreError::invalid_argument(format!("score must be finite, got {score}")))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0..=0, 1)]
    #[case(0..=24, 25)]
    #[case(25..=49, 25)]
    #[case(RangeInclusive::new(5, 4), 0)]
    #[case(usize::MAX..=usize::MAX, 1)]
    fn window_length(#[case] ranks: RangeInclusive<usize>, #[case] expected: usize) {
        assert_eq!(rank_window_len(&ranks), expected);
    }

    #[rstest]
    #[case::nan(f64::NAN)]
    #[case::positive_infinity(f64::INFINITY)]
    #[case::negative_infinity(f64::NEG_INFINITY)]
    fn non_finite_scores_rejected(#[case] score: Score) {
        assert!(matches!(validate_score(score), Err(StoreError::InvalidArgument { .. })));
    }

    #[test]
    fn finite_scores_accepted() {
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(-1.5).is_ok());
        assert!(validate_score(1_700_000_000_000_000.0).is_ok());
    }
}
