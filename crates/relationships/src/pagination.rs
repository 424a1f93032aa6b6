//! Page selection for relationship listings.
//!
//! Pages are 1-based. Page `n` of size `s` covers the inclusive ranks
//! `(n-1)*s ..= n*s - 1`, counted from the most recent member.

use std::ops::RangeInclusive;

use crate::error::{RelationshipError, Result};

/// A requested page of a listing.
///
/// A page without an explicit size uses the engine's configured page size.
///
/// # Examples
///
/// ```
/// use socialgraph::Page;
///
/// assert_eq!(Page::default(), Page::first());
/// assert_eq!(Page::new(3).number(), 3);
/// assert_eq!(Page::with_size(2, 10).size(), Some(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    number: u64,
    size: Option<u64>,
}

impl Page {
    /// Page `number` at the configured page size.
    #[must_use]
    pub const fn new(number: u64) -> Self {
        Self { number, size: None }
    }

    /// Page `number` holding at most `size` identities.
    #[must_use]
    pub const fn with_size(number: u64, size: u64) -> Self {
        Self { number, size: Some(size) }
    }

    /// The first page at the configured page size.
    #[must_use]
    pub const fn first() -> Self {
        Self::new(1)
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    /// Returns the explicit page size, if one was given.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        self.size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first()
    }
}

/// A page whose number and size have been checked against the engine's
/// settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedPage {
    pub(crate) number: u64,
    pub(crate) size: u64,
}

impl ResolvedPage {
    /// Fills in the default size and rejects zero values.
    ///
    /// With `clamp` set, page 0 becomes page 1; a zero size is still an error.
    pub(crate) fn resolve(page: Page, default_size: u64, clamp: bool) -> Result<Self> {
        let size = page.size.unwrap_or(default_size);
        let number = match page.number {
            0 if clamp => 1,
            n => n,
        };
        if number == 0 || size == 0 {
            return Err(RelationshipError::InvalidPage { page: page.number, page_size: size });
        }
        Ok(Self { number, size })
    }

    /// Moves a page past the end back onto the last page.
    pub(crate) fn clamp_to(self, cardinality: u64) -> Self {
        Self { number: self.number.min(page_count(cardinality, self.size)), ..self }
    }

    /// Inclusive rank window of this page.
    pub(crate) fn ranks(self) -> RangeInclusive<usize> {
        rank_window(self.number, self.size)
    }
}

/// Number of pages needed to list `cardinality` members, `page_size` at a time.
///
/// An empty set still has one (empty) page.
///
/// # Examples
///
/// ```
/// use socialgraph::pagination::page_count;
///
/// assert_eq!(page_count(0, 25), 1);
/// assert_eq!(page_count(25, 25), 1);
/// assert_eq!(page_count(26, 25), 2);
/// ```
#[must_use]
pub fn page_count(cardinality: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 1;
    }
    cardinality.div_ceil(page_size).max(1)
}

/// Inclusive 0-based rank window of 1-based page `number`.
///
/// Saturates instead of overflowing; a saturated window simply lies past the
/// end of any set.
#[must_use]
pub fn rank_window(number: u64, page_size: u64) -> RangeInclusive<usize> {
    let start = number.saturating_sub(1).saturating_mul(page_size);
    let end = start.saturating_add(page_size.saturating_sub(1));
    to_usize(start)..=to_usize(end)
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::empty(0, 25, 1)]
    #[case::exact(25, 25, 1)]
    #[case::one_over(26, 25, 2)]
    #[case::small_pages(25, 10, 3)]
    #[case::single(25, 5, 5)]
    #[case::tiny(26, 5, 6)]
    #[case::one_per_page(7, 1, 7)]
    fn test_page_count(#[case] cardinality: u64, #[case] size: u64, #[case] expected: u64) {
        assert_eq!(page_count(cardinality, size), expected);
    }

    #[rstest]
    #[case::first(1, 25, 0, 24)]
    #[case::second(2, 25, 25, 49)]
    #[case::third_of_ten(3, 10, 20, 29)]
    #[case::single(4, 1, 3, 3)]
    fn test_rank_window(
        #[case] number: u64,
        #[case] size: u64,
        #[case] start: usize,
        #[case] end: usize,
    ) {
        assert_eq!(rank_window(number, size), start..=end);
    }

    #[test]
    fn test_rank_window_saturates() {
        let window = rank_window(u64::MAX, u64::MAX);
        assert_eq!(*window.end(), usize::MAX);
    }

    #[test]
    fn test_resolve_uses_default_size() {
        let page = ResolvedPage::resolve(Page::new(2), 25, false).unwrap();
        assert_eq!(page, ResolvedPage { number: 2, size: 25 });

        let page = ResolvedPage::resolve(Page::with_size(2, 5), 25, false).unwrap();
        assert_eq!(page.size, 5);
    }

    #[rstest]
    #[case::page_zero(Page::new(0), false)]
    #[case::size_zero(Page::with_size(1, 0), false)]
    #[case::size_zero_clamped(Page::with_size(1, 0), true)]
    fn test_resolve_rejects(#[case] page: Page, #[case] clamp: bool) {
        let result = ResolvedPage::resolve(page, 25, clamp);
        assert!(matches!(result, Err(RelationshipError::InvalidPage { .. })));
    }

    #[test]
    fn test_clamping() {
        let page = ResolvedPage::resolve(Page::new(0), 25, true).unwrap();
        assert_eq!(page.number, 1);

        let page = ResolvedPage::resolve(Page::new(9), 10, true).unwrap().clamp_to(25);
        assert_eq!(page.number, 3);
        assert_eq!(page.ranks(), 20..=29);

        let page = ResolvedPage::resolve(Page::new(9), 10, true).unwrap().clamp_to(0);
        assert_eq!(page.number, 1);
    }

    proptest! {
        /// Consecutive pages tile the rank space without gaps or overlap.
        #[test]
        fn pages_tile_ranks(number in 1u64..10_000, size in 1u64..1_000) {
            let this = rank_window(number, size);
            let next = rank_window(number + 1, size);
            prop_assert_eq!(*this.end() + 1, *next.start());
            prop_assert_eq!(this.count() as u64, size);
        }

        /// Every member lands on exactly one page in `1..=page_count`.
        #[test]
        fn page_count_covers_every_rank(cardinality in 0u64..5_000, size in 1u64..200) {
            let pages = page_count(cardinality, size);
            prop_assert!(pages >= 1);
            if cardinality > 0 {
                let last = rank_window(pages, size);
                prop_assert!((*last.start() as u64) < cardinality);
                prop_assert!((*last.end() as u64) >= cardinality - 1);
            }
        }
    }
}
