//! Occurrence sets: the three representations of "when".
//!
//! An [`OccurSet`] is the result of evaluating a rule (or a whole event)
//! over a day range: a set of whole days, a list of closed-open epoch
//! intervals, or a set of discrete instants. Producers may emit interval
//! lists unsorted and unmerged; the set operations normalize internally.
//!
//! All values are integer Julian Days or integer epoch seconds -- the
//! algebra is exact.

use std::collections::BTreeSet;

use crate::cal::{epoch_to_jd, jd_to_epoch, Epoch, Jd, DAY_SECONDS};

mod intersect;

/// A closed-open `[start, end)` range of epoch seconds.
pub type Span = (Epoch, Epoch);

/// The set of time instants/intervals during which something occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccurSet {
    /// Whole days, as Julian Day numbers.
    Days(BTreeSet<Jd>),
    /// Closed-open epoch-second ranges; not necessarily sorted or merged.
    Intervals(Vec<Span>),
    /// Discrete epoch-second instants.
    Instants(BTreeSet<Epoch>),
}

impl OccurSet {
    pub fn empty_days() -> Self {
        Self::Days(BTreeSet::new())
    }

    pub fn empty_intervals() -> Self {
        Self::Intervals(Vec::new())
    }

    pub fn empty_instants() -> Self {
        Self::Instants(BTreeSet::new())
    }

    pub fn days_from_iter(iter: impl IntoIterator<Item = Jd>) -> Self {
        Self::Days(iter.into_iter().collect())
    }

    /// A day set covering every day of `[start_jd, end_jd)`.
    pub fn day_range(start_jd: Jd, end_jd: Jd) -> Self {
        Self::Days((start_jd..end_jd).collect())
    }

    pub fn instants_from_iter(iter: impl IntoIterator<Item = Epoch>) -> Self {
        Self::Instants(iter.into_iter().collect())
    }

    /// A single interval, empty if `start >= end`.
    pub fn single_interval(start: Epoch, end: Epoch) -> Self {
        if start >= end {
            Self::Intervals(Vec::new())
        } else {
            Self::Intervals(vec![(start, end)])
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Days(days) => days.is_empty(),
            Self::Intervals(spans) => spans.is_empty(),
            Self::Instants(instants) => instants.is_empty(),
        }
    }

    /// First Julian Day of the bounding range, `None` if empty.
    pub fn start_jd(&self) -> Option<Jd> {
        match self {
            Self::Days(days) => days.first().copied(),
            Self::Intervals(spans) => spans.iter().map(|&(s, _)| epoch_to_jd(s)).min(),
            Self::Instants(instants) => instants.first().map(|&t| epoch_to_jd(t)),
        }
    }

    /// One past the last Julian Day of the bounding range, `None` if empty.
    pub fn end_jd(&self) -> Option<Jd> {
        match self {
            Self::Days(days) => days.last().map(|&d| d + 1),
            Self::Intervals(spans) => spans
                .iter()
                .map(|&(s, e)| epoch_to_jd(if e > s { e - 1 } else { s }) + 1)
                .max(),
            Self::Instants(instants) => instants.last().map(|&t| epoch_to_jd(t) + 1),
        }
    }

    /// Sorted day-granularity view: every Julian Day touched by the set.
    pub fn days_jd_list(&self) -> Vec<Jd> {
        match self {
            Self::Days(days) => days.iter().copied().collect(),
            Self::Intervals(spans) => {
                let mut days = BTreeSet::new();
                for &(s, e) in spans {
                    let last = if e > s { e - 1 } else { s };
                    for jd in epoch_to_jd(s)..=epoch_to_jd(last) {
                        days.insert(jd);
                    }
                }
                days.into_iter().collect()
            }
            Self::Instants(instants) => {
                let days: BTreeSet<Jd> = instants.iter().map(|&t| epoch_to_jd(t)).collect();
                days.into_iter().collect()
            }
        }
    }

    /// Canonical interval view. A day becomes its full `[start, start+86400)`
    /// range; an instant becomes the near-zero-width `[t, t+1)` so it
    /// survives the index's zero-width-is-a-no-op rule.
    pub fn time_range_list(&self) -> Vec<Span> {
        match self {
            Self::Days(days) => days
                .iter()
                .map(|&jd| (jd_to_epoch(jd), jd_to_epoch(jd) + DAY_SECONDS))
                .collect(),
            Self::Intervals(spans) => spans.clone(),
            Self::Instants(instants) => instants.iter().map(|&t| (t, t + 1)).collect(),
        }
    }

    /// Intersect two occurrence sets, following the promotion table:
    /// Days∩Days stays Days, Instants filter through everything, and every
    /// other pairing promotes to Intervals. Always returns a new value.
    pub fn intersect(&self, other: &OccurSet) -> OccurSet {
        intersect::intersect(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cal::UNIX_EPOCH_JD;

    #[test]
    fn test_bounds_of_day_set() {
        let set = OccurSet::days_from_iter([10, 12, 11]);
        assert_eq!(set.start_jd(), Some(10));
        assert_eq!(set.end_jd(), Some(13));
        assert_eq!(set.days_jd_list(), vec![10, 11, 12]);
        assert!(OccurSet::empty_days().start_jd().is_none());
    }

    #[test]
    fn test_bounds_of_intervals() {
        let day0 = jd_to_epoch(UNIX_EPOCH_JD);
        let set = OccurSet::Intervals(vec![(day0 + 3600, day0 + 7200)]);
        assert_eq!(set.start_jd(), Some(UNIX_EPOCH_JD));
        assert_eq!(set.end_jd(), Some(UNIX_EPOCH_JD + 1));
        // A range ending exactly at midnight does not touch the next day.
        let set = OccurSet::Intervals(vec![(day0, day0 + DAY_SECONDS)]);
        assert_eq!(set.days_jd_list(), vec![UNIX_EPOCH_JD]);
    }

    #[test]
    fn test_instant_time_ranges_are_near_zero_width() {
        let set = OccurSet::instants_from_iter([100, 200]);
        assert_eq!(set.time_range_list(), vec![(100, 101), (200, 201)]);
    }

    #[test]
    fn test_day_time_ranges_cover_whole_days() {
        let set = OccurSet::days_from_iter([UNIX_EPOCH_JD]);
        assert_eq!(set.time_range_list(), vec![(0, DAY_SECONDS)]);
    }

    #[test]
    fn test_single_interval_rejects_inverted_range() {
        assert!(OccurSet::single_interval(10, 10).is_empty());
        assert!(OccurSet::single_interval(10, 5).is_empty());
        assert!(!OccurSet::single_interval(5, 10).is_empty());
    }
}
