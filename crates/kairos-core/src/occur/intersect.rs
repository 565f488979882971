//! Intersection over occurrence-set variants.
//!
//! The promotion table (A down the side, B across the top):
//!
//! |           | Days      | Intervals | Instants |
//! |-----------|-----------|-----------|----------|
//! | Days      | Days      | Intervals | Instants |
//! | Intervals | Intervals | Intervals | Instants |
//! | Instants  | Instants  | Instants  | Instants |
//!
//! Instants filter through any other operand; mixed day/interval pairings
//! promote to intervals via a sorted two-pointer sweep.

use std::collections::BTreeSet;

use super::{OccurSet, Span};
use crate::cal::{jd_to_epoch, DAY_SECONDS};

pub(super) fn intersect(a: &OccurSet, b: &OccurSet) -> OccurSet {
    use OccurSet::*;
    match (a, b) {
        (Days(x), Days(y)) => Days(x.intersection(y).copied().collect()),
        (Instants(x), Instants(y)) => Instants(x.intersection(y).copied().collect()),
        (Instants(x), other) | (other, Instants(x)) => {
            Instants(filter_instants(x, &normalized_spans(other)))
        }
        (x, y) => Intervals(intersect_spans(&normalized_spans(x), &normalized_spans(y))),
    }
}

/// Sorted, merged interval view of a non-instant operand.
fn normalized_spans(set: &OccurSet) -> Vec<Span> {
    let mut spans: Vec<Span> = match set {
        OccurSet::Days(days) => days
            .iter()
            .map(|&jd| (jd_to_epoch(jd), jd_to_epoch(jd) + DAY_SECONDS))
            .collect(),
        OccurSet::Intervals(spans) => spans.iter().copied().filter(|&(s, e)| e > s).collect(),
        OccurSet::Instants(_) => unreachable!("instants are filtered, never normalized"),
    };
    spans.sort_unstable();
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for (s, e) in spans {
        match merged.last_mut() {
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }
    merged
}

/// Two-pointer intersection of two sorted, merged span lists.
fn intersect_spans(a: &[Span], b: &[Span]) -> Vec<Span> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let start = a[i].0.max(b[j].0);
        let end = a[i].1.min(b[j].1);
        if start < end {
            out.push((start, end));
        }
        if a[i].1 <= b[j].1 {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Keep the instants that fall inside any of the sorted spans.
fn filter_instants(instants: &BTreeSet<i64>, spans: &[Span]) -> BTreeSet<i64> {
    instants
        .iter()
        .copied()
        .filter(|&t| {
            // Last span starting at or before t, if any.
            let idx = spans.partition_point(|&(s, _)| s <= t);
            idx > 0 && t < spans[idx - 1].1
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cal::{jd_to_epoch, UNIX_EPOCH_JD};

    fn days(list: &[i64]) -> OccurSet {
        OccurSet::days_from_iter(list.iter().copied())
    }

    #[test]
    fn test_day_day_intersection() {
        let got = days(&[1, 2, 3]).intersect(&days(&[2, 3, 4]));
        assert_eq!(got, days(&[2, 3]));
    }

    #[test]
    fn test_day_interval_promotes() {
        let jd = UNIX_EPOCH_JD;
        let day0 = jd_to_epoch(jd);
        let ivl = OccurSet::Intervals(vec![(day0 + 3600, day0 + 7200)]);
        let got = days(&[jd]).intersect(&ivl);
        assert_eq!(got, OccurSet::Intervals(vec![(day0 + 3600, day0 + 7200)]));
        // Commuted operands give the same spans.
        assert_eq!(ivl.intersect(&days(&[jd])), got);
    }

    #[test]
    fn test_interval_interval_unsorted_input() {
        // Producers may emit unsorted, overlapping spans.
        let a = OccurSet::Intervals(vec![(50, 70), (0, 20), (10, 30)]);
        let b = OccurSet::Intervals(vec![(15, 55)]);
        let got = a.intersect(&b);
        assert_eq!(got, OccurSet::Intervals(vec![(15, 30), (50, 55)]));
    }

    #[test]
    fn test_instant_filtering() {
        let inst = OccurSet::instants_from_iter([5, 15, 25, 35]);
        let ivl = OccurSet::Intervals(vec![(10, 20), (30, 40)]);
        assert_eq!(inst.intersect(&ivl), OccurSet::instants_from_iter([15, 35]));
        assert_eq!(ivl.intersect(&inst), OccurSet::instants_from_iter([15, 35]));
        // Closed-open: the end bound is excluded, the start included.
        let edge = OccurSet::instants_from_iter([10, 20]);
        assert_eq!(edge.intersect(&ivl), OccurSet::instants_from_iter([10]));
    }

    #[test]
    fn test_instant_day_filtering() {
        let jd = UNIX_EPOCH_JD;
        let t = jd_to_epoch(jd) + 9 * 3600;
        let inst = OccurSet::instants_from_iter([t, t + 5 * DAY_SECONDS]);
        assert_eq!(
            inst.intersect(&days(&[jd])),
            OccurSet::instants_from_iter([t])
        );
    }

    #[test]
    fn test_instant_instant_intersection() {
        let a = OccurSet::instants_from_iter([1, 2, 3]);
        let b = OccurSet::instants_from_iter([2, 3, 4]);
        assert_eq!(a.intersect(&b), OccurSet::instants_from_iter([2, 3]));
    }

    #[test]
    fn test_zero_width_spans_are_vacuous() {
        let a = OccurSet::Intervals(vec![(10, 10)]);
        let b = OccurSet::Intervals(vec![(0, 100)]);
        assert_eq!(a.intersect(&b), OccurSet::Intervals(vec![]));
    }

    #[test]
    fn test_commutativity_of_semantic_content() {
        let a = OccurSet::Intervals(vec![(0, 100), (200, 300)]);
        let b = days(&[UNIX_EPOCH_JD]);
        assert_eq!(a.intersect(&b), b.intersect(&a));
    }
}
