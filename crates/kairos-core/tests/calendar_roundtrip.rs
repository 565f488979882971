//! Property tests for the calendar conversion layer: conversion must
//! round-trip exactly for every valid date in each system's supported
//! range, and month lengths must bound day validity.

use proptest::prelude::*;

use kairos_core::cal::{self, CalendarKind, CivilDate};

// Gregorian years -100..3000, roughly.
const WIDE_JD_RANGE: std::ops::Range<i64> = 1_684_500..2_817_000;
// Jalali year 10 onward; the other systems cover this range too.
const COMMON_JD_RANGE: std::ops::Range<i64> = 1_951_700..2_817_000;

fn round_trip_jd(kind: CalendarKind, jd: i64) {
    let date = cal::from_jd(kind, jd).expect("jd in supported range");
    let back = cal::to_jd(kind, date).expect("converted date must be valid");
    assert_eq!(back, jd, "{kind}: jd {jd} -> {date} -> {back}");
}

proptest! {
    #[test]
    fn gregorian_round_trips(jd in WIDE_JD_RANGE) {
        round_trip_jd(CalendarKind::Gregorian, jd);
    }

    #[test]
    fn julian_round_trips(jd in WIDE_JD_RANGE) {
        round_trip_jd(CalendarKind::Julian, jd);
    }

    #[test]
    fn iso_round_trips(jd in WIDE_JD_RANGE) {
        round_trip_jd(CalendarKind::Iso, jd);
    }

    #[test]
    fn jalali_round_trips(jd in COMMON_JD_RANGE) {
        round_trip_jd(CalendarKind::Jalali, jd);
    }

    #[test]
    fn systems_agree_on_day_ordering(jd in COMMON_JD_RANGE) {
        // Successive days stay successive in every system.
        for &kind in CalendarKind::all() {
            let today = cal::from_jd(kind, jd).unwrap();
            let tomorrow = cal::from_jd(kind, jd + 1).unwrap();
            let (a, b) = (cal::to_jd(kind, today).unwrap(), cal::to_jd(kind, tomorrow).unwrap());
            prop_assert_eq!(b - a, 1);
        }
    }

    #[test]
    fn month_len_bounds_validity(jd in COMMON_JD_RANGE) {
        for &kind in CalendarKind::all() {
            let date = cal::from_jd(kind, jd).unwrap();
            let len = cal::month_len(kind, date.year, date.month).unwrap();
            prop_assert!(date.day <= len);
            let last = CivilDate::new(date.year, date.month, len);
            prop_assert!(cal::to_jd(kind, last).is_ok());
            let overflow = CivilDate::new(date.year, date.month, len + 1);
            prop_assert!(cal::to_jd(kind, overflow).is_err());
        }
    }

    #[test]
    fn conversion_preserves_the_day(jd in COMMON_JD_RANGE) {
        // Converting between any two systems pivots through the same jd.
        let date = cal::from_jd(CalendarKind::Gregorian, jd).unwrap();
        for &to in CalendarKind::all() {
            let converted = cal::convert(date, CalendarKind::Gregorian, to).unwrap();
            prop_assert_eq!(cal::to_jd(to, converted).unwrap(), jd);
        }
    }
}
