//! Persian (Jalali) arithmetic calendar, 2820-year cycle.
//!
//! Months 1-6 have 31 days, 7-11 have 30, and Esfand (12) has 29 or 30.
//! `from_jd` re-derives through `to_jd`, so conversion round-trips by
//! construction.

/// Julian Day of 1 Farvardin 1.
const EPOCH: i64 = 1948321;

const CYCLE_YEARS: i64 = 2820;
const CYCLE_DAYS: i64 = 1029983;

fn epoch_year(year: i64) -> (i64, i64) {
    let base = year - if year >= 0 { 474 } else { 473 };
    (base, 474 + base.rem_euclid(CYCLE_YEARS))
}

pub(super) fn is_leap(year: i32) -> bool {
    let (_, epyear) = epoch_year(year as i64);
    ((epyear + 38) * 682).rem_euclid(2816) < 682
}

pub(super) fn month_len(year: i32, month: u8) -> u8 {
    match month {
        1..=6 => 31,
        7..=11 => 30,
        _ => {
            if is_leap(year) {
                30
            } else {
                29
            }
        }
    }
}

pub(super) fn to_jd(year: i32, month: u8, day: u8) -> i64 {
    let (base, epyear) = epoch_year(year as i64);
    let (month, day) = (month as i64, day as i64);
    let month_days = if month <= 7 {
        (month - 1) * 31
    } else {
        (month - 1) * 30 + 6
    };
    day + month_days
        + (epyear * 682 - 110).div_euclid(2816)
        + (epyear - 1) * 365
        + base.div_euclid(CYCLE_YEARS) * CYCLE_DAYS
        + (EPOCH - 1)
}

pub(super) fn from_jd(jd: i64) -> (i32, u8, u8) {
    let depoch = jd - to_jd(475, 1, 1);
    let cycle = depoch.div_euclid(CYCLE_DAYS);
    let cyear = depoch.rem_euclid(CYCLE_DAYS);
    let ycycle = if cyear == CYCLE_DAYS - 1 {
        CYCLE_YEARS
    } else {
        let aux1 = cyear.div_euclid(366);
        let aux2 = cyear.rem_euclid(366);
        (2134 * aux1 + 2816 * aux2 + 2815).div_euclid(1028522) + aux1 + 1
    };
    let mut year = ycycle + CYCLE_YEARS * cycle + 474;
    if year <= 0 {
        year -= 1;
    }
    let yday = jd - to_jd(year as i32, 1, 1) + 1;
    let month = if yday <= 186 {
        (yday + 30) / 31
    } else {
        (yday - 6 + 29) / 30
    };
    let day = jd - to_jd(year as i32, month as u8, 1) + 1;
    (year as i32, month as u8, day as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nowruz_alignment() {
        // 1 Farvardin 1403 is Gregorian 2024-03-20.
        assert_eq!(to_jd(1403, 1, 1), super::super::gregorian::to_jd(2024, 3, 20));
        assert_eq!(from_jd(to_jd(1403, 1, 1)), (1403, 1, 1));
    }

    #[test]
    fn test_month_lengths() {
        assert_eq!(month_len(1400, 1), 31);
        assert_eq!(month_len(1400, 7), 30);
        // 1399 is leap in the arithmetic cycle, 1402 is not.
        assert!(is_leap(1399));
        assert!(!is_leap(1402));
        assert_eq!(month_len(1399, 12), 30);
        assert_eq!(month_len(1402, 12), 29);
    }

    #[test]
    fn test_round_trip() {
        for &(y, m, d) in &[(1, 1, 1), (474, 12, 29), (1399, 12, 30), (1403, 6, 31), (3000, 11, 30)] {
            let jd = to_jd(y, m, d);
            assert_eq!(from_jd(jd), (y, m, d), "round-trip failed for {y}-{m}-{d}");
        }
    }
}
