//! Calendar conversion layer.
//!
//! Pure functions converting civil dates to and from a linear Julian Day
//! count, per calendar system. Everything outside this module deals only in
//! Julian Day integers or goes through [`to_jd`]/[`from_jd`]; no
//! calendar-system-specific logic leaks out.
//!
//! All arithmetic is integer and floor-division based. The Unix epoch is
//! Julian Day [`UNIX_EPOCH_JD`]; one day is exactly 86400 epoch seconds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

mod gregorian;
mod iso;
mod jalali;
mod julian;

/// Julian Day number: days since the Julian Day epoch.
pub type Jd = i64;

/// Integer seconds since the Unix epoch.
pub type Epoch = i64;

/// Julian Day of 1970-01-01 (Gregorian).
pub const UNIX_EPOCH_JD: Jd = 2440588;

/// Seconds per day.
pub const DAY_SECONDS: i64 = 86400;

/// Supported calendar systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarKind {
    Gregorian,
    Julian,
    /// ISO week calendar: year is the week-year, month is the week number
    /// (1..=52 or 53), day is the weekday (1 = Monday .. 7 = Sunday).
    Iso,
    /// Persian arithmetic calendar (2820-year cycle).
    Jalali,
}

impl CalendarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gregorian => "gregorian",
            Self::Julian => "julian",
            Self::Iso => "iso",
            Self::Jalali => "jalali",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gregorian" => Some(Self::Gregorian),
            "julian" => Some(Self::Julian),
            "iso" => Some(Self::Iso),
            "jalali" => Some(Self::Jalali),
            _ => None,
        }
    }

    /// All supported systems, in display order.
    pub fn all() -> &'static [CalendarKind] {
        &[Self::Gregorian, Self::Julian, Self::Iso, Self::Jalali]
    }
}

impl fmt::Display for CalendarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A civil date in some calendar system. The system itself is implicit;
/// pair with a [`CalendarKind`] when converting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CivilDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CivilDate {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Parse a `YYYY-MM-DD` string (year may be negative).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (sign, rest) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s),
        };
        let mut parts = rest.splitn(3, '-');
        let year: i32 = parts.next()?.parse().ok()?;
        let month: u8 = parts.next()?.parse().ok()?;
        let day: u8 = parts.next()?.parse().ok()?;
        Some(Self::new(sign * year, month, day))
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Convert a civil date to its Julian Day.
///
/// # Errors
/// Returns [`CalendarError::InvalidDate`] if the tuple is not a valid date
/// in the given system.
pub fn to_jd(kind: CalendarKind, date: CivilDate) -> Result<Jd, CalendarError> {
    validate(kind, date)?;
    Ok(match kind {
        CalendarKind::Gregorian => gregorian::to_jd(date.year, date.month, date.day),
        CalendarKind::Julian => julian::to_jd(date.year, date.month, date.day),
        CalendarKind::Iso => iso::to_jd(date.year, date.month, date.day),
        CalendarKind::Jalali => jalali::to_jd(date.year, date.month, date.day),
    })
}

/// Convert a Julian Day back to a civil date in the given system.
pub fn from_jd(kind: CalendarKind, jd: Jd) -> Result<CivilDate, CalendarError> {
    if !(MIN_JD..=MAX_JD).contains(&jd) {
        return Err(CalendarError::JdOutOfRange { kind, jd });
    }
    let (year, month, day) = match kind {
        CalendarKind::Gregorian => gregorian::from_jd(jd),
        CalendarKind::Julian => julian::from_jd(jd),
        CalendarKind::Iso => iso::from_jd(jd),
        CalendarKind::Jalali => jalali::from_jd(jd),
    };
    Ok(CivilDate::new(year, month, day))
}

/// Number of days in a month of the given system.
pub fn month_len(kind: CalendarKind, year: i32, month: u8) -> Result<u8, CalendarError> {
    let months = months_in_year(kind, year);
    if month < 1 || month > months {
        return Err(CalendarError::InvalidDate {
            kind,
            year,
            month,
            day: 1,
        });
    }
    Ok(match kind {
        CalendarKind::Gregorian => gregorian::month_len(year, month),
        CalendarKind::Julian => julian::month_len(year, month),
        CalendarKind::Iso => 7,
        CalendarKind::Jalali => jalali::month_len(year, month),
    })
}

/// Number of months (ISO: weeks) in a year of the given system.
pub fn months_in_year(kind: CalendarKind, year: i32) -> u8 {
    match kind {
        CalendarKind::Iso => iso::weeks_in_year(year),
        _ => 12,
    }
}

/// Convert a date between two calendar systems, via the Julian Day pivot.
pub fn convert(
    date: CivilDate,
    from: CalendarKind,
    to: CalendarKind,
) -> Result<CivilDate, CalendarError> {
    from_jd(to, to_jd(from, date)?)
}

fn validate(kind: CalendarKind, date: CivilDate) -> Result<(), CalendarError> {
    let invalid = || CalendarError::InvalidDate {
        kind,
        year: date.year,
        month: date.month,
        day: date.day,
    };
    let len = month_len(kind, date.year, date.month).map_err(|_| invalid())?;
    if date.day < 1 || date.day > len {
        return Err(invalid());
    }
    Ok(())
}

// Conversion range guard. The Fliegel-Van Flandern style formulas hold far
// beyond this window; the bound exists so absurd inputs fail loudly instead
// of wrapping.
const MIN_JD: Jd = 0;
const MAX_JD: Jd = 10_000_000;

/// First epoch second of the given Julian Day.
pub fn jd_to_epoch(jd: Jd) -> Epoch {
    (jd - UNIX_EPOCH_JD) * DAY_SECONDS
}

/// Julian Day containing the given epoch second.
pub fn epoch_to_jd(epoch: Epoch) -> Jd {
    epoch.div_euclid(DAY_SECONDS) + UNIX_EPOCH_JD
}

/// Day of week for a Julian Day: 0 = Sunday .. 6 = Saturday.
pub fn jd_week_day(jd: Jd) -> u8 {
    (jd + 1).rem_euclid(7) as u8
}

/// Absolute week number of a Julian Day (weeks begin on Sunday).
pub fn abs_week_number(jd: Jd) -> i64 {
    (jd + 1).div_euclid(7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_epoch_pivot() {
        let d = CivilDate::new(1970, 1, 1);
        assert_eq!(to_jd(CalendarKind::Gregorian, d).unwrap(), UNIX_EPOCH_JD);
        assert_eq!(jd_to_epoch(UNIX_EPOCH_JD), 0);
        assert_eq!(epoch_to_jd(0), UNIX_EPOCH_JD);
        assert_eq!(epoch_to_jd(86399), UNIX_EPOCH_JD);
        assert_eq!(epoch_to_jd(86400), UNIX_EPOCH_JD + 1);
        assert_eq!(epoch_to_jd(-1), UNIX_EPOCH_JD - 1);
    }

    #[test]
    fn test_week_day_convention() {
        // 1970-01-01 was a Thursday.
        assert_eq!(jd_week_day(UNIX_EPOCH_JD), 4);
        // 2024-01-07 was a Sunday.
        let jd = to_jd(CalendarKind::Gregorian, CivilDate::new(2024, 1, 7)).unwrap();
        assert_eq!(jd_week_day(jd), 0);
        assert_eq!(abs_week_number(jd + 1), abs_week_number(jd));
        assert_eq!(abs_week_number(jd - 1), abs_week_number(jd) - 1);
    }

    #[test]
    fn test_convert_between_systems() {
        // Gregorian 2024-03-20 is 1 Farvardin 1403 in the arithmetic
        // Persian calendar and 2024-03-07 Julian.
        let g = CivilDate::new(2024, 3, 20);
        let j = convert(g, CalendarKind::Gregorian, CalendarKind::Jalali).unwrap();
        assert_eq!(j, CivilDate::new(1403, 1, 1));
        let jl = convert(g, CalendarKind::Gregorian, CalendarKind::Julian).unwrap();
        assert_eq!(jl, CivilDate::new(2024, 3, 7));
    }

    #[test]
    fn test_invalid_dates_rejected() {
        assert!(to_jd(CalendarKind::Gregorian, CivilDate::new(2023, 2, 29)).is_err());
        assert!(to_jd(CalendarKind::Gregorian, CivilDate::new(2024, 2, 29)).is_ok());
        assert!(to_jd(CalendarKind::Gregorian, CivilDate::new(2024, 13, 1)).is_err());
        assert!(to_jd(CalendarKind::Gregorian, CivilDate::new(2024, 0, 1)).is_err());
        assert!(to_jd(CalendarKind::Jalali, CivilDate::new(1402, 12, 30)).is_err());
        assert!(to_jd(CalendarKind::Iso, CivilDate::new(2024, 1, 8)).is_err());
    }

    #[test]
    fn test_civil_date_parse() {
        assert_eq!(CivilDate::parse("2024-02-29"), Some(CivilDate::new(2024, 2, 29)));
        assert_eq!(CivilDate::parse("-44-3-15"), Some(CivilDate::new(-44, 3, 15)));
        assert_eq!(CivilDate::parse("2024-02"), None);
        assert_eq!(CivilDate::parse("abc"), None);
    }
}
