//! Time-of-day aware rules: start/end clamps, daily instants and ranges,
//! and durations counted from the event start.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::cal::{jd_to_epoch, CivilDate, Epoch, Jd};
use crate::error::CoreError;
use crate::event::Event;
use crate::occur::OccurSet;

/// A time of day, second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Hms {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Hms {
    pub fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }

    pub fn to_seconds(self) -> i64 {
        self.hour as i64 * 3600 + self.minute as i64 * 60 + self.second as i64
    }

    /// Parse `HH:MM:SS` or `HH:MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().splitn(3, ':');
        let hour: u8 = parts.next()?.parse().ok()?;
        let minute: u8 = parts.next()?.parse().ok()?;
        let second: u8 = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }
        Some(Self::new(hour, minute, second))
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Date plus time of day; backs both the `start` and `end` rules.
///
/// Start and end act as open-ended clamps over the query window, not point
/// events -- intersecting a start's `[myEpoch, windowEnd)` with an end's
/// `[windowStart, myEpoch)` is what bounds an event to `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeRule {
    pub date: CivilDate,
    pub time: Hms,
}

impl DateTimeRule {
    pub fn new(date: CivilDate, time: Hms) -> Self {
        Self { date, time }
    }

    /// The Julian Day of this rule's date, in the owning event's calendar.
    pub fn jd(&self, event: &Event) -> Result<Jd, CoreError> {
        Ok(crate::cal::to_jd(event.cal_kind(), self.date)?)
    }

    /// Epoch of this rule's date+time, through the event's UTC offset.
    pub fn epoch(&self, event: &Event) -> Result<Epoch, CoreError> {
        Ok(jd_to_epoch(self.jd(event)?) + self.time.to_seconds() - event.utc_offset())
    }

    pub fn calc_start(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        let my = self.epoch(event)?;
        Ok(OccurSet::single_interval(
            my.max(jd_to_epoch(start_jd)),
            jd_to_epoch(end_jd),
        ))
    }

    pub fn calc_end(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        let my = self.epoch(event)?;
        Ok(OccurSet::single_interval(
            jd_to_epoch(start_jd),
            my.min(jd_to_epoch(end_jd)),
        ))
    }

    pub fn data(&self) -> Value {
        json!(format!("{} {}", self.date, self.time))
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        let Some(s) = value.as_str() else { return false };
        let mut parts = s.split_whitespace();
        let Some(date) = parts.next().and_then(CivilDate::parse) else {
            return false;
        };
        let time = match parts.next() {
            Some(t) => match Hms::parse(t) {
                Some(t) => t,
                None => return false,
            },
            None => Hms::default(),
        };
        self.date = date;
        self.time = time;
        true
    }
}

impl Default for DateTimeRule {
    fn default() -> Self {
        Self {
            date: CivilDate::new(1970, 1, 1),
            time: Hms::default(),
        }
    }
}

/// A daily repeating instant at a fixed time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayTimeRule {
    pub time: Hms,
}

impl DayTimeRule {
    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        let secs = self.time.to_seconds() - event.utc_offset();
        Ok(OccurSet::instants_from_iter(
            (start_jd..end_jd).map(|jd| jd_to_epoch(jd) + secs),
        ))
    }

    pub fn data(&self) -> Value {
        json!(self.time.to_string())
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        match value.as_str().and_then(Hms::parse) {
            Some(time) => {
                self.time = time;
                true
            }
            None => false,
        }
    }
}

/// A daily repeating interval `[day+start, day+end)`.
///
/// An end at or before the start clamps to the start: zero width, never a
/// negative-width or past-midnight interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DayTimeRangeRule {
    pub start: Hms,
    pub end: Hms,
}

impl DayTimeRangeRule {
    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        let offset = event.utc_offset();
        let s0 = self.start.to_seconds() - offset;
        let s1 = (self.end.to_seconds() - offset).max(s0);
        Ok(OccurSet::Intervals(
            (start_jd..end_jd)
                .map(|jd| (jd_to_epoch(jd) + s0, jd_to_epoch(jd) + s1))
                .collect(),
        ))
    }

    pub fn data(&self) -> Value {
        json!([self.start.to_string(), self.end.to_string()])
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        let parsed = value.as_array().and_then(|items| match items.as_slice() {
            [a, b] => Some((
                Hms::parse(a.as_str()?)?,
                Hms::parse(b.as_str()?)?,
            )),
            _ => None,
        });
        match parsed {
            Some((start, end)) => {
                self.start = start;
                self.end = end;
                true
            }
            None => false,
        }
    }
}

/// Duration units, in seconds.
pub const DURATION_UNITS: &[(i64, &str)] = &[
    (1, "s"),
    (60, "m"),
    (3600, "h"),
    (86400, "d"),
    (604800, "w"),
];

/// A duration counted from the event's start epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRule {
    pub value: i64,
    /// Seconds per unit: 1, 60, 3600, 86400 or 604800.
    pub unit: i64,
}

impl DurationRule {
    pub fn seconds(&self) -> i64 {
        self.value * self.unit
    }

    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        let start = event.start_epoch()?;
        Ok(OccurSet::single_interval(
            start.max(jd_to_epoch(start_jd)),
            (start + self.seconds()).min(jd_to_epoch(end_jd)),
        ))
    }

    pub fn data(&self) -> Value {
        json!({ "value": self.value, "unit": self.unit })
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        let parsed = (|| {
            let value_n = value.get("value")?.as_i64()?;
            let unit = value.get("unit")?.as_i64()?;
            if value_n < 0 || !DURATION_UNITS.iter().any(|&(u, _)| u == unit) {
                return None;
            }
            Some((value_n, unit))
        })();
        match parsed {
            Some((v, u)) => {
                self.value = v;
                self.unit = u;
                true
            }
            None => false,
        }
    }
}

impl Default for DurationRule {
    fn default() -> Self {
        Self { value: 1, unit: 3600 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hms_parse_and_seconds() {
        assert_eq!(Hms::parse("09:30:15"), Some(Hms::new(9, 30, 15)));
        assert_eq!(Hms::parse("09:30"), Some(Hms::new(9, 30, 0)));
        assert_eq!(Hms::parse("24:00"), None);
        assert_eq!(Hms::new(1, 2, 3).to_seconds(), 3723);
    }

    #[test]
    fn test_date_time_rule_data_round_trip() {
        let mut rule = DateTimeRule::default();
        assert!(rule.set_data(&json!("2024-01-01 10:00:00")));
        assert_eq!(rule.date, CivilDate::new(2024, 1, 1));
        assert_eq!(rule.time, Hms::new(10, 0, 0));
        assert_eq!(rule.data(), json!("2024-01-01 10:00:00"));
        // Malformed input leaves the rule untouched.
        assert!(!rule.set_data(&json!("not a date")));
        assert_eq!(rule.date, CivilDate::new(2024, 1, 1));
    }

    #[test]
    fn test_duration_units() {
        let rule = DurationRule { value: 2, unit: 3600 };
        assert_eq!(rule.seconds(), 7200);
        let mut rule = DurationRule::default();
        assert!(!rule.set_data(&json!({ "value": 1, "unit": 7 })));
        assert!(rule.set_data(&json!({ "value": 3, "unit": 86400 })));
        assert_eq!(rule.seconds(), 3 * 86400);
    }
}
