//! All-day rules: calendar-field filters, week patterns, fixed dates and
//! date exceptions. Each produces a day set over the query range.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::cal::{self, abs_week_number, jd_week_day, CivilDate, Jd};
use crate::error::CoreError;
use crate::event::Event;
use crate::occur::OccurSet;
use crate::rules::value::{values_contain, values_from_json, values_to_json, RuleValue};

/// Which calendar field a [`FieldRule`] filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Year,
    Month,
    Day,
}

impl DateField {
    fn of(&self, date: CivilDate) -> i64 {
        match self {
            Self::Year => date.year as i64,
            Self::Month => date.month as i64,
            Self::Day => date.day as i64,
        }
    }
}

/// Matches days whose year/month/day-of-month (in the event's calendar)
/// is in a value list. The `invert` flag turns it into the Ex- variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldRule {
    pub values: Vec<RuleValue>,
}

impl FieldRule {
    pub fn single(value: i64) -> Self {
        Self {
            values: vec![RuleValue::Single(value)],
        }
    }

    pub fn calc(
        &self,
        field: DateField,
        invert: bool,
        start_jd: Jd,
        end_jd: Jd,
        event: &Event,
    ) -> Result<OccurSet, CoreError> {
        let kind = event.cal_kind();
        let mut days = BTreeSet::new();
        for jd in start_jd..end_jd {
            let date = cal::from_jd(kind, jd)?;
            if values_contain(&self.values, field.of(date)) != invert {
                days.insert(jd);
            }
        }
        Ok(OccurSet::Days(days))
    }

    pub fn data(&self) -> Value {
        values_to_json(&self.values)
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        match values_from_json(value) {
            Some(values) => {
                self.values = values;
                true
            }
            None => false,
        }
    }
}

/// Matches by day of week: 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeekDayRule {
    pub week_days: Vec<u8>,
}

impl WeekDayRule {
    pub fn calc(&self, start_jd: Jd, end_jd: Jd) -> OccurSet {
        OccurSet::days_from_iter(
            (start_jd..end_jd).filter(|&jd| self.week_days.contains(&jd_week_day(jd))),
        )
    }

    pub fn data(&self) -> Value {
        json!(self.week_days)
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        let parsed: Option<Vec<u8>> = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|v| u8::try_from(v.as_u64()?).ok().filter(|&d| d < 7))
                .collect()
        });
        match parsed {
            Some(days) => {
                self.week_days = days;
                true
            }
            None => false,
        }
    }
}

/// Week-parity selection relative to the event's start week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekNumMode {
    #[default]
    Any,
    Odd,
    Even,
}

impl WeekNumMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Odd => "odd",
            Self::Even => "even",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "any" => Some(Self::Any),
            "odd" => Some(Self::Odd),
            "even" => Some(Self::Even),
            _ => None,
        }
    }
}

/// Matches every week, or only odd/even weeks counted from the absolute
/// week number of the event's start date (the start's own week is even).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekNumModeRule {
    pub mode: WeekNumMode,
}

impl WeekNumModeRule {
    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        if self.mode == WeekNumMode::Any {
            return Ok(OccurSet::day_range(start_jd, end_jd));
        }
        let anchor = abs_week_number(event.start_jd()?);
        let want = match self.mode {
            WeekNumMode::Odd => 1,
            _ => 0,
        };
        Ok(OccurSet::days_from_iter((start_jd..end_jd).filter(|&jd| {
            (abs_week_number(jd) - anchor).rem_euclid(2) == want
        })))
    }

    pub fn data(&self) -> Value {
        json!(self.mode.as_str())
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        match value.as_str().and_then(WeekNumMode::from_name) {
            Some(mode) => {
                self.mode = mode;
                true
            }
            None => false,
        }
    }
}

/// "Nth weekday of the month": `wm_index` 0..=3 is the 1st..4th occurrence,
/// 4 is the last occurrence in the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekMonthRule {
    pub wm_index: u8,
    /// Day of week, 0 = Sunday.
    pub week_day: u8,
    /// Month number, 0 = every month.
    pub month: u8,
}

impl Default for WeekMonthRule {
    fn default() -> Self {
        Self {
            wm_index: 0,
            week_day: 5,
            month: 0,
        }
    }
}

impl WeekMonthRule {
    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        let kind = event.cal_kind();
        let mut days = BTreeSet::new();
        let first = cal::from_jd(kind, start_jd)?;
        let (mut year, mut month) = (first.year, first.month);
        loop {
            let month_first = cal::to_jd(kind, CivilDate::new(year, month, 1))?;
            if month_first >= end_jd {
                break;
            }
            if self.month == 0 || self.month == month {
                let delta =
                    (self.week_day as i64 - jd_week_day(month_first) as i64).rem_euclid(7);
                let mut jd = month_first + delta + 7 * self.wm_index.min(4) as i64;
                if self.wm_index >= 4 {
                    // The naive 5th occurrence may spill into the next
                    // month; "last" then means one week earlier.
                    let len = cal::month_len(kind, year, month)? as i64;
                    if jd >= month_first + len {
                        jd -= 7;
                    }
                }
                if jd >= start_jd && jd < end_jd {
                    days.insert(jd);
                }
            }
            month += 1;
            if month > cal::months_in_year(kind, year) {
                month = 1;
                year += 1;
            }
        }
        Ok(OccurSet::Days(days))
    }

    pub fn data(&self) -> Value {
        json!({
            "wmIndex": self.wm_index,
            "weekDay": self.week_day,
            "month": self.month,
        })
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        let parsed = (|| {
            let wm_index = u8::try_from(value.get("wmIndex")?.as_u64()?).ok()?;
            let week_day = u8::try_from(value.get("weekDay")?.as_u64()?).ok()?;
            let month = u8::try_from(value.get("month")?.as_u64()?).ok()?;
            if wm_index > 4 || week_day > 6 {
                return None;
            }
            Some((wm_index, week_day, month))
        })();
        match parsed {
            Some((wm_index, week_day, month)) => {
                self.wm_index = wm_index;
                self.week_day = week_day;
                self.month = month;
                true
            }
            None => false,
        }
    }
}

/// Matches exactly one absolute date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRule {
    pub date: CivilDate,
}

impl Default for DateRule {
    fn default() -> Self {
        Self {
            date: CivilDate::new(1970, 1, 1),
        }
    }
}

impl DateRule {
    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        let jd = cal::to_jd(event.cal_kind(), self.date)?;
        Ok(if (start_jd..end_jd).contains(&jd) {
            OccurSet::days_from_iter([jd])
        } else {
            OccurSet::empty_days()
        })
    }

    pub fn data(&self) -> Value {
        json!(self.date.to_string())
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        match value.as_str().and_then(CivilDate::parse) {
            Some(date) => {
                self.date = date;
                true
            }
            None => false,
        }
    }
}

/// Explicitly excluded dates: matches every day in range EXCEPT the listed
/// ones. A subtractive filter -- it only has effect intersected against an
/// additive rule, since alone it restores nearly the whole range.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExDatesRule {
    pub dates: Vec<CivilDate>,
}

impl ExDatesRule {
    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        let kind = event.cal_kind();
        let mut excluded = BTreeSet::new();
        for &date in &self.dates {
            excluded.insert(cal::to_jd(kind, date)?);
        }
        Ok(OccurSet::days_from_iter(
            (start_jd..end_jd).filter(|jd| !excluded.contains(jd)),
        ))
    }

    pub fn data(&self) -> Value {
        Value::Array(
            self.dates
                .iter()
                .map(|d| Value::from(d.to_string()))
                .collect(),
        )
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        let parsed: Option<Vec<CivilDate>> = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|v| CivilDate::parse(v.as_str()?))
                .collect()
        });
        match parsed {
            Some(dates) => {
                self.dates = dates;
                true
            }
            None => false,
        }
    }
}
