//! Cycle rules: every Nth day, week, or sub-day period, phase-anchored to
//! the event's start -- never to the query window.

use serde_json::{json, Value};

use crate::cal::{jd_to_epoch, Jd};
use crate::error::CoreError;
use crate::event::Event;
use crate::occur::OccurSet;
use crate::rules::timed::Hms;

fn cycle_days(step: i64, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
    let anchor = event.start_jd()?;
    // Round the first in-range occurrence up from the event's absolute
    // start, so the phase survives any query window.
    let first = if start_jd <= anchor {
        anchor
    } else {
        anchor + (start_jd - anchor).div_euclid(step) * step
            + if (start_jd - anchor).rem_euclid(step) == 0 { 0 } else { step }
    };
    let mut days = Vec::new();
    let mut jd = first;
    while jd < end_jd {
        days.push(jd);
        jd += step;
    }
    Ok(OccurSet::days_from_iter(days))
}

/// Every Nth day counted from the event's start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleDaysRule {
    pub days: u32,
}

impl Default for CycleDaysRule {
    fn default() -> Self {
        Self { days: 7 }
    }
}

impl CycleDaysRule {
    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        cycle_days(self.days.max(1) as i64, start_jd, end_jd, event)
    }

    pub fn data(&self) -> Value {
        json!(self.days)
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        match value.as_u64().and_then(|v| u32::try_from(v).ok()).filter(|&v| v > 0) {
            Some(days) => {
                self.days = days;
                true
            }
            None => false,
        }
    }
}

/// Every Nth week (7N days) counted from the event's start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWeeksRule {
    pub weeks: u32,
}

impl Default for CycleWeeksRule {
    fn default() -> Self {
        Self { weeks: 1 }
    }
}

impl CycleWeeksRule {
    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        cycle_days(7 * self.weeks.max(1) as i64, start_jd, end_jd, event)
    }

    pub fn data(&self) -> Value {
        json!(self.weeks)
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        match value.as_u64().and_then(|v| u32::try_from(v).ok()).filter(|&v| v > 0) {
            Some(weeks) => {
                self.weeks = weeks;
                true
            }
            None => false,
        }
    }
}

/// A cycle with a sub-day period: `days * 86400 + extra_time` seconds,
/// phase-anchored to the event's start epoch. Produces instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleLenRule {
    pub days: u32,
    pub extra_time: Hms,
}

impl Default for CycleLenRule {
    fn default() -> Self {
        Self {
            days: 1,
            extra_time: Hms::default(),
        }
    }
}

impl CycleLenRule {
    pub fn period(&self) -> i64 {
        self.days as i64 * 86400 + self.extra_time.to_seconds()
    }

    pub fn calc(&self, start_jd: Jd, end_jd: Jd, event: &Event) -> Result<OccurSet, CoreError> {
        let period = self.period();
        if period <= 0 {
            return Ok(OccurSet::empty_instants());
        }
        let anchor = event.start_epoch()?;
        let win_start = jd_to_epoch(start_jd).max(anchor);
        let win_end = jd_to_epoch(end_jd);
        let behind = win_start - anchor;
        let mut t = anchor
            + behind.div_euclid(period) * period
            + if behind.rem_euclid(period) == 0 { 0 } else { period };
        let mut instants = Vec::new();
        while t < win_end {
            instants.push(t);
            t += period;
        }
        Ok(OccurSet::instants_from_iter(instants))
    }

    pub fn data(&self) -> Value {
        json!({ "days": self.days, "extraTime": self.extra_time.to_string() })
    }

    pub fn set_data(&mut self, value: &Value) -> bool {
        let parsed = (|| {
            let days = u32::try_from(value.get("days")?.as_u64()?).ok()?;
            let extra = Hms::parse(value.get("extraTime")?.as_str()?)?;
            Some((days, extra))
        })();
        match parsed {
            Some((days, extra_time)) => {
                self.days = days;
                self.extra_time = extra_time;
                true
            }
            None => false,
        }
    }
}
