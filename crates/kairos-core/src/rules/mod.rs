//! Event rules: composable temporal constraints.
//!
//! A rule computes a partial [`OccurSet`] over a day range; an event's
//! total occurrence is the intersection of all its rules' sets. Rules
//! declare what they `provide`, `need` and `conflict` with, and the
//! container validates a candidate rule set *before* committing any
//! add/remove -- see [`check_rule_dependencies`].
//!
//! The rule set is closed and known at compile time, so dispatch is an
//! exhaustive match over one enum rather than an open registry.

use serde_json::Value;

use crate::cal::Jd;
use crate::error::{CoreError, RuleError};
use crate::event::Event;
use crate::occur::OccurSet;

mod allday;
mod cycle;
mod timed;
mod value;

pub use allday::{
    DateField, DateRule, ExDatesRule, FieldRule, WeekDayRule, WeekMonthRule, WeekNumMode,
    WeekNumModeRule,
};
pub use cycle::{CycleDaysRule, CycleLenRule, CycleWeeksRule};
pub use timed::{DateTimeRule, DayTimeRangeRule, DayTimeRule, DurationRule, Hms, DURATION_UNITS};
pub use value::{values_contain, values_from_json, values_to_json, RuleValue};

/// Every rule name, in canonical order.
pub const RULE_NAMES: &[&str] = &[
    "year",
    "ex_year",
    "month",
    "ex_month",
    "day",
    "ex_day",
    "weekDay",
    "weekNumMode",
    "weekMonth",
    "date",
    "start",
    "end",
    "dayTime",
    "dayTimeRange",
    "duration",
    "cycleDays",
    "cycleWeeks",
    "cycleLen",
    "ex_dates",
];

/// A single temporal constraint attached to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Year(FieldRule),
    ExYear(FieldRule),
    Month(FieldRule),
    ExMonth(FieldRule),
    DayOfMonth(FieldRule),
    ExDayOfMonth(FieldRule),
    WeekDay(WeekDayRule),
    WeekNumMode(WeekNumModeRule),
    WeekMonth(WeekMonthRule),
    Date(DateRule),
    Start(DateTimeRule),
    End(DateTimeRule),
    DayTime(DayTimeRule),
    DayTimeRange(DayTimeRangeRule),
    Duration(DurationRule),
    CycleDays(CycleDaysRule),
    CycleWeeks(CycleWeeksRule),
    CycleLen(CycleLenRule),
    ExDates(ExDatesRule),
}

impl Rule {
    /// The rule's unique name key.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Year(_) => "year",
            Self::ExYear(_) => "ex_year",
            Self::Month(_) => "month",
            Self::ExMonth(_) => "ex_month",
            Self::DayOfMonth(_) => "day",
            Self::ExDayOfMonth(_) => "ex_day",
            Self::WeekDay(_) => "weekDay",
            Self::WeekNumMode(_) => "weekNumMode",
            Self::WeekMonth(_) => "weekMonth",
            Self::Date(_) => "date",
            Self::Start(_) => "start",
            Self::End(_) => "end",
            Self::DayTime(_) => "dayTime",
            Self::DayTimeRange(_) => "dayTimeRange",
            Self::Duration(_) => "duration",
            Self::CycleDays(_) => "cycleDays",
            Self::CycleWeeks(_) => "cycleWeeks",
            Self::CycleLen(_) => "cycleLen",
            Self::ExDates(_) => "ex_dates",
        }
    }

    /// Abstract capabilities this rule supplies to other rules' needs.
    pub fn provides(&self) -> &'static [&'static str] {
        match self {
            Self::Start(_) | Self::End(_) => &["time"],
            Self::DayTime(_) | Self::DayTimeRange(_) | Self::CycleLen(_) => &["time"],
            _ => &[],
        }
    }

    /// Capabilities/rules that must be present among the event's rules.
    pub fn needs(&self) -> &'static [&'static str] {
        match self {
            Self::WeekNumMode(_)
            | Self::Duration(_)
            | Self::CycleDays(_)
            | Self::CycleWeeks(_)
            | Self::CycleLen(_) => &["start"],
            _ => &[],
        }
    }

    /// Rule names that must NOT coexist with this rule.
    pub fn conflicts(&self) -> &'static [&'static str] {
        match self {
            Self::Date(_) => &[
                "year",
                "month",
                "day",
                "weekNumMode",
                "weekMonth",
                "start",
                "end",
                "cycleDays",
                "cycleWeeks",
                "cycleLen",
            ],
            Self::Start(_) => &["date"],
            Self::End(_) => &["date", "duration"],
            Self::Duration(_) => &["date", "end"],
            Self::DayTime(_) => &["dayTimeRange", "cycleLen"],
            Self::DayTimeRange(_) => &["dayTime", "cycleLen"],
            Self::WeekDay(_) => &["date", "weekMonth"],
            Self::WeekNumMode(_) => &["date", "weekMonth"],
            Self::WeekMonth(_) => &["date", "weekNumMode", "weekDay"],
            Self::CycleDays(_) => &["date", "cycleWeeks", "cycleLen"],
            Self::CycleWeeks(_) => &["date", "cycleDays", "cycleLen"],
            Self::CycleLen(_) => &["date", "dayTime", "dayTimeRange", "cycleDays", "cycleWeeks"],
            _ => &[],
        }
    }

    /// A default-valued rule for a name, or `None` for unknown names.
    pub fn default_by_name(name: &str) -> Option<Rule> {
        Some(match name {
            "year" => Self::Year(FieldRule::default()),
            "ex_year" => Self::ExYear(FieldRule::default()),
            "month" => Self::Month(FieldRule::default()),
            "ex_month" => Self::ExMonth(FieldRule::default()),
            "day" => Self::DayOfMonth(FieldRule::default()),
            "ex_day" => Self::ExDayOfMonth(FieldRule::default()),
            "weekDay" => Self::WeekDay(WeekDayRule::default()),
            "weekNumMode" => Self::WeekNumMode(WeekNumModeRule::default()),
            "weekMonth" => Self::WeekMonth(WeekMonthRule::default()),
            "date" => Self::Date(DateRule::default()),
            "start" => Self::Start(DateTimeRule::default()),
            "end" => Self::End(DateTimeRule::default()),
            "dayTime" => Self::DayTime(DayTimeRule::default()),
            "dayTimeRange" => Self::DayTimeRange(DayTimeRangeRule::default()),
            "duration" => Self::Duration(DurationRule::default()),
            "cycleDays" => Self::CycleDays(CycleDaysRule::default()),
            "cycleWeeks" => Self::CycleWeeks(CycleWeeksRule::default()),
            "cycleLen" => Self::CycleLen(CycleLenRule::default()),
            "ex_dates" => Self::ExDates(ExDatesRule::default()),
            _ => return None,
        })
    }

    /// Build a rule from a persisted `(name, data)` pair. Unknown names are
    /// an error; malformed data falls back to the default value with a
    /// logged warning, so one bad rule never sinks a whole event load.
    pub fn from_name_and_data(name: &str, data: &Value) -> Result<Rule, RuleError> {
        let mut rule = Self::default_by_name(name).ok_or_else(|| RuleError::UnknownRule {
            name: name.to_owned(),
        })?;
        rule.set_data(data);
        Ok(rule)
    }

    /// Compute this rule's occurrence restricted to `[start_jd, end_jd)`.
    ///
    /// The `event` is consulted only for cross-rule needs that the
    /// container has already validated to exist; a missing need at this
    /// point surfaces as [`RuleError::MissingRule`].
    pub fn calc_occurrence(
        &self,
        start_jd: Jd,
        end_jd: Jd,
        event: &Event,
    ) -> Result<OccurSet, CoreError> {
        match self {
            Self::Year(r) => r.calc(DateField::Year, false, start_jd, end_jd, event),
            Self::ExYear(r) => r.calc(DateField::Year, true, start_jd, end_jd, event),
            Self::Month(r) => r.calc(DateField::Month, false, start_jd, end_jd, event),
            Self::ExMonth(r) => r.calc(DateField::Month, true, start_jd, end_jd, event),
            Self::DayOfMonth(r) => r.calc(DateField::Day, false, start_jd, end_jd, event),
            Self::ExDayOfMonth(r) => r.calc(DateField::Day, true, start_jd, end_jd, event),
            Self::WeekDay(r) => Ok(r.calc(start_jd, end_jd)),
            Self::WeekNumMode(r) => r.calc(start_jd, end_jd, event),
            Self::WeekMonth(r) => r.calc(start_jd, end_jd, event),
            Self::Date(r) => r.calc(start_jd, end_jd, event),
            Self::Start(r) => r.calc_start(start_jd, end_jd, event),
            Self::End(r) => r.calc_end(start_jd, end_jd, event),
            Self::DayTime(r) => r.calc(start_jd, end_jd, event),
            Self::DayTimeRange(r) => r.calc(start_jd, end_jd, event),
            Self::Duration(r) => r.calc(start_jd, end_jd, event),
            Self::CycleDays(r) => r.calc(start_jd, end_jd, event),
            Self::CycleWeeks(r) => r.calc(start_jd, end_jd, event),
            Self::CycleLen(r) => r.calc(start_jd, end_jd, event),
            Self::ExDates(r) => r.calc(start_jd, end_jd, event),
        }
    }

    /// The rule's parameters as a JSON value.
    pub fn data(&self) -> Value {
        match self {
            Self::Year(r) | Self::ExYear(r) | Self::Month(r) | Self::ExMonth(r)
            | Self::DayOfMonth(r) | Self::ExDayOfMonth(r) => r.data(),
            Self::WeekDay(r) => r.data(),
            Self::WeekNumMode(r) => r.data(),
            Self::WeekMonth(r) => r.data(),
            Self::Date(r) => r.data(),
            Self::Start(r) | Self::End(r) => r.data(),
            Self::DayTime(r) => r.data(),
            Self::DayTimeRange(r) => r.data(),
            Self::Duration(r) => r.data(),
            Self::CycleDays(r) => r.data(),
            Self::CycleWeeks(r) => r.data(),
            Self::CycleLen(r) => r.data(),
            Self::ExDates(r) => r.data(),
        }
    }

    /// Apply persisted parameters. Malformed data leaves the rule at its
    /// current value and logs a warning -- a deliberate best-effort
    /// recovery so a hand-edited file cannot block loading a group.
    pub fn set_data(&mut self, value: &Value) {
        let ok = match self {
            Self::Year(r) | Self::ExYear(r) | Self::Month(r) | Self::ExMonth(r)
            | Self::DayOfMonth(r) | Self::ExDayOfMonth(r) => r.set_data(value),
            Self::WeekDay(r) => r.set_data(value),
            Self::WeekNumMode(r) => r.set_data(value),
            Self::WeekMonth(r) => r.set_data(value),
            Self::Date(r) => r.set_data(value),
            Self::Start(r) | Self::End(r) => r.set_data(value),
            Self::DayTime(r) => r.set_data(value),
            Self::DayTimeRange(r) => r.set_data(value),
            Self::Duration(r) => r.set_data(value),
            Self::CycleDays(r) => r.set_data(value),
            Self::CycleWeeks(r) => r.set_data(value),
            Self::CycleLen(r) => r.set_data(value),
            Self::ExDates(r) => r.set_data(value),
        };
        if !ok {
            log::warn!(
                "malformed data for rule '{}': {value}; keeping previous value",
                self.name()
            );
        }
    }

    /// Compact one-line serialization for the sync wire protocol.
    pub fn server_string(&self) -> String {
        format!("{} {}", self.name(), self.data())
    }
}

/// Outcome of a rule-set validation: a recoverable, expected-to-happen
/// condition reported as data, never as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCheck {
    pub ok: bool,
    pub message: String,
}

impl RuleCheck {
    pub fn pass() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Validate a candidate rule set: every rule's conflicts must miss, and
/// every rule's needs must hit, the union of all rule names plus everything
/// any rule provides.
pub fn check_rule_dependencies<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> RuleCheck {
    let rules: Vec<&Rule> = rules.into_iter().collect();
    let mut union: Vec<&str> = Vec::new();
    for rule in &rules {
        union.push(rule.name());
        union.extend(rule.provides());
    }
    for rule in &rules {
        for conflict in rule.conflicts() {
            if union.contains(conflict) {
                return RuleCheck::fail(format!(
                    "rule '{}' conflicts with '{}'",
                    rule.name(),
                    conflict
                ));
            }
        }
        for need in rule.needs() {
            if !union.contains(need) {
                return RuleCheck::fail(format!(
                    "rule '{}' needs '{}', which is not present",
                    rule.name(),
                    need
                ));
            }
        }
    }
    RuleCheck::pass()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names_are_unique_and_constructible() {
        for (i, name) in RULE_NAMES.iter().enumerate() {
            let rule = Rule::default_by_name(name).expect("constructible");
            assert_eq!(rule.name(), *name);
            assert!(!RULE_NAMES[..i].contains(name));
        }
        assert!(Rule::default_by_name("bogus").is_none());
    }

    #[test]
    fn test_duration_needs_start() {
        let duration = Rule::default_by_name("duration").unwrap();
        let check = check_rule_dependencies([&duration]);
        assert!(!check.ok);
        assert!(check.message.contains("start"));

        let start = Rule::default_by_name("start").unwrap();
        assert!(check_rule_dependencies([&start, &duration]).ok);
    }

    #[test]
    fn test_date_conflicts_with_start() {
        let date = Rule::default_by_name("date").unwrap();
        let start = Rule::default_by_name("start").unwrap();
        let check = check_rule_dependencies([&date, &start]);
        assert!(!check.ok);
        assert!(check.message.contains("date") || check.message.contains("start"));
    }

    #[test]
    fn test_end_conflicts_with_duration() {
        let start = Rule::default_by_name("start").unwrap();
        let end = Rule::default_by_name("end").unwrap();
        let duration = Rule::default_by_name("duration").unwrap();
        assert!(check_rule_dependencies([&start, &end]).ok);
        assert!(!check_rule_dependencies([&start, &end, &duration]).ok);
    }

    #[test]
    fn test_unknown_rule_from_data() {
        let err = Rule::from_name_and_data("nope", &serde_json::json!(1)).unwrap_err();
        assert_eq!(
            err,
            RuleError::UnknownRule {
                name: "nope".into()
            }
        );
    }

    #[test]
    fn test_server_string_shape() {
        let rule = Rule::default_by_name("cycleDays").unwrap();
        assert_eq!(rule.server_string(), "cycleDays 7");
    }
}
