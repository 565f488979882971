//! Events: rule containers with per-kind behavior.
//!
//! An event owns an ordered collection of rules (at most one per name);
//! its total occurrence over a window is the intersection of all attached
//! rules' occurrence sets. Rule adds/removes are validated *before* they
//! are committed, so the container is never left need-unsatisfied or
//! conflicted.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::cal::{self, jd_to_epoch, CalendarKind, CivilDate, Epoch, Jd};
use crate::error::{CoreError, Result, RuleError};
use crate::ics;
use crate::occur::OccurSet;
use crate::rules::{
    check_rule_dependencies, DateTimeRule, DayTimeRangeRule, FieldRule, Hms, Rule, RuleCheck,
    WeekDayRule,
};

mod kind;
pub use kind::EventKind;

/// Application-unique event id; 0 until first save.
pub type EventId = i64;

/// Linkage to a mirrored event on a remote account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIds {
    pub account_id: String,
    pub group_id: String,
    pub event_id: String,
}

/// A calendar event.
#[derive(Debug, Clone)]
pub struct Event {
    id: EventId,
    kind: EventKind,
    cal_kind: CalendarKind,
    rules: Vec<Rule>,
    pub summary: String,
    pub description: String,
    pub icon: Option<String>,
    pub notifiers: Vec<String>,
    /// Time-zone override: seconds east of UTC applied when composing a
    /// civil date+time into an epoch. `None` means UTC.
    utc_offset_secs: Option<i32>,
    pub modified: DateTime<Utc>,
    pub remote_ids: Option<RemoteIds>,
}

impl Event {
    pub fn new(kind: EventKind, cal_kind: CalendarKind) -> Self {
        Self {
            id: 0,
            kind,
            cal_kind,
            rules: Vec::new(),
            summary: String::new(),
            description: String::new(),
            icon: None,
            notifiers: Vec::new(),
            utc_offset_secs: None,
            modified: Utc::now(),
            remote_ids: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> EventId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EventId) {
        self.id = id;
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn cal_kind(&self) -> CalendarKind {
        self.cal_kind
    }

    pub fn set_cal_kind(&mut self, kind: CalendarKind) {
        self.cal_kind = kind;
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    /// Mutable access for the editing UI. Mutation must go through the
    /// owning group, which reindexes via its fingerprint gate afterwards.
    pub fn rule_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.name() == name)
    }

    pub fn utc_offset(&self) -> i64 {
        self.utc_offset_secs.unwrap_or(0) as i64
    }

    pub fn set_utc_offset(&mut self, secs: Option<i32>) {
        self.utc_offset_secs = secs;
    }

    /// The event's start day, from its `start` rule.
    pub fn start_jd(&self) -> Result<Jd> {
        Ok(cal::to_jd(self.cal_kind, self.start_rule()?.date)?)
    }

    /// The event's start instant, from its `start` rule.
    pub fn start_epoch(&self) -> Result<Epoch> {
        let rule = self.start_rule()?;
        Ok(jd_to_epoch(cal::to_jd(self.cal_kind, rule.date)?) + rule.time.to_seconds()
            - self.utc_offset())
    }

    /// The event's end day, from its `end` rule.
    pub fn end_jd(&self) -> Result<Jd> {
        Ok(cal::to_jd(self.cal_kind, self.end_rule()?.date)?)
    }

    /// The event's end instant: the `end` rule, or start plus `duration`.
    pub fn end_epoch(&self) -> Result<Epoch> {
        if let Some(Rule::End(rule)) = self.rule("end") {
            return Ok(jd_to_epoch(cal::to_jd(self.cal_kind, rule.date)?)
                + rule.time.to_seconds()
                - self.utc_offset());
        }
        if let Some(Rule::Duration(rule)) = self.rule("duration") {
            return Ok(self.start_epoch()? + rule.seconds());
        }
        Err(RuleError::MissingRule { name: "end" }.into())
    }

    fn start_rule(&self) -> Result<&DateTimeRule> {
        match self.rule("start") {
            Some(Rule::Start(rule)) => Ok(rule),
            _ => Err(RuleError::MissingRule { name: "start" }.into()),
        }
    }

    fn end_rule(&self) -> Result<&DateTimeRule> {
        match self.rule("end") {
            Some(Rule::End(rule)) => Ok(rule),
            _ => Err(RuleError::MissingRule { name: "end" }.into()),
        }
    }

    // ── Rule collection transitions ──────────────────────────────────

    /// Validate the candidate rule set: current rules, plus an optional
    /// new rule, minus an optional disabled one. Runs BEFORE any change is
    /// committed.
    pub fn check_rules_dependencies(
        &self,
        adding: Option<&Rule>,
        removing: Option<&str>,
    ) -> RuleCheck {
        let candidate: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|r| Some(r.name()) != removing)
            .chain(adding)
            .collect();
        check_rule_dependencies(candidate)
    }

    /// Add without dependency validation; still rejects duplicates.
    pub fn add_rule(&mut self, rule: Rule) -> std::result::Result<(), RuleError> {
        if self.rule(rule.name()).is_some() {
            return Err(RuleError::DuplicateRule {
                name: rule.name().to_owned(),
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Validate, then add. On failure nothing changes and the message
    /// explains the rejected combination.
    pub fn check_and_add_rule(&mut self, rule: Rule) -> RuleCheck {
        if self.rule(rule.name()).is_some() {
            return RuleCheck::fail(format!("rule '{}' is already present", rule.name()));
        }
        let check = self.check_rules_dependencies(Some(&rule), None);
        if check.ok {
            self.rules.push(rule);
        }
        check
    }

    pub fn remove_rule(&mut self, name: &str) -> Option<Rule> {
        let pos = self.rules.iter().position(|r| r.name() == name)?;
        Some(self.rules.remove(pos))
    }

    /// Validate, then remove. Rejects removals that would leave another
    /// rule's need unsatisfied.
    pub fn check_and_remove_rule(&mut self, name: &str) -> RuleCheck {
        if self.rule(name).is_none() {
            return RuleCheck::fail(format!("rule '{name}' is not present"));
        }
        let check = self.check_rules_dependencies(None, Some(name));
        if check.ok {
            self.remove_rule(name);
        }
        check
    }

    /// Populate the kind's required rules with defaults around `today_jd`.
    pub fn set_defaults(&mut self, today_jd: Jd) -> Result<()> {
        let today = cal::from_jd(self.cal_kind, today_jd)?;
        for &name in self.kind.required_rules() {
            if self.rule(name).is_some() {
                continue;
            }
            let rule = match name {
                "start" => Rule::Start(DateTimeRule::new(today, default_start_time(&self.kind))),
                "end" => Rule::End(DateTimeRule::new(today, default_end_time(&self.kind))),
                "date" => Rule::Date(crate::rules::DateRule { date: today }),
                "month" => Rule::Month(FieldRule::single(today.month as i64)),
                "day" => Rule::DayOfMonth(FieldRule::single(today.day as i64)),
                "weekDay" => Rule::WeekDay(WeekDayRule {
                    week_days: vec![cal::jd_week_day(today_jd)],
                }),
                "dayTimeRange" => Rule::DayTimeRange(DayTimeRangeRule {
                    start: Hms::new(8, 0, 0),
                    end: Hms::new(10, 0, 0),
                }),
                other => Rule::default_by_name(other).ok_or_else(|| {
                    CoreError::Custom(format!("no default for rule '{other}'"))
                })?,
            };
            // Required sets are conflict-free by construction.
            self.rules.push(rule);
        }
        Ok(())
    }

    /// Touch the modification timestamp after any edit.
    pub fn after_modify(&mut self) {
        self.modified = Utc::now();
    }

    // ── Occurrence ───────────────────────────────────────────────────

    /// Total occurrence over `[start_jd, end_jd)`: the intersection of all
    /// attached rules' occurrence sets. Kinds with a single explicit
    /// occurrence take a direct path with identical results.
    pub fn calc_occurrence(&self, start_jd: Jd, end_jd: Jd) -> Result<OccurSet> {
        if end_jd <= start_jd {
            return Ok(OccurSet::empty_days());
        }
        match &self.kind {
            EventKind::Task => self.calc_clamped_interval(start_jd, end_jd),
            EventKind::DailyNote => match self.rule("date") {
                Some(Rule::Date(rule)) => rule.calc(start_jd, end_jd, self),
                _ => Err(RuleError::MissingRule { name: "date" }.into()),
            },
            EventKind::AllDayTask | EventKind::Lifetime => self.calc_day_span(start_jd, end_jd),
            EventKind::LargeScale {
                scale,
                start,
                duration,
            } => self.calc_year_span(*scale, *start, *duration, start_jd, end_jd),
            _ => self.calc_rules_intersection(start_jd, end_jd),
        }
    }

    /// What occurs on a single day.
    pub fn occurrence_on(&self, jd: Jd) -> Result<OccurSet> {
        self.calc_occurrence(jd, jd + 1)
    }

    fn calc_rules_intersection(&self, start_jd: Jd, end_jd: Jd) -> Result<OccurSet> {
        let mut iter = self.rules.iter();
        let Some(first) = iter.next() else {
            return Ok(OccurSet::empty_days());
        };
        let mut occur = first.calc_occurrence(start_jd, end_jd, self)?;
        for rule in iter {
            // Narrow the evaluation window to the accumulated result's own
            // bounds. Purely a performance heuristic: intersection discards
            // anything outside those bounds anyway.
            let (win_start, win_end) = match (occur.start_jd(), occur.end_jd()) {
                (Some(lo), Some(hi)) => {
                    let lo = lo.max(start_jd);
                    (lo, hi.min(end_jd).max(lo))
                }
                _ => (start_jd, end_jd),
            };
            occur = occur.intersect(&rule.calc_occurrence(win_start, win_end, self)?);
        }
        Ok(occur)
    }

    /// Equivalent to intersecting the start and end clamp rules.
    fn calc_clamped_interval(&self, start_jd: Jd, end_jd: Jd) -> Result<OccurSet> {
        let start = self.start_epoch()?;
        let end = self.end_epoch()?;
        Ok(OccurSet::single_interval(
            start.max(jd_to_epoch(start_jd)),
            end.min(jd_to_epoch(end_jd)),
        ))
    }

    /// Whole days from the start date through the end date, inclusive.
    fn calc_day_span(&self, start_jd: Jd, end_jd: Jd) -> Result<OccurSet> {
        let lo = self.start_jd()?.max(start_jd);
        let hi = (self.end_jd()? + 1).min(end_jd);
        Ok(OccurSet::day_range(lo, hi.max(lo)))
    }

    fn calc_year_span(
        &self,
        scale: i64,
        start: i64,
        duration: i64,
        start_jd: Jd,
        end_jd: Jd,
    ) -> Result<OccurSet> {
        let year0 = scaled_year(start, scale)?;
        let year1 = scaled_year(start + duration, scale)?;
        let jd0 = cal::to_jd(self.cal_kind, CivilDate::new(year0, 1, 1))?;
        let jd1 = cal::to_jd(self.cal_kind, CivilDate::new(year1, 1, 1))?;
        let lo = jd0.max(start_jd);
        Ok(OccurSet::day_range(lo, jd1.min(end_jd).max(lo)))
    }

    // ── Persistence shape ────────────────────────────────────────────

    /// Structural snapshot of everything that affects occurrence: rule
    /// data plus the time-zone override. Compared by value equality to
    /// skip reindexing after no-op edits.
    pub fn rules_fingerprint(&self) -> Value {
        Value::from(serde_json::Map::from_iter([
            (
                "rules".to_owned(),
                rules_data(&self.rules),
            ),
            ("utcOffset".to_owned(), Value::from(self.utc_offset_secs)),
        ]))
    }

    /// Flat JSON mapping consumed by the persistence layer.
    pub fn data(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::from(self.kind.name()));
        map.insert("calType".into(), Value::from(self.cal_kind.as_str()));
        map.insert("summary".into(), Value::from(self.summary.clone()));
        map.insert(
            "description".into(),
            Value::from(self.description.clone()),
        );
        if let Some(icon) = &self.icon {
            map.insert("icon".into(), Value::from(icon.clone()));
        }
        if !self.notifiers.is_empty() {
            map.insert("notifiers".into(), Value::from(self.notifiers.clone()));
        }
        if let Some(offset) = self.utc_offset_secs {
            map.insert("utcOffset".into(), Value::from(offset));
        }
        map.insert("modified".into(), Value::from(self.modified.timestamp()));
        if let Some(remote) = &self.remote_ids {
            map.insert(
                "remoteIds".into(),
                Value::from(vec![
                    remote.account_id.clone(),
                    remote.group_id.clone(),
                    remote.event_id.clone(),
                ]),
            );
        }
        self.kind.payload_data(&mut map);
        map.insert("rules".into(), rules_data(&self.rules));
        Value::Object(map)
    }

    /// Build an event from its persisted data.
    pub fn from_data(value: &Value) -> Result<Event> {
        let obj = value
            .as_object()
            .ok_or_else(|| CoreError::Custom("event data is not an object".into()))?;
        let type_name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::Custom("event data has no type".into()))?;
        let kind = EventKind::from_name(type_name)
            .ok_or_else(|| CoreError::Custom(format!("unknown event type '{type_name}'")))?;
        let mut event = Event::new(kind, CalendarKind::Gregorian);
        event.set_data(value);
        Ok(event)
    }

    /// Apply persisted data. Best-effort: unknown or malformed rules are
    /// logged and skipped so one bad entry never sinks the event.
    pub fn set_data(&mut self, value: &Value) {
        let Some(obj) = value.as_object() else { return };
        if let Some(name) = obj.get("calType").and_then(Value::as_str) {
            match CalendarKind::from_name(name) {
                Some(kind) => self.cal_kind = kind,
                None => log::warn!("unknown calendar type '{name}'; keeping {}", self.cal_kind),
            }
        }
        if let Some(s) = obj.get("summary").and_then(Value::as_str) {
            self.summary = s.to_owned();
        }
        if let Some(s) = obj.get("description").and_then(Value::as_str) {
            self.description = s.to_owned();
        }
        self.icon = obj
            .get("icon")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or(self.icon.take());
        if let Some(list) = obj.get("notifiers").and_then(Value::as_array) {
            self.notifiers = list
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect();
        }
        if let Some(offset) = obj.get("utcOffset").and_then(Value::as_i64) {
            self.utc_offset_secs = i32::try_from(offset).ok();
        }
        if let Some(ts) = obj.get("modified").and_then(Value::as_i64) {
            if let Some(dt) = DateTime::from_timestamp(ts, 0) {
                self.modified = dt;
            }
        }
        if let Some(ids) = obj.get("remoteIds").and_then(Value::as_array) {
            if let [a, g, e] = ids.as_slice() {
                if let (Some(a), Some(g), Some(e)) = (a.as_str(), g.as_str(), e.as_str()) {
                    self.remote_ids = Some(RemoteIds {
                        account_id: a.to_owned(),
                        group_id: g.to_owned(),
                        event_id: e.to_owned(),
                    });
                }
            }
        }
        self.kind.set_payload_data(obj);
        if let Some(entries) = obj.get("rules").and_then(Value::as_array) {
            self.rules.clear();
            for entry in entries {
                let pair = entry.as_array().and_then(|p| match p.as_slice() {
                    [name, data] => Some((name.as_str()?, data)),
                    _ => None,
                });
                let Some((name, data)) = pair else {
                    log::warn!("skipping malformed rule entry: {entry}");
                    continue;
                };
                match Rule::from_name_and_data(name, data) {
                    Ok(rule) => {
                        if let Err(err) = self.add_rule(rule) {
                            log::warn!("skipping rule: {err}");
                        }
                    }
                    Err(err) => log::warn!("skipping rule: {err}"),
                }
            }
        }
    }

    /// Compact ICS key-value pairs for kinds with a direct RRULE form.
    /// `None` tells the exporter to fall back to expanding
    /// `calc_occurrence` into per-occurrence VEVENT blocks.
    pub fn ics_data(&self) -> Option<Vec<(String, String)>> {
        match &self.kind {
            EventKind::Yearly => {
                let month = self.single_field_value("month")?;
                let day = self.single_field_value("day")?;
                Some(vec![(
                    "RRULE".into(),
                    format!("FREQ=YEARLY;BYMONTH={month};BYMONTHDAY={day}"),
                )])
            }
            EventKind::Monthly => {
                let day = self.single_field_value("day")?;
                Some(vec![(
                    "RRULE".into(),
                    format!("FREQ=MONTHLY;BYMONTHDAY={day}"),
                )])
            }
            EventKind::Weekly => {
                let Some(Rule::WeekDay(wd)) = self.rule("weekDay") else {
                    return None;
                };
                let byday = ics::byday_list(&wd.week_days)?;
                let mut rrule = format!("FREQ=WEEKLY;BYDAY={byday}");
                if let Some(Rule::CycleWeeks(cw)) = self.rule("cycleWeeks") {
                    if cw.weeks > 1 {
                        rrule.push_str(&format!(";INTERVAL={}", cw.weeks));
                    }
                }
                Some(vec![("RRULE".into(), rrule)])
            }
            EventKind::Task => {
                let start = ics::format_epoch(self.start_epoch().ok()?).ok()?;
                let end = ics::format_epoch(self.end_epoch().ok()?).ok()?;
                Some(vec![("DTSTART".into(), start), ("DTEND".into(), end)])
            }
            _ => None,
        }
    }

    fn single_field_value(&self, name: &str) -> Option<i64> {
        let rule = self.rule(name)?;
        let field = match rule {
            Rule::Year(r) | Rule::Month(r) | Rule::DayOfMonth(r) => r,
            _ => return None,
        };
        match field.values.as_slice() {
            [crate::rules::RuleValue::Single(v)] => Some(*v),
            _ => None,
        }
    }
}

fn rules_data(rules: &[Rule]) -> Value {
    Value::Array(
        rules
            .iter()
            .map(|r| Value::Array(vec![Value::from(r.name()), r.data()]))
            .collect(),
    )
}

fn default_start_time(kind: &EventKind) -> Hms {
    match kind {
        EventKind::Task => Hms::new(9, 0, 0),
        _ => Hms::default(),
    }
}

fn default_end_time(kind: &EventKind) -> Hms {
    match kind {
        EventKind::Task => Hms::new(10, 0, 0),
        _ => Hms::default(),
    }
}

fn scaled_year(value: i64, scale: i64) -> Result<i32> {
    i32::try_from(value.saturating_mul(scale))
        .map_err(|_| CoreError::Custom(format!("scaled year {value}x{scale} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cal::UNIX_EPOCH_JD;

    fn today() -> Jd {
        // 2024-01-01
        UNIX_EPOCH_JD + 19723
    }

    #[test]
    fn test_defaults_add_required_rules() {
        let mut event = Event::new(EventKind::Task, CalendarKind::Gregorian);
        event.set_defaults(today()).unwrap();
        assert!(event.rule("start").is_some());
        assert!(event.rule("end").is_some());
        assert!(event.check_rules_dependencies(None, None).ok);
    }

    #[test]
    fn test_check_and_add_rejects_conflicts() {
        let mut event = Event::new(EventKind::Custom, CalendarKind::Gregorian);
        let check = event.check_and_add_rule(Rule::default_by_name("duration").unwrap());
        assert!(!check.ok, "duration without start must be rejected");
        assert!(event.rules().is_empty());

        assert!(event
            .check_and_add_rule(Rule::default_by_name("start").unwrap())
            .ok);
        assert!(event
            .check_and_add_rule(Rule::default_by_name("duration").unwrap())
            .ok);
        // Removing start would orphan duration's need.
        assert!(!event.check_and_remove_rule("start").ok);
        assert!(event.rule("start").is_some());
    }

    #[test]
    fn test_task_occurrence_is_clamped_interval() {
        let mut event = Event::new(EventKind::Task, CalendarKind::Gregorian);
        event.set_defaults(today()).unwrap();
        let occur = event.calc_occurrence(today() - 5, today() + 5).unwrap();
        let day0 = jd_to_epoch(today());
        assert_eq!(
            occur.time_range_list(),
            vec![(day0 + 9 * 3600, day0 + 10 * 3600)]
        );
    }

    #[test]
    fn test_empty_event_has_empty_occurrence() {
        let event = Event::new(EventKind::Custom, CalendarKind::Gregorian);
        assert!(event.calc_occurrence(today(), today() + 30).unwrap().is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_rule_edits() {
        let mut event = Event::new(EventKind::Task, CalendarKind::Gregorian);
        event.set_defaults(today()).unwrap();
        let before = event.rules_fingerprint();
        assert_eq!(before, event.rules_fingerprint(), "no-op must be stable");
        if let Some(Rule::Start(rule)) = event.rule_mut("start") {
            rule.time = Hms::new(11, 30, 0);
        }
        assert_ne!(before, event.rules_fingerprint());
    }

    #[test]
    fn test_data_round_trip() {
        let mut event = Event::new(EventKind::Task, CalendarKind::Gregorian);
        event.set_defaults(today()).unwrap();
        event.summary = "dentist".into();
        event.notifiers = vec!["alarm".into()];
        let decoded = Event::from_data(&event.data()).unwrap();
        assert_eq!(decoded.kind().name(), "task");
        assert_eq!(decoded.summary, "dentist");
        assert_eq!(decoded.rules_fingerprint(), event.rules_fingerprint());
    }

    #[test]
    fn test_malformed_rule_data_recovers_to_default() {
        let mut event = Event::new(EventKind::Custom, CalendarKind::Gregorian);
        event.set_data(&serde_json::json!({
            "summary": "partly broken",
            "rules": [["cycleDays", "garbage"], ["nonsense", 1], ["weekDay", [2]]],
        }));
        // cycleDays kept at its default, unknown rule skipped, weekDay parsed.
        assert_eq!(
            event.rule("cycleDays"),
            Some(&Rule::default_by_name("cycleDays").unwrap())
        );
        assert!(event.rule("nonsense").is_none());
        assert!(matches!(
            event.rule("weekDay"),
            Some(Rule::WeekDay(r)) if r.week_days == vec![2]
        ));
    }

    #[test]
    fn test_yearly_ics_data() {
        let mut event = Event::new(EventKind::Yearly, CalendarKind::Gregorian);
        event.set_defaults(today()).unwrap();
        let ics = event.ics_data().unwrap();
        assert_eq!(
            ics,
            vec![("RRULE".to_owned(), "FREQ=YEARLY;BYMONTH=1;BYMONTHDAY=1".to_owned())]
        );
    }
}
