//! Event groups: named, colored collections of events sharing an indexing
//! bound, with a per-group interval search index kept in sync with the
//! members' computed occurrences.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::cal::{jd_to_epoch, CalendarKind, Epoch, Jd};
use crate::error::{CoreError, Result, StorageError};
use crate::event::{Event, EventId, EventKind};
use crate::index::{IndexHit, IntervalIndex};
use crate::storage::IdAllocator;

/// An occurrence returned by a group search.
pub type OccurrenceHit = IndexHit;

/// Non-temporal search predicates applied after the index query.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Case-insensitive substring over summary and description.
    pub text: Option<String>,
    /// Restrict to an event type name.
    pub kind: Option<String>,
}

impl SearchFilter {
    fn matches(&self, event: &Event) -> bool {
        if let Some(kind) = &self.kind {
            if event.kind().name() != kind {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !event.summary.to_lowercase().contains(&needle)
                && !event.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

/// A group of events with a pre-computed occurrence index over
/// `[start_jd, end_jd)`.
#[derive(Debug)]
pub struct EventGroup {
    id: i64,
    pub title: String,
    /// Display color, `#rrggbb`.
    pub color: String,
    enabled: bool,
    cal_kind: CalendarKind,
    start_jd: Jd,
    end_jd: Jd,
    order: Vec<EventId>,
    events: HashMap<EventId, Event>,
    index: IntervalIndex,
    fingerprints: HashMap<EventId, Value>,
}

impl EventGroup {
    /// A new group indexing occurrences over `[start_jd, end_jd)`.
    pub fn new(id: i64, title: impl Into<String>, start_jd: Jd, end_jd: Jd) -> Self {
        let center = jd_to_epoch((start_jd + end_jd).div_euclid(2));
        Self {
            id,
            title: title.into(),
            color: "#2a76c6".into(),
            enabled: true,
            cal_kind: CalendarKind::Gregorian,
            start_jd,
            end_jd,
            order: Vec::new(),
            events: HashMap::new(),
            index: IntervalIndex::new(center),
            fingerprints: HashMap::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> i64 {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn cal_kind(&self) -> CalendarKind {
        self.cal_kind
    }

    pub fn bounds(&self) -> (Jd, Jd) {
        (self.start_jd, self.end_jd)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Member event ids, in insertion order.
    pub fn event_ids(&self) -> &[EventId] {
        &self.order
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.get(&id)
    }

    /// Mutable access to a member event. The group is the serialization
    /// boundary: after mutating, call [`update_occurrence_event`]
    /// (directly or via [`modify`]) so the index catches up.
    ///
    /// [`update_occurrence_event`]: Self::update_occurrence_event
    /// [`modify`]: Self::modify
    pub fn event_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.events.get_mut(&id)
    }

    /// Mutate an event and reindex it if its rules actually changed.
    pub fn modify<R>(
        &mut self,
        id: EventId,
        f: impl FnOnce(&mut Event) -> R,
    ) -> Result<Option<R>> {
        let Some(event) = self.events.get_mut(&id) else {
            return Ok(None);
        };
        let out = f(event);
        event.after_modify();
        self.update_occurrence_event(id)?;
        Ok(Some(out))
    }

    // ── Membership ───────────────────────────────────────────────────

    /// Factory: a new event of the group's calendar system with its kind's
    /// default rules, id assigned from the allocator.
    pub fn create(&self, kind: EventKind, ids: &mut IdAllocator) -> Result<Event> {
        let mut event = Event::new(kind, self.cal_kind);
        event.set_id(ids.next_event_id());
        let today = crate::cal::epoch_to_jd(chrono::Utc::now().timestamp());
        event.set_defaults(today)?;
        Ok(event)
    }

    /// Take ownership of an event and index its occurrences.
    pub fn add(&mut self, event: Event) -> Result<()> {
        let id = event.id();
        if id == 0 {
            return Err(StorageError::Unsaved { entity: "event" }.into());
        }
        if self.events.contains_key(&id) {
            return Err(CoreError::Custom(format!(
                "event {id} is already in group {}",
                self.id
            )));
        }
        self.order.push(id);
        self.events.insert(id, event);
        self.update_occurrence_event(id)?;
        Ok(())
    }

    /// Release an event (the caller moves it to the trash or to another
    /// group), dropping its index entries.
    pub fn remove(&mut self, id: EventId) -> Option<Event> {
        let event = self.events.remove(&id)?;
        self.order.retain(|&eid| eid != id);
        self.index.delete_event(id);
        self.fingerprints.remove(&id);
        Some(event)
    }

    /// Permanently delete an event.
    pub fn delete(&mut self, id: EventId) -> bool {
        self.remove(id).is_some()
    }

    // ── Index maintenance ────────────────────────────────────────────

    /// Reindex one event: drop its prior entries, then insert the ranges
    /// of a fresh `calc_occurrence` over the group bound. Skipped (returns
    /// false) when the event's rule fingerprint is unchanged, so no-op
    /// edits cost nothing.
    pub fn update_occurrence_event(&mut self, id: EventId) -> Result<bool> {
        let Some(event) = self.events.get(&id) else {
            return Ok(false);
        };
        let fingerprint = event.rules_fingerprint();
        if self.fingerprints.get(&id) == Some(&fingerprint) {
            return Ok(false);
        }
        let occur = event.calc_occurrence(self.start_jd, self.end_jd)?;
        self.index.delete_event(id);
        for (start, end) in occur.time_range_list() {
            self.index.insert(start, end, id);
        }
        self.fingerprints.insert(id, fingerprint);
        Ok(true)
    }

    /// Full rebuild: clear the index and reindex every member event.
    /// Triggered when the group's own bound, calendar type or enable flag
    /// changes.
    pub fn update_occurrence(&mut self) -> Result<()> {
        log::debug!("group {}: full occurrence rebuild", self.id);
        self.index.clear();
        self.fingerprints.clear();
        for id in self.order.clone() {
            self.update_occurrence_event(id)?;
        }
        Ok(())
    }

    /// Change the indexing bound and rebuild.
    pub fn set_bounds(&mut self, start_jd: Jd, end_jd: Jd) -> Result<()> {
        self.start_jd = start_jd;
        self.end_jd = end_jd;
        self.index = IntervalIndex::new(jd_to_epoch((start_jd + end_jd).div_euclid(2)));
        self.fingerprints.clear();
        self.update_occurrence()
    }

    /// Change the group's calendar system and rebuild. Member events keep
    /// their own calendar; the group system applies to newly created ones.
    pub fn set_cal_kind(&mut self, kind: CalendarKind) -> Result<()> {
        self.cal_kind = kind;
        self.update_occurrence()
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if self.enabled == enabled {
            return Ok(());
        }
        self.enabled = enabled;
        self.update_occurrence()
    }

    // ── Search ───────────────────────────────────────────────────────

    /// All occurrence hits overlapping `[from, to)` epoch seconds, sorted
    /// by start. Disabled groups answer empty.
    pub fn search(&self, from: Epoch, to: Epoch) -> Vec<OccurrenceHit> {
        if !self.enabled {
            return Vec::new();
        }
        self.index.search(from, to)
    }

    /// Event ids occurring in `[from, to)`, deduplicated (an event may
    /// have several occurrence intervals in range), then filtered by the
    /// non-temporal predicates.
    pub fn search_events(&self, from: Epoch, to: Epoch, filter: &SearchFilter) -> Vec<EventId> {
        let mut ids = Vec::new();
        for hit in self.search(from, to) {
            if !ids.contains(&hit.event_id) {
                ids.push(hit.event_id);
            }
        }
        ids.retain(|id| self.events.get(id).is_some_and(|e| filter.matches(e)));
        ids
    }

    /// Event ids occurring on a single day.
    pub fn events_on_day(&self, jd: Jd) -> Vec<EventId> {
        self.search_events(
            jd_to_epoch(jd),
            jd_to_epoch(jd + 1),
            &SearchFilter::default(),
        )
    }

    /// Event ids occurring in the week containing `jd` (weeks begin on
    /// Sunday, matching the weekday convention).
    pub fn events_in_week(&self, jd: Jd) -> Vec<EventId> {
        let week_start = jd - crate::cal::jd_week_day(jd) as Jd;
        self.search_events(
            jd_to_epoch(week_start),
            jd_to_epoch(week_start + 7),
            &SearchFilter::default(),
        )
    }

    /// Event ids occurring in a month of the group's calendar system.
    pub fn events_in_month(&self, year: i32, month: u8) -> Result<Vec<EventId>> {
        let first = crate::cal::to_jd(
            self.cal_kind,
            crate::cal::CivilDate::new(year, month, 1),
        )?;
        let len = crate::cal::month_len(self.cal_kind, year, month)? as Jd;
        Ok(self.search_events(
            jd_to_epoch(first),
            jd_to_epoch(first + len),
            &SearchFilter::default(),
        ))
    }

    // ── Persistence shape ────────────────────────────────────────────

    pub fn data(&self) -> Value {
        let mut map = Map::new();
        map.insert("title".into(), Value::from(self.title.clone()));
        map.insert("color".into(), Value::from(self.color.clone()));
        map.insert("enabled".into(), Value::from(self.enabled));
        map.insert("calType".into(), Value::from(self.cal_kind.as_str()));
        map.insert("startJd".into(), Value::from(self.start_jd));
        map.insert("endJd".into(), Value::from(self.end_jd));
        map.insert("eventIds".into(), Value::from(self.order.clone()));
        Value::Object(map)
    }

    /// Group metadata from persisted data; events are loaded separately.
    pub fn from_data(id: i64, value: &Value) -> Result<EventGroup> {
        let obj = value
            .as_object()
            .ok_or_else(|| CoreError::Custom("group data is not an object".into()))?;
        let start_jd = obj
            .get("startJd")
            .and_then(Value::as_i64)
            .ok_or_else(|| CoreError::Custom("group data has no startJd".into()))?;
        let end_jd = obj
            .get("endJd")
            .and_then(Value::as_i64)
            .ok_or_else(|| CoreError::Custom("group data has no endJd".into()))?;
        let title = obj
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("untitled")
            .to_owned();
        let mut group = EventGroup::new(id, title, start_jd, end_jd);
        if let Some(color) = obj.get("color").and_then(Value::as_str) {
            group.color = color.to_owned();
        }
        if let Some(enabled) = obj.get("enabled").and_then(Value::as_bool) {
            group.enabled = enabled;
        }
        if let Some(kind) = obj
            .get("calType")
            .and_then(Value::as_str)
            .and_then(CalendarKind::from_name)
        {
            group.cal_kind = kind;
        }
        Ok(group)
    }

    /// The persisted member id list, for the loader.
    pub fn persisted_event_ids(value: &Value) -> Vec<EventId> {
        value
            .get("eventIds")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }
}

/// Holding area for removed events awaiting restore or permanent
/// deletion. Events keep their ids, so restoring is an ownership move
/// back into a group.
#[derive(Debug, Default)]
pub struct Trash {
    events: Vec<Event>,
}

impl Trash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn event_ids(&self) -> Vec<EventId> {
        self.events.iter().map(Event::id).collect()
    }

    /// Take ownership of a removed event.
    pub fn put(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Give an event back for re-adding to a group.
    pub fn restore(&mut self, id: EventId) -> Option<Event> {
        let pos = self.events.iter().position(|e| e.id() == id)?;
        Some(self.events.remove(pos))
    }

    /// Permanently drop everything.
    pub fn empty(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cal::{jd_to_epoch, UNIX_EPOCH_JD};
    use crate::rules::{Hms, Rule};

    // 2024-01-01
    const TODAY: Jd = UNIX_EPOCH_JD + 19723;

    fn task_group() -> (EventGroup, IdAllocator, EventId) {
        let mut ids = IdAllocator::new();
        let mut group = EventGroup::new(1, "tests", TODAY - 30, TODAY + 365);
        let mut event = group.create(EventKind::Task, &mut ids).unwrap();
        set_task_day(&mut event, TODAY);
        let id = event.id();
        group.add(event).unwrap();
        (group, ids, id)
    }

    fn set_task_day(event: &mut Event, jd: Jd) {
        let date = crate::cal::from_jd(event.cal_kind(), jd).unwrap();
        if let Some(Rule::Start(rule)) = event.rule_mut("start") {
            rule.date = date;
            rule.time = Hms::new(9, 0, 0);
        }
        if let Some(Rule::End(rule)) = event.rule_mut("end") {
            rule.date = date;
            rule.time = Hms::new(10, 0, 0);
        }
    }

    #[test]
    fn test_add_indexes_event() {
        let (group, _ids, id) = task_group();
        let day0 = jd_to_epoch(TODAY);
        let hits = group.search(day0, day0 + 86400);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].event_id, id);
        assert_eq!(hits[0].start, day0 + 9 * 3600);
        assert_eq!(hits[0].end, day0 + 10 * 3600);
    }

    #[test]
    fn test_rule_change_moves_index_entries() {
        let (mut group, _ids, id) = task_group();
        group
            .modify(id, |event| set_task_day(event, TODAY + 7))
            .unwrap();
        let day0 = jd_to_epoch(TODAY);
        assert!(group.search(day0, day0 + 86400).is_empty());
        let day7 = jd_to_epoch(TODAY + 7);
        assert_eq!(group.search(day7, day7 + 86400).len(), 1);
    }

    #[test]
    fn test_noop_edit_skips_reindex() {
        let (mut group, _ids, id) = task_group();
        let changed = group
            .modify(id, |event| {
                event.summary = "summary only".into();
            })
            .unwrap();
        assert!(changed.is_some());
        // The fingerprint gate: a second direct update reports "skipped".
        assert!(!group.update_occurrence_event(id).unwrap());
    }

    #[test]
    fn test_disabled_group_answers_empty() {
        let (mut group, _ids, _id) = task_group();
        group.set_enabled(false).unwrap();
        let day0 = jd_to_epoch(TODAY);
        assert!(group.search(day0, day0 + 86400).is_empty());
        assert!(group.events_on_day(TODAY).is_empty());
        group.set_enabled(true).unwrap();
        assert_eq!(group.search(day0, day0 + 86400).len(), 1);
    }

    #[test]
    fn test_remove_drops_index_entries() {
        let (mut group, _ids, id) = task_group();
        let event = group.remove(id).unwrap();
        assert_eq!(event.id(), id);
        assert!(group.is_empty());
        assert!(group.events_on_day(TODAY).is_empty());
    }

    #[test]
    fn test_search_filters() {
        let (mut group, mut ids, id) = task_group();
        group
            .modify(id, |event| event.summary = "dentist appointment".into())
            .unwrap();
        let mut note = group.create(EventKind::DailyNote, &mut ids).unwrap();
        note.summary = "groceries".into();
        if let Some(Rule::Date(rule)) = note.rule_mut("date") {
            rule.date = crate::cal::from_jd(CalendarKind::Gregorian, TODAY).unwrap();
        }
        let note_id = note.id();
        group.add(note).unwrap();

        let day0 = jd_to_epoch(TODAY);
        let all = group.search_events(day0, day0 + 86400, &SearchFilter::default());
        assert_eq!(all.len(), 2);
        let filter = SearchFilter {
            text: Some("DENTIST".into()),
            kind: None,
        };
        assert_eq!(group.search_events(day0, day0 + 86400, &filter), vec![id]);
        let filter = SearchFilter {
            text: None,
            kind: Some("dailyNote".into()),
        };
        assert_eq!(
            group.search_events(day0, day0 + 86400, &filter),
            vec![note_id]
        );
    }

    #[test]
    fn test_bounds_change_rebuilds() {
        let (mut group, _ids, _id) = task_group();
        // Shrink the bound so the event falls outside it.
        group.set_bounds(TODAY + 100, TODAY + 200).unwrap();
        let day0 = jd_to_epoch(TODAY);
        assert!(group.search(day0, day0 + 86400).is_empty());
        group.set_bounds(TODAY - 30, TODAY + 365).unwrap();
        assert_eq!(group.search(day0, day0 + 86400).len(), 1);
    }

    #[test]
    fn test_trash_holds_removed_events() {
        let (mut group, _ids, id) = task_group();
        let mut trash = Trash::new();
        trash.put(group.remove(id).unwrap());
        assert_eq!(trash.event_ids(), vec![id]);
        // Restoring moves ownership back and reindexes.
        group.add(trash.restore(id).unwrap()).unwrap();
        assert!(trash.is_empty());
        assert_eq!(group.events_on_day(TODAY), vec![id]);
    }

    #[test]
    fn test_week_and_month_queries() {
        let (group, _ids, id) = task_group();
        // TODAY is 2024-01-01, a Monday.
        assert_eq!(group.events_in_week(TODAY + 3), vec![id]);
        assert_eq!(group.events_in_month(2024, 1).unwrap(), vec![id]);
        assert!(group.events_in_month(2024, 2).unwrap().is_empty());
    }

    #[test]
    fn test_group_data_round_trip() {
        let (group, _ids, id) = task_group();
        let data = group.data();
        let decoded = EventGroup::from_data(group.id(), &data).unwrap();
        assert_eq!(decoded.title, group.title);
        assert_eq!(decoded.bounds(), group.bounds());
        assert_eq!(EventGroup::persisted_event_ids(&data), vec![id]);
    }
}
