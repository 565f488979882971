//! JSON-file persistence.
//!
//! One file per entity: `events/<id>.json`, `groups/<id>.json`, plus
//! `last_ids.json` for monotonic id allocation. Ids are assigned on first
//! save. Loading is best-effort per entity -- a malformed event file is
//! logged and skipped, never aborts a group load.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result, StorageError};
use crate::event::{Event, EventId};
use crate::group::EventGroup;

mod config;
pub use config::Config;

/// Monotonic id source for events and groups. Ids are application-unique,
/// never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    #[serde(default)]
    last_event_id: i64,
    #[serde(default)]
    last_group_id: i64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_event_id(&mut self) -> EventId {
        self.last_event_id += 1;
        self.last_event_id
    }

    pub fn next_group_id(&mut self) -> i64 {
        self.last_group_id += 1;
        self.last_group_id
    }
}

/// File-backed store for events and groups.
#[derive(Debug)]
pub struct EventStore {
    root: PathBuf,
}

impl EventStore {
    /// Open (creating directories as needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for sub in ["events", "groups"] {
            fs::create_dir_all(root.join(sub)).map_err(|err| StorageError::OpenFailed {
                path: root.clone(),
                message: err.to_string(),
            })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn event_path(&self, id: EventId) -> PathBuf {
        self.root.join("events").join(format!("{id}.json"))
    }

    fn group_path(&self, id: i64) -> PathBuf {
        self.root.join("groups").join(format!("{id}.json"))
    }

    fn ids_path(&self) -> PathBuf {
        self.root.join("last_ids.json")
    }

    /// Load the id allocator, or a fresh one if none was saved yet.
    pub fn load_ids(&self) -> IdAllocator {
        match fs::read_to_string(self.ids_path()) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                log::warn!("malformed last_ids.json ({err}); starting fresh");
                IdAllocator::new()
            }),
            Err(_) => IdAllocator::new(),
        }
    }

    pub fn save_ids(&self, ids: &IdAllocator) -> Result<()> {
        write_json(&self.ids_path(), &serde_json::to_value(ids)?)
    }

    /// Persist an event, assigning an id on first save.
    pub fn save_event(&self, event: &mut Event, ids: &mut IdAllocator) -> Result<()> {
        if event.id() == 0 {
            event.set_id(ids.next_event_id());
            self.save_ids(ids)?;
        }
        write_json(&self.event_path(event.id()), &event.data())
    }

    pub fn load_event(&self, id: EventId) -> Result<Event> {
        let path = self.event_path(id);
        let value = read_json(&path, "event", id)?;
        let mut event = Event::from_data(&value)?;
        event.set_id(id);
        Ok(event)
    }

    pub fn delete_event(&self, id: EventId) -> Result<()> {
        let path = self.event_path(id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Persist a group's metadata and every member event.
    pub fn save_group(&self, group: &mut EventGroup, ids: &mut IdAllocator) -> Result<()> {
        if group.id() == 0 {
            group.set_id(ids.next_group_id());
            self.save_ids(ids)?;
        }
        write_json(&self.group_path(group.id()), &group.data())?;
        for id in group.event_ids().to_vec() {
            if let Some(event) = group.event(id) {
                write_json(&self.event_path(id), &event.data())?;
            }
        }
        Ok(())
    }

    /// Load a group and its member events, then build its index. Events
    /// that fail to load are logged and skipped.
    pub fn load_group(&self, id: i64) -> Result<EventGroup> {
        let path = self.group_path(id);
        let value = read_json(&path, "group", id)?;
        let mut group = EventGroup::from_data(id, &value)?;
        for event_id in EventGroup::persisted_event_ids(&value) {
            match self.load_event(event_id) {
                Ok(event) => {
                    if let Err(err) = group.add(event) {
                        log::warn!("group {id}: skipping event {event_id}: {err}");
                    }
                }
                Err(err) => {
                    log::warn!("group {id}: skipping event {event_id}: {err}");
                }
            }
        }
        Ok(group)
    }

    /// Load every stored group, sorted by id.
    pub fn load_groups(&self) -> Result<Vec<EventGroup>> {
        let mut groups = Vec::new();
        for entry in fs::read_dir(self.root.join("groups"))? {
            let path = entry?.path();
            let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<i64>().ok())
            else {
                continue;
            };
            match self.load_group(id) {
                Ok(group) => groups.push(group),
                Err(err) => log::warn!("skipping group {id}: {err}"),
            }
        }
        groups.sort_by_key(EventGroup::id);
        Ok(groups)
    }
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    Ok(fs::write(path, serde_json::to_string_pretty(value)?)?)
}

fn read_json(path: &Path, entity: &'static str, id: i64) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|_| StorageError::NotFound { entity, id })?;
    serde_json::from_str(&text).map_err(|err| {
        CoreError::Storage(StorageError::Malformed {
            entity,
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cal::{CalendarKind, UNIX_EPOCH_JD};
    use crate::event::EventKind;

    const TODAY: i64 = UNIX_EPOCH_JD + 19723;

    #[test]
    fn test_event_save_assigns_id_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open(dir.path()).unwrap();
        let mut ids = store.load_ids();

        let mut event = Event::new(EventKind::Task, CalendarKind::Gregorian);
        event.set_defaults(TODAY).unwrap();
        event.summary = "persisted".into();
        store.save_event(&mut event, &mut ids).unwrap();
        assert_eq!(event.id(), 1);
        store.save_event(&mut event, &mut ids).unwrap();
        assert_eq!(event.id(), 1, "second save must not reassign");

        let loaded = store.load_event(1).unwrap();
        assert_eq!(loaded.summary, "persisted");
        assert_eq!(loaded.rules_fingerprint(), event.rules_fingerprint());
        // The allocator survives a reload.
        assert_eq!(store.load_ids().next_event_id(), 2);
    }

    #[test]
    fn test_group_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open(dir.path()).unwrap();
        let mut ids = store.load_ids();

        let mut group = EventGroup::new(0, "work", TODAY - 30, TODAY + 365);
        let mut event = group.create(EventKind::DailyNote, &mut ids).unwrap();
        event.summary = "standup notes".into();
        group.add(event).unwrap();
        store.save_group(&mut group, &mut ids).unwrap();
        assert!(group.id() > 0);

        let loaded = store.load_group(group.id()).unwrap();
        assert_eq!(loaded.title, "work");
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_malformed_event_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open(dir.path()).unwrap();
        let mut ids = store.load_ids();

        let mut group = EventGroup::new(0, "mixed", TODAY - 30, TODAY + 30);
        let event = group.create(EventKind::DailyNote, &mut ids).unwrap();
        group.add(event).unwrap();
        store.save_group(&mut group, &mut ids).unwrap();

        // Corrupt one member file and reference a missing one.
        let good_id = group.event_ids()[0];
        fs::write(store.event_path(good_id), "{ not json").unwrap();
        let loaded = store.load_group(group.id()).unwrap();
        assert_eq!(loaded.len(), 0, "bad events are skipped");
        assert_eq!(loaded.title, "mixed");
    }

    #[test]
    fn test_missing_entities_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = EventStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.load_event(99),
            Err(CoreError::Storage(StorageError::NotFound { .. }))
        ));
        assert!(store.load_groups().unwrap().is_empty());
    }
}
