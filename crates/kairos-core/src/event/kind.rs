//! Event kinds and their per-kind behavior tables.

use serde_json::{Map, Value};

use crate::rules::RULE_NAMES;

/// The concrete event type, with kind-specific payload where the original
/// data model keeps extra attributes outside the rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Custom,
    Task,
    AllDayTask,
    DailyNote,
    Yearly,
    Monthly,
    Weekly,
    UniversityClass {
        course_id: Option<i64>,
    },
    UniversityExam {
        course_id: Option<i64>,
    },
    Lifetime,
    /// Spans `duration` scaled years starting at year `start * scale`.
    LargeScale {
        scale: i64,
        start: i64,
        duration: i64,
    },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Task => "task",
            Self::AllDayTask => "allDayTask",
            Self::DailyNote => "dailyNote",
            Self::Yearly => "yearly",
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
            Self::UniversityClass { .. } => "universityClass",
            Self::UniversityExam { .. } => "universityExam",
            Self::Lifetime => "lifetime",
            Self::LargeScale { .. } => "largeScale",
        }
    }

    /// Default-valued kind for a persisted type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "custom" => Self::Custom,
            "task" => Self::Task,
            "allDayTask" => Self::AllDayTask,
            "dailyNote" => Self::DailyNote,
            "yearly" => Self::Yearly,
            "monthly" => Self::Monthly,
            "weekly" => Self::Weekly,
            "universityClass" => Self::UniversityClass { course_id: None },
            "universityExam" => Self::UniversityExam { course_id: None },
            "lifetime" => Self::Lifetime,
            "largeScale" => Self::LargeScale {
                scale: 1000,
                start: 0,
                duration: 1,
            },
            _ => return None,
        })
    }

    /// Rules auto-added on creation.
    pub fn required_rules(&self) -> &'static [&'static str] {
        match self {
            Self::Custom | Self::LargeScale { .. } => &[],
            Self::Task | Self::AllDayTask | Self::Lifetime => &["start", "end"],
            Self::DailyNote => &["date"],
            Self::Yearly => &["month", "day"],
            Self::Monthly => &["day"],
            Self::Weekly => &["weekDay"],
            Self::UniversityClass { .. } => &["weekDay", "dayTimeRange"],
            Self::UniversityExam { .. } => &["date", "dayTimeRange"],
        }
    }

    /// Whitelist for the editing UI. Advisory -- correctness is enforced by
    /// the container's dependency check, not by this list.
    pub fn supported_rules(&self) -> &'static [&'static str] {
        match self {
            Self::Custom => RULE_NAMES,
            Self::Task | Self::AllDayTask => &["start", "end", "duration", "ex_dates"],
            Self::DailyNote => &["date"],
            Self::Yearly => &["year", "ex_year", "month", "day", "ex_dates"],
            Self::Monthly => &["day", "start", "end", "dayTime", "dayTimeRange", "ex_dates"],
            Self::Weekly => &[
                "start",
                "end",
                "weekDay",
                "cycleWeeks",
                "dayTime",
                "dayTimeRange",
                "ex_dates",
            ],
            Self::UniversityClass { .. } => &["weekDay", "weekNumMode", "dayTimeRange", "start"],
            Self::UniversityExam { .. } => &["date", "dayTimeRange"],
            Self::Lifetime => &["start", "end"],
            Self::LargeScale { .. } => &[],
        }
    }

    /// Kind-specific payload fields, merged into the event's flat data map.
    pub fn payload_data(&self, map: &mut Map<String, Value>) {
        match self {
            Self::UniversityClass { course_id } | Self::UniversityExam { course_id } => {
                if let Some(id) = course_id {
                    map.insert("courseId".into(), Value::from(*id));
                }
            }
            Self::LargeScale {
                scale,
                start,
                duration,
            } => {
                map.insert("scale".into(), Value::from(*scale));
                map.insert("start".into(), Value::from(*start));
                map.insert("duration".into(), Value::from(*duration));
            }
            _ => {}
        }
    }

    /// Read kind-specific payload fields back from a flat data map.
    pub fn set_payload_data(&mut self, map: &Map<String, Value>) {
        match self {
            Self::UniversityClass { course_id } | Self::UniversityExam { course_id } => {
                *course_id = map.get("courseId").and_then(Value::as_i64);
            }
            Self::LargeScale {
                scale,
                start,
                duration,
            } => {
                if let Some(v) = map.get("scale").and_then(Value::as_i64) {
                    *scale = v.max(1);
                }
                if let Some(v) = map.get("start").and_then(Value::as_i64) {
                    *start = v;
                }
                if let Some(v) = map.get("duration").and_then(Value::as_i64) {
                    *duration = v.max(1);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for name in [
            "custom",
            "task",
            "allDayTask",
            "dailyNote",
            "yearly",
            "monthly",
            "weekly",
            "universityClass",
            "universityExam",
            "lifetime",
            "largeScale",
        ] {
            assert_eq!(EventKind::from_name(name).unwrap().name(), name);
        }
        assert!(EventKind::from_name("nope").is_none());
    }

    #[test]
    fn test_required_rules_are_supported() {
        for name in [
            "task",
            "allDayTask",
            "dailyNote",
            "yearly",
            "monthly",
            "weekly",
            "universityClass",
            "universityExam",
            "lifetime",
        ] {
            let kind = EventKind::from_name(name).unwrap();
            for required in kind.required_rules() {
                assert!(
                    kind.supported_rules().contains(required),
                    "{name}: required rule {required} not in supported list"
                );
            }
        }
    }

    #[test]
    fn test_large_scale_payload_round_trip() {
        let mut map = Map::new();
        let kind = EventKind::LargeScale {
            scale: 1000,
            start: 14,
            duration: 2,
        };
        kind.payload_data(&mut map);
        let mut decoded = EventKind::from_name("largeScale").unwrap();
        decoded.set_payload_data(&map);
        assert_eq!(decoded, kind);
    }
}
