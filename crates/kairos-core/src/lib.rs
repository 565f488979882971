//! # Kairos Core Library
//!
//! This library provides the core business logic for the Kairos calendar:
//! the event occurrence engine. The CLI binary (and any GUI shell) is a
//! thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Calendar layer**: pure conversions between civil dates and Julian
//!   Day integers, per calendar system (Gregorian, Julian, ISO week,
//!   Jalali)
//! - **Occurrence sets**: day sets, interval lists and instant sets with
//!   an exact intersection algebra
//! - **Rules**: composable temporal constraints with a declared
//!   need/provide/conflict contract, validated before every change
//! - **Events and groups**: rule containers and their owning collections,
//!   with a lazily growing interval search index per group
//! - **Storage**: JSON-file persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`Event`]: a rule container; its occurrence is the intersection of
//!   its rules' occurrence sets
//! - [`EventGroup`]: owns events and keeps the search index in sync
//! - [`OccurSet`]: the three-variant "when" value
//! - [`IntervalIndex`]: the range-overlap search tree
//! - [`EventStore`]: JSON persistence

pub mod cal;
pub mod error;
pub mod event;
pub mod group;
pub mod ics;
pub mod index;
pub mod occur;
pub mod rules;
pub mod storage;

pub use cal::{CalendarKind, CivilDate, Epoch, Jd};
pub use error::{CalendarError, CoreError, Result, RuleError, StorageError};
pub use event::{Event, EventId, EventKind, RemoteIds};
pub use group::{EventGroup, OccurrenceHit, SearchFilter, Trash};
pub use index::{IndexHit, IntervalIndex};
pub use occur::OccurSet;
pub use rules::{Rule, RuleCheck};
pub use storage::{Config, EventStore, IdAllocator};
