//! Core error types for kairos-core.
//!
//! This module defines the error hierarchy using thiserror. Calendrical and
//! structural errors carry enough context to name the offending value;
//! recoverable rule-combination problems are reported as [`RuleCheck`]
//! data from the validation entry points, never as errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::cal::CalendarKind;

/// Core error type for kairos-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Calendar conversion errors
    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// Rule evaluation errors
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Calendar conversion errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// A (year, month, day) tuple is not a valid date in the given system.
    #[error("Invalid date {year}-{month}-{day} in the {kind} calendar")]
    InvalidDate {
        kind: CalendarKind,
        year: i32,
        month: u8,
        day: u8,
    },

    /// A Julian Day is outside the range the system can convert.
    #[error("Julian day {jd} is out of range for the {kind} calendar")]
    JdOutOfRange { kind: CalendarKind, jd: i64 },
}

/// Rule evaluation errors.
///
/// `MissingRule` indicates an invariant the container is supposed to
/// guarantee was violated (a rule evaluated with an unmet need), which
/// means a bug or corrupted persisted data -- it is fatal to the
/// operation, unlike the [`RuleCheck`](crate::rules::RuleCheck) outcomes
/// that report expected user-facing validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A rule that another rule needs is absent at evaluation time.
    #[error("Required rule '{name}' is missing from the event")]
    MissingRule { name: &'static str },

    /// A rule with this name is already attached to the event.
    #[error("Rule '{name}' is already attached to the event")]
    DuplicateRule { name: String },

    /// No rule kind is registered under this name.
    #[error("Unknown rule name '{name}'")]
    UnknownRule { name: String },
}

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read or create the data directory layout
    #[error("Failed to open store at {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// An entity file is missing
    #[error("No stored {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// An entity file exists but cannot be parsed
    #[error("Malformed {entity} file {path}: {message}")]
    Malformed {
        entity: &'static str,
        path: PathBuf,
        message: String,
    },

    /// An entity must be saved (and given an id) first
    #[error("{entity} has no id yet; save it first")]
    Unsaved { entity: &'static str },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
