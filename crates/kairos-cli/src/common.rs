//! Shared helpers for CLI commands.

use kairos_core::cal::{self, CalendarKind, CivilDate, Jd};
use kairos_core::{Config, EventStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the store at the configured data directory.
pub fn open_store(config: &Config) -> Result<EventStore, Box<dyn std::error::Error>> {
    Ok(EventStore::open(config.data_dir()?)?)
}

/// Today's Julian Day.
pub fn today_jd() -> Jd {
    cal::epoch_to_jd(chrono::Utc::now().timestamp())
}

/// Parse a `YYYY-MM-DD` argument in the given calendar.
pub fn parse_date_jd(s: &str, kind: CalendarKind) -> Result<Jd, Box<dyn std::error::Error>> {
    let date =
        CivilDate::parse(s).ok_or_else(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))?;
    Ok(cal::to_jd(kind, date)?)
}

/// Parse a calendar system name.
pub fn parse_cal(name: &str) -> Result<CalendarKind, Box<dyn std::error::Error>> {
    CalendarKind::from_name(name).ok_or_else(|| {
        format!(
            "unknown calendar '{name}' (expected one of: {})",
            CalendarKind::all()
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
        .into()
    })
}
