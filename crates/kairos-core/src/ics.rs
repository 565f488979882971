//! ICS value formatting.
//!
//! Tiny pure codec for the export collaborator: Julian Days and epochs to
//! iCalendar date/date-time strings, and weekday numbers to BYDAY codes.

use chrono::{DateTime, Datelike, Timelike};

use crate::cal::{self, CalendarKind, Epoch, Jd};
use crate::error::CoreError;

const BYDAY_CODES: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

/// `YYYYMMDD` for a Julian Day (always Gregorian on the wire).
pub fn format_jd(jd: Jd) -> Result<String, CoreError> {
    let d = cal::from_jd(CalendarKind::Gregorian, jd)?;
    Ok(format!("{:04}{:02}{:02}", d.year, d.month, d.day))
}

/// `YYYYMMDDTHHMMSSZ` for an epoch second.
pub fn format_epoch(epoch: Epoch) -> Result<String, CoreError> {
    let dt: DateTime<chrono::Utc> = DateTime::from_timestamp(epoch, 0)
        .ok_or_else(|| CoreError::Custom(format!("epoch {epoch} out of chrono range")))?;
    Ok(format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    ))
}

/// BYDAY code for a weekday (0 = Sunday .. 6 = Saturday).
pub fn byday_code(week_day: u8) -> Option<&'static str> {
    BYDAY_CODES.get(week_day as usize).copied()
}

/// Comma-joined BYDAY list, `None` if any day is out of range.
pub fn byday_list(week_days: &[u8]) -> Option<String> {
    let codes: Option<Vec<&str>> = week_days.iter().map(|&d| byday_code(d)).collect();
    codes.map(|c| c.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cal::UNIX_EPOCH_JD;

    #[test]
    fn test_format_jd() {
        assert_eq!(format_jd(UNIX_EPOCH_JD).unwrap(), "19700101");
    }

    #[test]
    fn test_format_epoch() {
        assert_eq!(format_epoch(0).unwrap(), "19700101T000000Z");
        assert_eq!(format_epoch(1704103200).unwrap(), "20240101T100000Z");
    }

    #[test]
    fn test_byday() {
        assert_eq!(byday_code(0), Some("SU"));
        assert_eq!(byday_code(6), Some("SA"));
        assert_eq!(byday_code(7), None);
        assert_eq!(byday_list(&[1, 3, 5]).as_deref(), Some("MO,WE,FR"));
        assert_eq!(byday_list(&[9]), None);
    }
}
