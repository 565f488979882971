//! ICS export.
//!
//! Events with a compact RRULE form emit their `ics_data` pairs verbatim;
//! everything else falls back to one VEVENT per computed occurrence range.

use clap::Args;
use kairos_core::ics::format_epoch;
use kairos_core::{Config, Event, EventGroup};

use crate::common::{open_store, parse_date_jd, CliResult};

#[derive(Args)]
pub struct ExportArgs {
    /// Group id
    #[arg(long)]
    pub group: i64,
    /// Range start as YYYY-MM-DD; defaults to the group's indexing bound
    #[arg(long)]
    pub from: Option<String>,
    /// Range end as YYYY-MM-DD; defaults to the group's indexing bound
    #[arg(long)]
    pub to: Option<String>,
}

pub fn run(args: ExportArgs) -> CliResult {
    let config = Config::load();
    let store = open_store(&config)?;
    let group = store.load_group(args.group)?;

    let (bound_start, bound_end) = group.bounds();
    let start_jd = match &args.from {
        Some(s) => parse_date_jd(s, group.cal_kind())?,
        None => bound_start,
    };
    let end_jd = match &args.to {
        Some(s) => parse_date_jd(s, group.cal_kind())?,
        None => bound_end,
    };

    println!("BEGIN:VCALENDAR");
    println!("VERSION:2.0");
    println!("PRODID:-//kairos//calendar//EN");
    for &id in group.event_ids() {
        let Some(event) = group.event(id) else { continue };
        export_event(&group, event, start_jd, end_jd)?;
    }
    println!("END:VCALENDAR");
    Ok(())
}

fn export_event(group: &EventGroup, event: &Event, start_jd: i64, end_jd: i64) -> CliResult {
    if let Some(pairs) = event.ics_data() {
        println!("BEGIN:VEVENT");
        println!("UID:kairos-{}@{}", event.id(), group.id());
        println!("SUMMARY:{}", event.summary);
        for (key, value) in pairs {
            println!("{key}:{value}");
        }
        println!("END:VEVENT");
        return Ok(());
    }
    let occur = event.calc_occurrence(start_jd, end_jd)?;
    for (idx, (start, end)) in occur.time_range_list().into_iter().enumerate() {
        if end <= start {
            continue;
        }
        println!("BEGIN:VEVENT");
        println!("UID:kairos-{}-{idx}@{}", event.id(), group.id());
        println!("SUMMARY:{}", event.summary);
        println!("DTSTART:{}", format_epoch(start)?);
        println!("DTEND:{}", format_epoch(end)?);
        println!("END:VEVENT");
    }
    Ok(())
}
