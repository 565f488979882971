//! Event management commands.

use clap::Subcommand;
use kairos_core::rules::{Hms, Rule};
use kairos_core::{Config, EventKind};

use crate::common::{open_store, parse_date_jd, CliResult};

#[derive(Subcommand)]
pub enum EventAction {
    /// List events of a group
    List {
        /// Group id
        #[arg(long)]
        group: i64,
    },
    /// Show one event as JSON
    Show {
        /// Event id
        id: i64,
    },
    /// Add a task to a group
    AddTask {
        /// Group id
        #[arg(long)]
        group: i64,
        /// Task summary
        summary: String,
        /// Task date as YYYY-MM-DD (group calendar)
        #[arg(long)]
        date: String,
        /// Start time as HH:MM
        #[arg(long, default_value = "09:00")]
        start: String,
        /// End time as HH:MM
        #[arg(long, default_value = "10:00")]
        end: String,
    },
}

pub fn run(action: EventAction) -> CliResult {
    let config = Config::load();
    let store = open_store(&config)?;
    let mut ids = store.load_ids();

    match action {
        EventAction::List { group } => {
            let group = store.load_group(group)?;
            for &id in group.event_ids() {
                if let Some(event) = group.event(id) {
                    println!("{:>4}  {:<12} {}", id, event.kind().name(), event.summary);
                }
            }
        }
        EventAction::Show { id } => {
            let event = store.load_event(id)?;
            println!("{}", serde_json::to_string_pretty(&event.data())?);
        }
        EventAction::AddTask {
            group,
            summary,
            date,
            start,
            end,
        } => {
            let mut group = store.load_group(group)?;
            let jd = parse_date_jd(&date, group.cal_kind())?;
            let civil = kairos_core::cal::from_jd(group.cal_kind(), jd)?;
            let start = Hms::parse(&start).ok_or_else(|| format!("invalid time '{start}'"))?;
            let end = Hms::parse(&end).ok_or_else(|| format!("invalid time '{end}'"))?;

            let mut event = group.create(EventKind::Task, &mut ids)?;
            event.summary = summary;
            if let Some(Rule::Start(rule)) = event.rule_mut("start") {
                rule.date = civil;
                rule.time = start;
            }
            if let Some(Rule::End(rule)) = event.rule_mut("end") {
                rule.date = civil;
                rule.time = end;
            }
            let id = event.id();
            group.add(event)?;
            store.save_group(&mut group, &mut ids)?;
            store.save_ids(&ids)?;
            println!("Event created: {id}");
        }
    }
    Ok(())
}
