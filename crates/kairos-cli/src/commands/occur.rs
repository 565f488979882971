//! Occurrence range queries.

use clap::Args;
use kairos_core::cal::jd_to_epoch;
use kairos_core::Config;

use crate::common::{open_store, parse_date_jd, CliResult};

#[derive(Args)]
pub struct OccurArgs {
    /// Group id
    #[arg(long)]
    pub group: i64,
    /// Range start as YYYY-MM-DD (group calendar), inclusive
    #[arg(long)]
    pub from: String,
    /// Range end as YYYY-MM-DD (group calendar), exclusive
    #[arg(long)]
    pub to: String,
    /// Only events whose summary/description contains this text
    #[arg(long)]
    pub text: Option<String>,
}

pub fn run(args: OccurArgs) -> CliResult {
    let config = Config::load();
    let store = open_store(&config)?;
    let group = store.load_group(args.group)?;

    let from = jd_to_epoch(parse_date_jd(&args.from, group.cal_kind())?);
    let to = jd_to_epoch(parse_date_jd(&args.to, group.cal_kind())?);

    let filter = kairos_core::SearchFilter {
        text: args.text,
        kind: None,
    };
    let visible = group.search_events(from, to, &filter);
    for hit in group.search(from, to) {
        if !visible.contains(&hit.event_id) {
            continue;
        }
        let summary = group
            .event(hit.event_id)
            .map(|e| e.summary.as_str())
            .unwrap_or("");
        println!(
            "{}  {} .. {}  {}",
            hit.event_id,
            kairos_core::ics::format_epoch(hit.start)?,
            kairos_core::ics::format_epoch(hit.end)?,
            summary,
        );
    }
    Ok(())
}
