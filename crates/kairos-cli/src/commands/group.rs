//! Group management commands.

use clap::Subcommand;
use kairos_core::{Config, EventGroup};

use crate::common::{open_store, today_jd, CliResult};

#[derive(Subcommand)]
pub enum GroupAction {
    /// Create a new group
    Create {
        /// Group title
        title: String,
        /// Display color, #rrggbb
        #[arg(long)]
        color: Option<String>,
    },
    /// List all groups
    List,
    /// Show one group and its members
    Show {
        /// Group id
        id: i64,
    },
}

pub fn run(action: GroupAction) -> CliResult {
    let config = Config::load();
    let store = open_store(&config)?;
    let mut ids = store.load_ids();

    match action {
        GroupAction::Create { title, color } => {
            let today = today_jd();
            let mut group = EventGroup::new(
                0,
                title,
                today - config.horizon_past_days,
                today + config.horizon_future_days,
            );
            group.color = color.unwrap_or_else(|| config.default_color.clone());
            store.save_group(&mut group, &mut ids)?;
            println!("Group created: {}", group.id());
        }
        GroupAction::List => {
            for group in store.load_groups()? {
                let (start, end) = group.bounds();
                println!(
                    "{:>4}  {:<24} {} events  [{start}..{end})  {}",
                    group.id(),
                    group.title,
                    group.len(),
                    if group.enabled() { "enabled" } else { "disabled" },
                );
            }
        }
        GroupAction::Show { id } => {
            let group = store.load_group(id)?;
            println!("{}", serde_json::to_string_pretty(&group.data())?);
            for &event_id in group.event_ids() {
                if let Some(event) = group.event(event_id) {
                    println!("{:>4}  {:<12} {}", event_id, event.kind().name(), event.summary);
                }
            }
        }
    }
    Ok(())
}
