//! Calendar conversion commands.

use clap::Subcommand;
use kairos_core::cal::{self, CivilDate};

use crate::common::{parse_cal, today_jd, CliResult};

#[derive(Subcommand)]
pub enum CalAction {
    /// Convert a date between calendar systems
    Convert {
        /// Date as YYYY-MM-DD
        date: String,
        /// Source calendar system
        #[arg(long, default_value = "gregorian")]
        from: String,
        /// Target calendar system
        #[arg(long)]
        to: String,
    },
    /// Show today's date in every calendar system
    Today,
    /// Show the length of a month
    MonthLen {
        year: i32,
        month: u8,
        /// Calendar system
        #[arg(long, default_value = "gregorian")]
        cal: String,
    },
}

pub fn run(action: CalAction) -> CliResult {
    match action {
        CalAction::Convert { date, from, to } => {
            let from = parse_cal(&from)?;
            let to = parse_cal(&to)?;
            let date =
                CivilDate::parse(&date).ok_or_else(|| format!("invalid date '{date}'"))?;
            println!("{}", cal::convert(date, from, to)?);
        }
        CalAction::Today => {
            let jd = today_jd();
            for &kind in cal::CalendarKind::all() {
                println!("{:<10} {}", kind.as_str(), cal::from_jd(kind, jd)?);
            }
        }
        CalAction::MonthLen { year, month, cal: name } => {
            let kind = parse_cal(&name)?;
            println!("{}", cal::month_len(kind, year, month)?);
        }
    }
    Ok(())
}
