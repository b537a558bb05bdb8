use clap::Subcommand;
use serde_json::json;

use super::{open_app, parse_date, print_json, today_or, CmdResult};

#[derive(Subcommand)]
pub enum ReadAction {
    /// Print today's reading state
    Status {
        #[arg(long, value_parser = parse_date)]
        date: Option<chrono::NaiveDate>,
    },
    /// Acknowledge the verse
    Verse {
        #[arg(long, value_parser = parse_date)]
        date: Option<chrono::NaiveDate>,
    },
    /// Acknowledge the devotional and unlock
    Devotional {
        #[arg(long, value_parser = parse_date)]
        date: Option<chrono::NaiveDate>,
    },
    /// Unlock without reading the verse
    Skip {
        #[arg(long, value_parser = parse_date)]
        date: Option<chrono::NaiveDate>,
    },
}

pub fn run(action: ReadAction) -> CmdResult {
    let app = open_app()?;
    let machine = app.unlock();

    match action {
        ReadAction::Status { date } => {
            let today = today_or(date);
            print_json(&json!({
                "state": machine.current_state_on(today),
                "daily": machine.daily_state_on(today),
            }))?;
        }
        ReadAction::Verse { date } => print_json(&machine.acknowledge_verse_on(today_or(date))?)?,
        ReadAction::Devotional { date } => {
            print_json(&machine.acknowledge_devotional_on(today_or(date))?)?
        }
        ReadAction::Skip { date } => {
            print_json(&machine.unlock_without_reading_on(today_or(date))?)?
        }
    }
    Ok(())
}
