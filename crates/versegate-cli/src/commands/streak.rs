use clap::Subcommand;
use serde_json::json;

use super::{open_app, parse_date, print_json, today_or, CmdResult};

#[derive(Subcommand)]
pub enum StreakAction {
    /// Print the streak record and the displayed streak
    Show {
        #[arg(long, value_parser = parse_date)]
        date: Option<chrono::NaiveDate>,
    },
}

pub fn run(action: StreakAction) -> CmdResult {
    let app = open_app()?;
    let tracker = app.streak();

    match action {
        StreakAction::Show { date } => {
            let today = today_or(date);
            print_json(&json!({
                "record": tracker.record(),
                "currentIfQueried": tracker.current_streak_if_queried_on(today),
                "longest": tracker.longest_streak(),
                "totalDays": tracker.total_days(),
            }))?;
        }
    }
    Ok(())
}
