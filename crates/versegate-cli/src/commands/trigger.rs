use clap::Subcommand;

use super::{now_or, open_app, parse_datetime, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TriggerAction {
    /// Interval start: apply the saved selection
    Start,
    /// Interval end: clear the block
    End,
    /// Dispatch whichever boundary is due (run periodically)
    Tick {
        /// Evaluate as of this local time instead of now
        #[arg(long, value_parser = parse_datetime)]
        at: Option<chrono::NaiveDateTime>,
    },
}

pub fn run(action: TriggerAction) -> CmdResult {
    let app = open_app()?;

    match action {
        TriggerAction::Start => print_json(&app.trigger().on_interval_start()?)?,
        TriggerAction::End => print_json(&app.trigger().on_interval_end()?)?,
        TriggerAction::Tick { at } => print_json(&app.tick_at(now_or(at))?)?,
    }
    Ok(())
}
