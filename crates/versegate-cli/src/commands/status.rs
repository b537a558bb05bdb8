use chrono::NaiveDate;

use super::{open_app, print_json, today_or, CmdResult};

pub fn run(date: Option<NaiveDate>) -> CmdResult {
    let app = open_app()?;
    print_json(&app.on_foreground_on(today_or(date))?)
}

pub fn reset(yes: bool) -> CmdResult {
    if !yes {
        return Err("refusing to delete all state without --yes".into());
    }
    let app = open_app()?;
    let removed = app.store().reset()?;
    println!("{{\"type\": \"reset\", \"removed\": {removed}}}");
    Ok(())
}
