use clap::Subcommand;
use serde_json::json;
use versegate_core::Schedule;

use super::{now_or, open_app, parse_datetime, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Save the start time and (re)arm the daily interval
    Arm {
        /// Start hour (0-23); defaults to the saved schedule
        #[arg(long)]
        hour: Option<u32>,
        /// Start minute (0-59); defaults to the saved schedule
        #[arg(long)]
        minute: Option<u32>,
        /// Arm as of this local time instead of now
        #[arg(long, value_parser = parse_datetime)]
        at: Option<chrono::NaiveDateTime>,
    },
    /// Stop the daily interval
    Disarm,
    /// Print armed state and saved start time
    Status,
}

pub fn run(action: ScheduleAction) -> CmdResult {
    let app = open_app()?;
    let controller = app.schedule();

    match action {
        ScheduleAction::Arm { hour, minute, at } => {
            let saved = controller.saved_schedule();
            let schedule = Schedule::new(
                hour.unwrap_or(saved.start_hour),
                minute.unwrap_or(saved.start_minute),
            )?;
            match controller.arm_at(&schedule, now_or(at)) {
                Ok(registration) => print_json(&registration)?,
                Err(e) if e.is_retryable() => {
                    return Err(format!("{e} (selection kept; run `schedule arm` again)").into())
                }
                Err(e) => return Err(e.into()),
            }
        }
        ScheduleAction::Disarm => {
            controller.disarm()?;
            println!("{{\"type\": \"schedule_disarmed\"}}");
        }
        ScheduleAction::Status => {
            print_json(&json!({
                "status": controller.status(),
                "savedSchedule": controller.saved_schedule(),
                "registration": controller.registration(),
            }))?;
        }
    }
    Ok(())
}
