use clap::Subcommand;

use super::{open_app, CmdResult};

#[derive(Subcommand)]
pub enum OnboardingAction {
    /// Mark onboarding as completed
    Complete,
    /// Show onboarding again on next launch
    Reset,
    /// Print whether onboarding is completed
    Status,
}

pub fn run(action: OnboardingAction) -> CmdResult {
    let app = open_app()?;

    match action {
        OnboardingAction::Complete => app.set_onboarding_completed(true)?,
        OnboardingAction::Reset => app.set_onboarding_completed(false)?,
        OnboardingAction::Status => {}
    }
    println!("{}", app.onboarding_completed());
    Ok(())
}
