use clap::{Parser, Subcommand};
use versegate_core::Config;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "versegate-cli", version, about = "Versegate CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apps, categories and domains to block
    Select {
        #[command(subcommand)]
        action: commands::select::SelectAction,
    },
    /// Daily blocking schedule
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Interval boundary handlers (invoked by the OS scheduler or cron)
    Trigger {
        #[command(subcommand)]
        action: commands::trigger::TriggerAction,
    },
    /// Daily verse and devotional ritual
    Read {
        #[command(subcommand)]
        action: commands::read::ReadAction,
    },
    /// Completion streaks
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// First-run flag
    Onboarding {
        #[command(subcommand)]
        action: commands::onboarding::OnboardingAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Foreground snapshot: reading state, streak, schedule and block
    Status {
        /// Evaluate as of this local date (YYYY-MM-DD)
        #[arg(long, value_parser = commands::parse_date)]
        date: Option<chrono::NaiveDate>,
    },
    /// Delete all stored state
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(&Config::load_or_default());

    let result = match cli.command {
        Commands::Select { action } => commands::select::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Trigger { action } => commands::trigger::run(action),
        Commands::Read { action } => commands::read::run(action),
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Onboarding { action } => commands::onboarding::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Status { date } => commands::status::run(date),
        Commands::Reset { yes } => commands::status::reset(yes),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
