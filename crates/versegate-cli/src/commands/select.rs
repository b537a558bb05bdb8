use clap::Subcommand;
use versegate_core::Selection;

use super::{open_app, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SelectAction {
    /// Replace the saved selection
    Set {
        /// Application token (repeatable)
        #[arg(long = "app")]
        apps: Vec<String>,
        /// Category token (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Web domain (repeatable)
        #[arg(long = "domain")]
        domains: Vec<String>,
    },
    /// Print the saved selection
    Show {
        /// Read the diagnostic secondary copy instead
        #[arg(long)]
        secondary: bool,
    },
    /// Remove the saved selection
    Clear,
}

pub fn run(action: SelectAction) -> CmdResult {
    let app = open_app()?;
    let repo = app.selections();

    match action {
        SelectAction::Set {
            apps,
            categories,
            domains,
        } => {
            let selection = Selection {
                applications: apps.into_iter().collect(),
                categories: categories.into_iter().collect(),
                domains: domains.into_iter().collect(),
            };
            if !selection.is_effective() {
                eprintln!("warning: selection is empty; nothing will be blocked");
            }
            repo.save(&selection)?;
            print_json(&selection)?;
        }
        SelectAction::Show { secondary } => {
            let selection = if secondary {
                repo.load_secondary()
            } else {
                repo.load()
            };
            print_json(&selection)?;
        }
        SelectAction::Clear => {
            repo.clear()?;
            println!("{{\"type\": \"selection_cleared\"}}");
        }
    }
    Ok(())
}
