use clap::Subcommand;
use multitimer_core::BulkCommand;

use super::{open_engine, print_json};

#[derive(Subcommand)]
pub enum CategoryAction {
    /// List categories with status counts
    List,
    /// Start every paused timer in a category
    Start { name: String },
    /// Pause every running timer in a category
    Pause { name: String },
    /// Reset every timer in a category
    Reset { name: String },
}

pub fn run(action: CategoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let (mut engine, _config) = open_engine()?;

    let (name, command) = match action {
        CategoryAction::List => return print_json(&engine.category_summaries()),
        CategoryAction::Start { name } => (name, BulkCommand::Start),
        CategoryAction::Pause { name } => (name, BulkCommand::Pause),
        CategoryAction::Reset { name } => (name, BulkCommand::Reset),
    };
    let report = engine.bulk(&name, command)?;
    print_json(&report)
}
