use clap::Subcommand;

use super::{open_engine, print_json};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List completions, oldest first
    List {
        /// Only the most recent N entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, _config) = open_engine()?;

    match action {
        HistoryAction::List { limit } => {
            let entries = engine.history();
            let skip = limit.map_or(0, |n| entries.len().saturating_sub(n));
            print_json(&entries[skip..])?;
        }
    }
    Ok(())
}
