use clap::Subcommand;
use multitimer_core::{Engine, Timer, TimerId};
use serde::Serialize;

use super::{open_engine, print_json};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Create a paused timer
    Add {
        /// Display name
        name: String,
        /// Duration in seconds
        #[arg(long, short)]
        duration: u64,
        /// Category (defaults to timers.default_category)
        #[arg(long, short)]
        category: Option<String>,
    },
    /// List timers as JSON
    List {
        /// Only timers in this category
        #[arg(long, short)]
        category: Option<String>,
    },
    /// Show one timer with its progress
    Show { id: String },
    /// Start a paused timer
    Start { id: String },
    /// Pause a running timer
    Pause { id: String },
    /// Reset a timer to its full duration
    Reset { id: String },
    /// Delete a timer (history is kept)
    Remove { id: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimerView<'a> {
    #[serde(flatten)]
    timer: &'a Timer,
    progress: f64,
    near_end: bool,
}

impl<'a> From<&'a Timer> for TimerView<'a> {
    fn from(timer: &'a Timer) -> Self {
        Self {
            timer,
            progress: timer.progress(),
            near_end: timer.is_near_end(),
        }
    }
}

fn show(engine: &Engine, id: &TimerId) -> Result<(), Box<dyn std::error::Error>> {
    let timer = engine
        .timer(id)
        .ok_or_else(|| format!("timer not found: {id}"))?;
    print_json(&TimerView::from(timer))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let (mut engine, _config) = open_engine()?;

    match action {
        TimerAction::Add {
            name,
            duration,
            category,
        } => {
            let id = engine.add_timer(&name, category.as_deref(), duration)?;
            show(&engine, &id)?;
        }
        TimerAction::List { category } => {
            let views: Vec<TimerView> = engine
                .timers()
                .filter(|t| category.as_deref().map_or(true, |c| t.category() == c))
                .map(TimerView::from)
                .collect();
            print_json(&views)?;
        }
        TimerAction::Show { id } => show(&engine, &TimerId::from(id))?,
        TimerAction::Start { id } => {
            let id = TimerId::from(id);
            match engine.start(&id)? {
                Some(event) => print_json(&event)?,
                None => show(&engine, &id)?,
            }
        }
        TimerAction::Pause { id } => {
            let id = TimerId::from(id);
            match engine.pause(&id)? {
                Some(event) => print_json(&event)?,
                None => show(&engine, &id)?,
            }
        }
        TimerAction::Reset { id } => {
            let event = engine.reset(&TimerId::from(id))?;
            print_json(&event)?;
        }
        TimerAction::Remove { id } => {
            let removed = engine.remove_timer(&TimerId::from(id))?;
            print_json(&removed)?;
        }
    }
    Ok(())
}
