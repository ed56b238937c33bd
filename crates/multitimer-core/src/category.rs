//! Category grouping and bulk transitions.
//!
//! Categories are not stored. They are derived from the `category` field of the
//! live timers every time they are asked for, in order of first appearance.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::timer::{Timer, TimerId, TimerStatus};

/// Partition timers by category, keeping first-appearance order.
pub fn group_by_category<'a, I>(timers: I) -> IndexMap<&'a str, Vec<&'a Timer>>
where
    I: IntoIterator<Item = &'a Timer>,
{
    let mut groups: IndexMap<&'a str, Vec<&'a Timer>> = IndexMap::new();
    for timer in timers {
        groups.entry(timer.category()).or_default().push(timer);
    }
    groups
}

/// Per-category status counts for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub total: usize,
    pub running: usize,
    pub paused: usize,
    pub completed: usize,
}

impl CategorySummary {
    pub fn from_group(name: &str, timers: &[&Timer]) -> Self {
        let count = |status: TimerStatus| timers.iter().filter(|t| t.status() == status).count();
        Self {
            name: name.to_string(),
            total: timers.len(),
            running: count(TimerStatus::Running),
            paused: count(TimerStatus::Paused),
            completed: count(TimerStatus::Completed),
        }
    }
}

/// Command applied to every member of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkCommand {
    Start,
    Pause,
    Reset,
}

impl BulkCommand {
    /// Whether the command targets this timer at all.
    pub fn applies_to(self, timer: &Timer) -> bool {
        match self {
            // Completed timers stay completed until reset.
            BulkCommand::Start => timer.status() == TimerStatus::Paused,
            BulkCommand::Pause => timer.status() == TimerStatus::Running,
            BulkCommand::Reset => true,
        }
    }

    pub fn apply(self, timer: &mut Timer) -> Option<Event> {
        if !self.applies_to(timer) {
            return None;
        }
        match self {
            BulkCommand::Start => timer.start(),
            BulkCommand::Pause => timer.pause(),
            BulkCommand::Reset => Some(timer.reset()),
        }
    }
}

/// Result of one bulk transition over a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkReport {
    pub category: String,
    /// Members of the category.
    pub matched: usize,
    /// Members whose state changed.
    pub changed: Vec<TimerId>,
    /// Members the command did not apply to.
    pub skipped: Vec<TimerId>,
    #[serde(skip)]
    pub events: Vec<Event>,
}

/// Apply `command` to every timer in `category`, one timer at a time.
///
/// A timer the command does not apply to is skipped without affecting the
/// others.
pub fn apply_bulk<'a, I>(timers: I, category: &str, command: BulkCommand) -> BulkReport
where
    I: IntoIterator<Item = &'a mut Timer>,
{
    let mut report = BulkReport {
        category: category.to_string(),
        ..BulkReport::default()
    };
    for timer in timers.into_iter().filter(|t| t.category() == category) {
        report.matched += 1;
        match command.apply(timer) {
            Some(event) => {
                report.changed.push(timer.id().clone());
                report.events.push(event);
            }
            None => report.skipped.push(timer.id().clone()),
        }
    }
    report
}
