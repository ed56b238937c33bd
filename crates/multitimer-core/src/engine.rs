//! The timer engine: live timers, the tick scheduler, notifications, history
//! and the durable store behind one owner.
//!
//! Memory is the source of truth. Every mutating command changes the working
//! copy first, then writes the whole timer set back before returning. A failed
//! write is reported to the caller but never undoes the transition.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = Engine::load(SqliteStore::open()?, &config);
//! let id = engine.add_timer("Plank", Some("Workout"), 60)?;
//! engine.start(&id)?;
//! // Once per cadence:
//! engine.fire();
//! ```

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::category::{apply_bulk, group_by_category, BulkCommand, BulkReport, CategorySummary};
use crate::error::{CoreError, PersistError, Record, Result, ValidationError};
use crate::events::Event;
use crate::history::{HistoryEntry, HistoryRecorder};
use crate::notify::{NotificationDispatcher, Notifier};
use crate::scheduler::TickScheduler;
use crate::storage::records::{load_timers, save_timers};
use crate::storage::{Config, DurableStore, TimersConfig};
use crate::timer::{Timer, TimerId, TimerStatus};

/// Outcome of one cadence firing.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Every event produced by the firing, in the order it was dispatched.
    pub events: Vec<Event>,
    /// History entries written for timers that completed.
    pub recorded: Vec<HistoryEntry>,
    /// Writes that failed. The transitions they belong to still happened.
    pub warnings: Vec<PersistError>,
}

impl TickReport {
    pub fn completed(&self) -> impl Iterator<Item = &TimerId> {
        self.events.iter().filter_map(|e| match e {
            Event::Completed { id, .. } => Some(id),
            _ => None,
        })
    }
}

pub struct Engine {
    timers: IndexMap<TimerId, Timer>,
    scheduler: TickScheduler,
    dispatcher: NotificationDispatcher,
    recorder: HistoryRecorder,
    store: Box<dyn DurableStore>,
    authoring: TimersConfig,
}

impl Engine {
    /// Build an engine over `store`, loading whatever timer set it holds.
    ///
    /// Never fails: unreadable records load as an empty set. Timers stored as
    /// running are registered with the scheduler again.
    pub fn load(store: impl DurableStore + 'static, config: &Config) -> Self {
        let store: Box<dyn DurableStore> = Box::new(store);
        let mut scheduler = TickScheduler::new(config.cadence());
        let mut timers = IndexMap::new();
        for timer in load_timers(store.as_ref()) {
            scheduler.sync(timer.id(), timer.status());
            timers.insert(timer.id().clone(), timer);
        }
        tracing::info!(
            timers = timers.len(),
            running = scheduler.active_ids().len(),
            "timer engine loaded"
        );
        Self {
            timers,
            scheduler,
            dispatcher: NotificationDispatcher::new(&config.notifications),
            recorder: HistoryRecorder::new(),
            store,
            authoring: config.timers.clone(),
        }
    }

    pub fn add_notifier(&mut self, sink: impl Notifier + 'static) {
        self.dispatcher.add_sink(sink);
    }

    pub fn with_notifier(mut self, sink: impl Notifier + 'static) -> Self {
        self.add_notifier(sink);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self, id: &TimerId) -> Option<&Timer> {
        self.timers.get(id)
    }

    /// Live timers in creation order.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> {
        self.timers.values()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn categories(&self) -> IndexMap<&str, Vec<&Timer>> {
        group_by_category(self.timers.values())
    }

    pub fn category_summaries(&self) -> Vec<CategorySummary> {
        self.categories()
            .iter()
            .map(|(name, timers)| CategorySummary::from_group(name, timers))
            .collect()
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn has_active(&self) -> bool {
        self.scheduler.has_active()
    }

    pub fn store(&self) -> &dyn DurableStore {
        self.store.as_ref()
    }

    /// Recorded completions, oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.recorder.entries(self.store.as_ref())
    }

    // ── Authoring ────────────────────────────────────────────────────

    /// Create a paused timer. `category` falls back to the configured default.
    ///
    /// # Errors
    /// Returns [`CoreError::Validation`] for blank fields or a duration not
    /// above the configured minimum, and [`CoreError::Persist`] if the timer
    /// was added but the timer set could not be written.
    pub fn add_timer(
        &mut self,
        name: &str,
        category: Option<&str>,
        duration: u64,
    ) -> Result<TimerId> {
        let min = self.authoring.min_duration_secs;
        if duration <= min {
            return Err(ValidationError::DurationTooShort { duration, min }.into());
        }
        let category = category.unwrap_or(self.authoring.default_category.as_str());
        let timer = Timer::new(name, category, duration)?;
        let id = timer.id().clone();
        tracing::info!(%id, name = timer.name(), category = timer.category(), duration, "timer added");
        self.dispatcher.dispatch(&timer.snapshot());
        self.timers.insert(id.clone(), timer);
        self.persist_timers()?;
        Ok(id)
    }

    /// Delete a timer. Its history entries are untouched.
    ///
    /// # Errors
    /// Returns [`CoreError::TimerNotFound`] or [`CoreError::Persist`].
    pub fn remove_timer(&mut self, id: &TimerId) -> Result<Timer> {
        let timer = self
            .timers
            .shift_remove(id)
            .ok_or_else(|| CoreError::TimerNotFound(id.clone()))?;
        self.scheduler.deregister(id);
        tracing::info!(%id, "timer removed");
        self.persist_timers()?;
        Ok(timer)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a paused timer. Returns `None` when the timer was already
    /// running or is completed.
    ///
    /// # Errors
    /// Returns [`CoreError::TimerNotFound`] or [`CoreError::Persist`].
    pub fn start(&mut self, id: &TimerId) -> Result<Option<Event>> {
        self.command(id, Timer::start)
    }

    /// Pause a running timer. Once this returns no further tick reaches it.
    ///
    /// # Errors
    /// Returns [`CoreError::TimerNotFound`] or [`CoreError::Persist`].
    pub fn pause(&mut self, id: &TimerId) -> Result<Option<Event>> {
        self.command(id, Timer::pause)
    }

    /// Reset a timer from any state.
    ///
    /// # Errors
    /// Returns [`CoreError::TimerNotFound`] or [`CoreError::Persist`].
    pub fn reset(&mut self, id: &TimerId) -> Result<Event> {
        let event = self.command(id, |t| Some(t.reset()))?;
        event.ok_or_else(|| CoreError::Custom(format!("reset of {id} produced no snapshot")))
    }

    fn command<F>(&mut self, id: &TimerId, transition: F) -> Result<Option<Event>>
    where
        F: FnOnce(&mut Timer) -> Option<Event>,
    {
        let timer = self
            .timers
            .get_mut(id)
            .ok_or_else(|| CoreError::TimerNotFound(id.clone()))?;
        let Some(event) = transition(timer) else {
            return Ok(None);
        };
        self.scheduler.sync(id, timer.status());
        tracing::info!(%id, status = %timer.status(), remaining = timer.remaining(), "timer transition");
        self.dispatcher.dispatch(&event);
        self.persist_timers()?;
        Ok(Some(event))
    }

    pub fn start_all(&mut self, category: &str) -> Result<BulkReport> {
        self.bulk(category, BulkCommand::Start)
    }

    pub fn pause_all(&mut self, category: &str) -> Result<BulkReport> {
        self.bulk(category, BulkCommand::Pause)
    }

    pub fn reset_all(&mut self, category: &str) -> Result<BulkReport> {
        self.bulk(category, BulkCommand::Reset)
    }

    /// Apply `command` to every member of `category` and persist once.
    ///
    /// # Errors
    /// Returns [`CoreError::Persist`] if the timer set could not be written;
    /// the transitions have been applied regardless.
    pub fn bulk(&mut self, category: &str, command: BulkCommand) -> Result<BulkReport> {
        let report = apply_bulk(self.timers.values_mut(), category, command);
        for id in &report.changed {
            if let Some(timer) = self.timers.get(id) {
                self.scheduler.sync(id, timer.status());
            }
        }
        tracing::info!(
            category,
            ?command,
            matched = report.matched,
            changed = report.changed.len(),
            "bulk transition"
        );
        self.dispatcher.dispatch_all(&report.events);
        if !report.changed.is_empty() {
            self.persist_timers()?;
        }
        Ok(report)
    }

    /// Process one cadence firing: tick every running timer once, record
    /// completions, notify, then persist the timer set.
    pub fn fire(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if !self.scheduler.has_active() {
            return report;
        }

        let timers = &mut self.timers;
        let events = &mut report.events;
        let firing = self.scheduler.fire(|id| {
            let timer = timers.get_mut(id)?;
            events.extend(timer.tick());
            Some(timer.status())
        });

        let completions: Vec<(String, DateTime<Utc>)> = report
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Completed { name, at, .. } => Some((name.clone(), *at)),
                _ => None,
            })
            .collect();
        for (name, at) in completions {
            tracing::info!(timer = %name, "timer completed");
            match self.recorder.record(self.store.as_ref(), &name, at) {
                Ok(entry) => report.recorded.push(entry),
                Err(e) => {
                    tracing::warn!(timer = %name, error = %e, "completed but unrecorded");
                    report.warnings.push(e);
                }
            }
        }

        self.dispatcher.dispatch_all(&report.events);

        if !firing.ticked.is_empty() {
            if let Err(e) = self.persist_timers() {
                report.warnings.push(e);
            }
        }
        for warning in &report.warnings {
            let event = Event::PersistenceFailed {
                record: warning.record.to_string(),
                message: warning.source.to_string(),
            };
            self.dispatcher.dispatch(&event);
        }
        report
    }

    /// Write the whole timer set again, e.g. after a reported failure.
    ///
    /// # Errors
    /// Returns a [`PersistError`] if the write fails.
    pub fn flush(&self) -> Result<(), PersistError> {
        self.persist_timers()
    }

    /// Cancel all scheduling. Timers keep their state, so running timers
    /// resume counting the next time an engine loads the store.
    pub fn shutdown(&mut self) {
        self.scheduler.stop();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist_timers(&self) -> Result<(), PersistError> {
        save_timers(self.store.as_ref(), self.timers.values()).map_err(|e| {
            tracing::warn!(error = %e, "failed to persist timer set");
            PersistError::new(Record::Timers, e)
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("timers", &self.timers.len())
            .field("active", &self.scheduler.active_ids().len())
            .field("sinks", &self.dispatcher.sink_count())
            .finish()
    }
}
