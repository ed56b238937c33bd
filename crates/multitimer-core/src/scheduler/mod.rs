//! Shared cadence driver for running timers.
//!
//! One scheduler advances every active timer by one unit per firing. It keeps
//! only ids; the timers themselves live in the [`crate::Engine`]. Membership is
//! checked at the moment a firing reaches an id, so an id deregistered before
//! that point is never ticked again.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::timer::{TimerId, TimerStatus};

/// Nominal cadence: one second per tick.
pub const DEFAULT_CADENCE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct TickScheduler {
    cadence: Duration,
    active: BTreeSet<TimerId>,
    firings: u64,
    stopped: bool,
}

/// What a single firing did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiringReport {
    /// Ids that received exactly one tick.
    pub ticked: Vec<TimerId>,
    /// Ids removed from the active set during this firing.
    pub retired: Vec<TimerId>,
}

impl TickScheduler {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            active: BTreeSet::new(),
            firings: 0,
            stopped: false,
        }
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Number of firings processed so far.
    pub fn firings(&self) -> u64 {
        self.firings
    }

    pub fn is_active(&self, id: &TimerId) -> bool {
        self.active.contains(id)
    }

    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active_ids(&self) -> Vec<TimerId> {
        self.active.iter().cloned().collect()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Add `id` to the active set. Ignored once the scheduler is stopped.
    pub fn register(&mut self, id: TimerId) -> bool {
        if self.stopped {
            return false;
        }
        self.active.insert(id)
    }

    pub fn deregister(&mut self, id: &TimerId) -> bool {
        self.active.remove(id)
    }

    /// Make membership follow a timer's status: only running timers are active.
    pub fn sync(&mut self, id: &TimerId, status: TimerStatus) {
        match status {
            TimerStatus::Running => {
                self.register(id.clone());
            }
            TimerStatus::Paused | TimerStatus::Completed => {
                self.deregister(id);
            }
        }
    }

    /// Process one cadence firing.
    ///
    /// `tick` is called once per active id and returns the timer's status after
    /// the tick, or `None` when the timer no longer exists. Ids that are no
    /// longer running afterwards leave the active set before this returns.
    pub fn fire<F>(&mut self, mut tick: F) -> FiringReport
    where
        F: FnMut(&TimerId) -> Option<TimerStatus>,
    {
        let mut report = FiringReport::default();
        if self.stopped {
            return report;
        }
        self.firings = self.firings.saturating_add(1);

        for id in self.active_ids() {
            if !self.active.contains(&id) {
                continue;
            }
            match tick(&id) {
                Some(TimerStatus::Running) => report.ticked.push(id),
                Some(_) => {
                    self.active.remove(&id);
                    report.ticked.push(id.clone());
                    report.retired.push(id);
                }
                None => {
                    self.active.remove(&id);
                    report.retired.push(id);
                }
            }
        }

        tracing::debug!(
            firing = self.firings,
            ticked = report.ticked.len(),
            retired = report.retired.len(),
            "cadence firing processed"
        );
        report
    }

    /// Drop every registration and refuse new ones.
    pub fn stop(&mut self) {
        if !self.active.is_empty() {
            tracing::info!(cancelled = self.active.len(), "tick scheduler stopped");
        }
        self.active.clear();
        self.stopped = true;
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CADENCE)
    }
}
