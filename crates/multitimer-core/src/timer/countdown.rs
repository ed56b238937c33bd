//! Countdown timer state machine.
//!
//! A timer does not own a clock. Whoever drives it (normally the
//! [`crate::scheduler::TickScheduler`] through the [`crate::Engine`]) calls
//! `tick()` once per cadence unit while the timer is running.
//!
//! ## State Transitions
//!
//! ```text
//! Paused <-> Running -> Completed
//!    ^__________________|  (reset)
//! ```
//!
//! Every command is total: calling it in a state where it does not apply
//! returns no events and leaves the timer untouched.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::Event;

/// Remaining seconds at or below which a running timer counts as near its end.
pub const NEAR_END_SECS: u64 = 10;

/// Opaque timer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TimerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TimerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerStatus {
    Paused,
    Running,
    /// Terminal until the next reset.
    Completed,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerStatus::Paused => "Paused",
            TimerStatus::Running => "Running",
            TimerStatus::Completed => "Completed",
        };
        f.write_str(s)
    }
}

/// A single named countdown.
///
/// Serialized in camelCase so stored records read
/// `{"id", "name", "category", "duration", "remaining", "status", "halfwayTriggered"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    id: TimerId,
    name: String,
    category: String,
    /// Total seconds; never changes after creation.
    duration: u64,
    remaining: u64,
    status: TimerStatus,
    #[serde(default)]
    halfway_triggered: bool,
}

impl Timer {
    /// Create a paused timer with a fresh id and the full duration remaining.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for a blank name or category, or a zero duration.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        duration: u64,
    ) -> Result<Self, ValidationError> {
        Self::with_id(TimerId::generate(), name, category, duration)
    }

    /// Like [`Timer::new`] with a caller-chosen id.
    ///
    /// # Errors
    /// Same as [`Timer::new`].
    pub fn with_id(
        id: TimerId,
        name: impl Into<String>,
        category: impl Into<String>,
        duration: u64,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        let category = category.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" });
        }
        if category.is_empty() {
            return Err(ValidationError::EmptyField { field: "category" });
        }
        if duration == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        Ok(Self {
            id,
            name,
            category,
            duration,
            remaining: duration,
            status: TimerStatus::Paused,
            halfway_triggered: false,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> &TimerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn halfway_triggered(&self) -> bool {
        self.halfway_triggered
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Remaining value at which the halfway alert fires.
    pub fn halfway_mark(&self) -> u64 {
        self.duration / 2
    }

    /// Fraction of the duration still remaining: 1.0 when fresh, 0.0 when done.
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        self.remaining as f64 / self.duration as f64
    }

    pub fn is_near_end(&self) -> bool {
        self.is_running() && self.remaining <= NEAR_END_SECS
    }

    /// Observable snapshot of the timer.
    pub fn snapshot(&self) -> Event {
        Event::TimerUpdated {
            id: self.id.clone(),
            remaining: self.remaining,
            status: self.status,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.status {
            TimerStatus::Paused => {
                self.status = TimerStatus::Running;
                Some(self.snapshot())
            }
            // Running: already counting. Completed: only a reset revives it.
            TimerStatus::Running | TimerStatus::Completed => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.status {
            TimerStatus::Running => {
                self.status = TimerStatus::Paused;
                Some(self.snapshot())
            }
            _ => None,
        }
    }

    /// Valid from every state.
    pub fn reset(&mut self) -> Event {
        self.remaining = self.duration;
        self.status = TimerStatus::Paused;
        self.halfway_triggered = false;
        self.snapshot()
    }

    /// Advance by one cadence unit.
    ///
    /// Returns the snapshot followed by any halfway or completion event, or
    /// nothing at all when the timer is not running.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.status != TimerStatus::Running {
            return Vec::new();
        }

        if self.remaining <= 1 {
            self.remaining = 0;
            self.status = TimerStatus::Completed;
            return vec![
                self.snapshot(),
                Event::Completed {
                    id: self.id.clone(),
                    name: self.name.clone(),
                    at: Utc::now(),
                },
            ];
        }

        self.remaining -= 1;
        let mut events = vec![self.snapshot()];
        if !self.halfway_triggered && self.remaining == self.halfway_mark() {
            self.halfway_triggered = true;
            events.push(Event::HalfwayReached {
                id: self.id.clone(),
                name: self.name.clone(),
                half_seconds: self.remaining,
            });
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Repair a record read back from storage so the invariants hold again.
    ///
    /// Returns `None` for records that cannot describe a timer at all.
    pub(crate) fn sanitize(mut self) -> Option<Self> {
        if self.duration == 0 || self.name.trim().is_empty() || self.category.trim().is_empty() {
            return None;
        }
        self.remaining = self.remaining.min(self.duration);
        if self.status == TimerStatus::Completed || self.remaining == 0 {
            self.status = TimerStatus::Completed;
            self.remaining = 0;
        }
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(duration: u64) -> Timer {
        Timer::with_id(TimerId::from("t"), "Plank", "Workout", duration).unwrap()
    }

    #[test]
    fn new_timer_is_paused_and_full() {
        let t = timer(30);
        assert_eq!(t.status(), TimerStatus::Paused);
        assert_eq!(t.remaining(), 30);
        assert!(!t.halfway_triggered());
    }

    #[test]
    fn rejects_blank_fields_and_zero_duration() {
        assert_eq!(
            Timer::new("  ", "Study", 30).unwrap_err(),
            ValidationError::EmptyField { field: "name" }
        );
        assert_eq!(
            Timer::new("Read", "", 30).unwrap_err(),
            ValidationError::EmptyField { field: "category" }
        );
        assert_eq!(Timer::new("Read", "Study", 0).unwrap_err(), ValidationError::ZeroDuration);
    }

    #[test]
    fn start_pause_start() {
        let mut t = timer(30);
        assert!(t.start().is_some());
        assert_eq!(t.status(), TimerStatus::Running);
        assert!(t.start().is_none());

        t.tick();
        assert!(t.pause().is_some());
        assert_eq!(t.status(), TimerStatus::Paused);
        assert_eq!(t.remaining(), 29);
        assert!(t.pause().is_none());
    }

    #[test]
    fn tick_on_paused_timer_is_noop() {
        let mut t = timer(30);
        assert!(t.tick().is_empty());
        assert_eq!(t.remaining(), 30);
    }

    #[test]
    fn halfway_fires_once_at_post_decrement_mark() {
        let mut t = timer(20);
        t.start();
        let mut halfway_at = Vec::new();
        for _ in 0..19 {
            let before = t.remaining();
            let events = t.tick();
            if events.iter().any(|e| matches!(e, Event::HalfwayReached { .. })) {
                halfway_at.push((before, t.remaining()));
            }
        }
        assert_eq!(halfway_at, vec![(11, 10)]);
        assert!(t.halfway_triggered());
    }

    #[test]
    fn halfway_uses_floor_for_odd_durations() {
        let mut t = timer(21);
        t.start();
        let mut fired = 0;
        while t.remaining() > 10 {
            fired += t
                .tick()
                .iter()
                .filter(|e| matches!(e, Event::HalfwayReached { half_seconds: 10, .. }))
                .count();
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn halfway_does_not_refire_after_pause_and_resume() {
        let mut t = timer(20);
        t.start();
        for _ in 0..10 {
            t.tick();
        }
        assert!(t.halfway_triggered());
        t.pause();
        t.start();
        let events: Vec<Event> = (0..9).flat_map(|_| t.tick()).collect();
        assert!(!events.iter().any(|e| matches!(e, Event::HalfwayReached { .. })));
    }

    #[test]
    fn final_tick_completes() {
        let mut t = timer(5);
        t.start();
        for _ in 0..4 {
            t.tick();
        }
        let events = t.tick();
        assert_eq!(t.remaining(), 0);
        assert_eq!(t.status(), TimerStatus::Completed);
        assert!(matches!(
            events.last(),
            Some(Event::Completed { name, .. }) if name == "Plank"
        ));
        assert!(t.tick().is_empty());
        assert!(t.start().is_none());
        assert_eq!(t.status(), TimerStatus::Completed);
    }

    #[test]
    fn reset_restores_from_any_state() {
        let mut t = timer(20);
        t.start();
        for _ in 0..20 {
            t.tick();
        }
        assert_eq!(t.status(), TimerStatus::Completed);
        t.reset();
        assert_eq!(t.remaining(), 20);
        assert_eq!(t.status(), TimerStatus::Paused);
        assert!(!t.halfway_triggered());
        assert_eq!(t.duration(), 20);
    }

    #[test]
    fn progress_and_near_end() {
        let mut t = timer(20);
        assert_eq!(t.progress(), 1.0);
        t.start();
        for _ in 0..5 {
            t.tick();
        }
        assert!((t.progress() - 0.75).abs() < f64::EPSILON);
        for _ in 0..5 {
            t.tick();
        }
        assert!((t.progress() - 0.5).abs() < f64::EPSILON);
        assert!(t.is_near_end());
        t.pause();
        assert!(!t.is_near_end());
    }

    #[test]
    fn sanitize_repairs_out_of_range_records() {
        let json = r#"{"id":"x","name":"Run","category":"Workout","duration":30,"remaining":99,"status":"Running"}"#;
        let t: Timer = serde_json::from_str(json).unwrap();
        let t = t.sanitize().unwrap();
        assert_eq!(t.remaining(), 30);
        assert!(!t.halfway_triggered());

        let json = r#"{"id":"x","name":"Run","category":"Workout","duration":30,"remaining":0,"status":"Paused"}"#;
        let t: Timer = serde_json::from_str(json).unwrap();
        assert_eq!(t.sanitize().unwrap().status(), TimerStatus::Completed);

        let json = r#"{"id":"x","name":"Run","category":"Workout","duration":0,"remaining":0,"status":"Paused"}"#;
        let t: Timer = serde_json::from_str(json).unwrap();
        assert!(t.sanitize().is_none());
    }

    #[test]
    fn serializes_camel_case_fields() {
        let json = serde_json::to_value(timer(30)).unwrap();
        assert_eq!(json["status"], "Paused");
        assert_eq!(json["halfwayTriggered"], false);
        assert_eq!(json["remaining"], 30);
    }
}
