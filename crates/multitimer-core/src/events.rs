use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimerId, TimerStatus};

/// Every state change of a timer produces an Event.
/// Front ends subscribe to them; the engine never waits on acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Snapshot of a timer after any transition, including plain ticks.
    TimerUpdated {
        id: TimerId,
        remaining: u64,
        status: TimerStatus,
    },
    /// Remaining time just reached half the duration.
    HalfwayReached {
        id: TimerId,
        name: String,
        #[serde(rename = "halfSeconds")]
        half_seconds: u64,
    },
    /// Terminal transition; `at` is the completion timestamp recorded in history.
    Completed {
        id: TimerId,
        name: String,
        at: DateTime<Utc>,
    },
    /// A transition happened in memory but its record could not be written.
    PersistenceFailed {
        record: String,
        message: String,
    },
}

impl Event {
    /// Id of the timer the event is about, if any.
    pub fn timer_id(&self) -> Option<&TimerId> {
        match self {
            Event::TimerUpdated { id, .. }
            | Event::HalfwayReached { id, .. }
            | Event::Completed { id, .. } => Some(id),
            Event::PersistenceFailed { .. } => None,
        }
    }
}
