mod countdown;

pub use countdown::{Timer, TimerId, TimerStatus, NEAR_END_SECS};
