//! Notification relay between timer transitions and front ends.
//!
//! The dispatcher keeps no history of what it sent. Duplicate suppression is
//! the timer's job (`halfwayTriggered`, terminal `Completed`), so every event
//! handed in is forwarded to every sink exactly once.

use tokio::sync::broadcast;

use crate::events::Event;
use crate::storage::NotificationsConfig;

/// A consumer of engine events.
pub trait Notifier: Send {
    fn notify(&self, event: &Event);
}

impl<F> Notifier for F
where
    F: Fn(&Event) + Send,
{
    fn notify(&self, event: &Event) {
        self(event)
    }
}

/// Writes halfway and completion events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &Event) {
        match event {
            Event::HalfwayReached {
                name, half_seconds, ..
            } => tracing::info!(timer = %name, half_seconds, "halfway reached"),
            Event::Completed { name, at, .. } => {
                tracing::info!(timer = %name, completed_at = %at, "timer completed")
            }
            Event::PersistenceFailed { record, message } => {
                tracing::warn!(%record, %message, "persistence failed")
            }
            Event::TimerUpdated { .. } => {}
        }
    }
}

/// Fans events out to any number of async subscribers.
///
/// Sending with no live receivers is not an error.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<Event>,
}

impl ChannelNotifier {
    pub fn new(tx: broadcast::Sender<Event>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: &Event) {
        let _ = self.tx.send(event.clone());
    }
}

/// Forwards events to every registered sink.
pub struct NotificationDispatcher {
    sinks: Vec<Box<dyn Notifier>>,
    halfway: bool,
    completion: bool,
}

impl NotificationDispatcher {
    pub fn new(config: &NotificationsConfig) -> Self {
        Self {
            sinks: Vec::new(),
            halfway: config.halfway,
            completion: config.completion,
        }
    }

    pub fn add_sink(&mut self, sink: impl Notifier + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    fn enabled(&self, event: &Event) -> bool {
        match event {
            Event::HalfwayReached { .. } => self.halfway,
            Event::Completed { .. } => self.completion,
            Event::TimerUpdated { .. } | Event::PersistenceFailed { .. } => true,
        }
    }

    pub fn dispatch(&self, event: &Event) {
        if !self.enabled(event) {
            return;
        }
        for sink in &self.sinks {
            sink.notify(event);
        }
    }

    pub fn dispatch_all<'a>(&self, events: impl IntoIterator<Item = &'a Event>) {
        for event in events {
            self.dispatch(event);
        }
    }
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new(&NotificationsConfig::default())
    }
}
