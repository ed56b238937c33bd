//! Async driver for an [`Engine`].
//!
//! One tokio task owns the engine. Commands from any number of
//! [`EngineHandle`]s and the cadence interval are serialized onto that task,
//! so timer state is never mutated in parallel. A command is answered only
//! after its transition has been persisted, and a pause answered to the caller
//! is never followed by another tick of that timer.
//!
//! The interval exists only while some timer is running; it is rebuilt when
//! the first timer starts so that timer's first tick lands a full cadence later.
//! Timers started while the interval exists share its phase.

use std::future;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::category::BulkReport;
use crate::engine::Engine;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::history::HistoryEntry;
use crate::notify::ChannelNotifier;
use crate::timer::{Timer, TimerId};

const EVENT_BUFFER: usize = 256;
const COMMAND_BUFFER: usize = 64;

type Job = Box<dyn FnOnce(&mut Engine) + Send>;

/// Cloneable access to an engine running on its own task.
#[derive(Clone)]
pub struct EngineHandle {
    jobs: mpsc::Sender<Job>,
    events: broadcast::Sender<Event>,
    cancel: CancellationToken,
}

/// Move `engine` onto a new task and start driving it.
///
/// The task ends when `cancel` fires, [`EngineHandle::shutdown`] is called, or
/// every handle is dropped; it hands the engine back with scheduling stopped.
pub fn spawn(mut engine: Engine, cancel: CancellationToken) -> (EngineHandle, JoinHandle<Engine>) {
    let (events, _) = broadcast::channel(EVENT_BUFFER);
    engine.add_notifier(ChannelNotifier::new(events.clone()));
    let (jobs, rx) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(drive(engine, rx, cancel.clone()));
    (
        EngineHandle {
            jobs,
            events,
            cancel,
        },
        task,
    )
}

async fn drive(mut engine: Engine, mut jobs: mpsc::Receiver<Job>, cancel: CancellationToken) -> Engine {
    let cadence = engine.scheduler().cadence();
    let mut ticker: Option<Interval> = None;

    loop {
        if !engine.has_active() {
            ticker = None;
        } else if ticker.is_none() {
            ticker = Some(new_ticker(cadence));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            job = jobs.recv() => match job {
                Some(job) => job(&mut engine),
                None => break,
            },
            _ = next_tick(&mut ticker) => {
                let report = engine.fire();
                if !report.warnings.is_empty() {
                    tracing::warn!(failures = report.warnings.len(), "tick persisted with failures");
                }
            }
        }
    }

    engine.shutdown();
    tracing::info!("engine task stopped");
    engine
}

fn new_ticker(cadence: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + cadence, cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

impl EngineHandle {
    /// Run `f` on the engine task and return its result.
    ///
    /// # Errors
    /// Returns [`CoreError::Custom`] if the engine task has stopped.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Engine) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: Job = Box::new(move |engine| {
            let _ = reply.send(f(engine));
        });
        self.jobs
            .send(job)
            .await
            .map_err(|_| CoreError::Custom("engine task has stopped".into()))?;
        rx.await
            .map_err(|_| CoreError::Custom("engine task has stopped".into()))
    }

    /// Receive every event dispatched from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn add_timer(&self, name: String, category: Option<String>, duration: u64) -> Result<TimerId> {
        self.call(move |e| e.add_timer(&name, category.as_deref(), duration))
            .await?
    }

    pub async fn start(&self, id: TimerId) -> Result<Option<Event>> {
        self.call(move |e| e.start(&id)).await?
    }

    pub async fn pause(&self, id: TimerId) -> Result<Option<Event>> {
        self.call(move |e| e.pause(&id)).await?
    }

    pub async fn reset(&self, id: TimerId) -> Result<Event> {
        self.call(move |e| e.reset(&id)).await?
    }

    pub async fn start_all(&self, category: String) -> Result<BulkReport> {
        self.call(move |e| e.start_all(&category)).await?
    }

    pub async fn pause_all(&self, category: String) -> Result<BulkReport> {
        self.call(move |e| e.pause_all(&category)).await?
    }

    pub async fn reset_all(&self, category: String) -> Result<BulkReport> {
        self.call(move |e| e.reset_all(&category)).await?
    }

    /// Copy of the live timer set.
    pub async fn timers(&self) -> Result<Vec<Timer>> {
        self.call(|e| e.timers().cloned().collect()).await
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        self.call(|e| e.history()).await
    }

    pub async fn has_active(&self) -> Result<bool> {
        self.call(|e| e.has_active()).await
    }

    /// Stop the engine task; outstanding cadence callbacks are dropped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Config, MemoryStore};
    use crate::timer::TimerStatus;

    fn spawn_engine() -> (EngineHandle, JoinHandle<Engine>) {
        let engine = Engine::load(MemoryStore::new(), &Config::default());
        spawn(engine, CancellationToken::new())
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_to_completion() {
        let (handle, task) = spawn_engine();
        let mut events = handle.subscribe();
        let id = handle.add_timer("Plank".into(), None, 12).await.unwrap();
        handle.start(id.clone()).await.unwrap();

        time::sleep(Duration::from_millis(12_500)).await;

        let timers = handle.timers().await.unwrap();
        assert_eq!(timers[0].status(), TimerStatus::Completed);
        assert_eq!(timers[0].remaining(), 0);
        let history = handle.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "Plank");

        let mut halfway = 0;
        let mut completed = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                Event::HalfwayReached { half_seconds, .. } => {
                    assert_eq!(half_seconds, 6);
                    halfway += 1;
                }
                Event::Completed { .. } => completed += 1,
                _ => {}
            }
        }
        assert_eq!((halfway, completed), (1, 1));

        handle.shutdown();
        let engine = task.await.unwrap();
        assert!(engine.scheduler().is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticks_immediately() {
        let (handle, _task) = spawn_engine();
        let id = handle.add_timer("Read".into(), Some("Study".into()), 60).await.unwrap();
        handle.start(id.clone()).await.unwrap();
        time::sleep(Duration::from_millis(3_500)).await;
        handle.pause(id.clone()).await.unwrap();

        let paused_at = handle.timers().await.unwrap()[0].remaining();
        assert_eq!(paused_at, 57);
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(handle.timers().await.unwrap()[0].remaining(), paused_at);
        assert!(!handle.has_active().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn independent_timers_do_not_interfere() {
        let (handle, _task) = spawn_engine();
        let a = handle.add_timer("A".into(), None, 11).await.unwrap();
        let b = handle.add_timer("B".into(), None, 20).await.unwrap();
        handle.start_all("Workout".into()).await.unwrap();

        time::sleep(Duration::from_millis(4_500)).await;
        handle.pause(b.clone()).await.unwrap();
        time::sleep(Duration::from_secs(3)).await;

        let timers = handle.timers().await.unwrap();
        let find = |id: &TimerId| timers.iter().find(|t| t.id() == id).unwrap();
        assert_eq!(find(&a).remaining(), 4);
        assert_eq!(find(&b).remaining(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn late_starter_joins_the_running_cadence() {
        let (handle, _task) = spawn_engine();
        let a = handle.add_timer("A".into(), None, 30).await.unwrap();
        let b = handle.add_timer("B".into(), None, 30).await.unwrap();
        handle.start(a.clone()).await.unwrap();
        time::sleep(Duration::from_millis(700)).await;
        handle.start(b.clone()).await.unwrap();
        time::sleep(Duration::from_millis(500)).await;

        let timers = handle.timers().await.unwrap();
        let find = |id: &TimerId| timers.iter().find(|t| t.id() == id).unwrap();
        assert_eq!(find(&a).remaining(), 29);
        assert_eq!(find(&b).remaining(), 29);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_the_task() {
        let cancel = CancellationToken::new();
        let engine = Engine::load(MemoryStore::new(), &Config::default());
        let (handle, task) = spawn(engine, cancel.clone());
        let id = handle.add_timer("Run".into(), None, 30).await.unwrap();
        handle.start(id).await.unwrap();
        cancel.cancel();
        let engine = task.await.unwrap();
        assert!(!engine.has_active());
        assert!(handle.timers().await.is_err());
    }
}
