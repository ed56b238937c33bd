//! # multitimer Core Library
//!
//! This library provides the core logic for running many named countdown
//! timers at once. All operations are available through the standalone CLI
//! binary; any richer front end is a thin layer over the same engine.
//!
//! ## Architecture
//!
//! - **Timer**: a per-timer countdown state machine (Paused, Running, Completed)
//!   advanced one unit per `tick()`
//! - **Tick Scheduler**: a single cadence driving every running timer
//! - **Categories**: derived grouping plus start-all / pause-all / reset-all
//! - **Notifications**: halfway and completion events relayed to subscribers
//! - **History**: append-only completion log
//! - **Storage**: key-value durable store (SQLite or in-memory) and TOML configuration
//!
//! ## Key Components
//!
//! - [`Engine`]: owns the live timers and keeps the store in sync
//! - [`runtime::spawn`]: drives an engine on a tokio task
//! - [`SqliteStore`]: durable store backend
//! - [`Config`]: application configuration management

pub mod category;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod notify;
pub mod runtime;
pub mod scheduler;
pub mod storage;
pub mod timer;

pub use category::{BulkCommand, BulkReport, CategorySummary};
pub use engine::{Engine, TickReport};
pub use error::{ConfigError, CoreError, PersistError, Record, StoreError, ValidationError};
pub use events::Event;
pub use history::{HistoryEntry, HistoryRecorder};
pub use notify::{ChannelNotifier, LogNotifier, NotificationDispatcher, Notifier};
pub use runtime::EngineHandle;
pub use scheduler::TickScheduler;
pub use storage::{Config, DurableStore, MemoryStore, SqliteStore};
pub use timer::{Timer, TimerId, TimerStatus};
