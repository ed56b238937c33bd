//! Core error types for multitimer-core.
//!
//! Invalid timer transitions are not errors (they are silent no-ops on the
//! state machine), so everything here describes storage, configuration and
//! authoring failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::TimerId;

/// Core error type for multitimer-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Durable store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A persisted record could not be written after an in-memory transition
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors raised while authoring timers
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No timer with the given id exists in the live set
    #[error("Timer not found: {0}")]
    TimerNotFound(TimerId),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors raised by a [`crate::storage::DurableStore`] backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// The store refused the operation (offline, poisoned, injected failure)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A record could not be encoded for writing
    #[error("Failed to encode record: {0}")]
    Encode(String),
}

/// The two records the engine keeps in the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Timers,
    History,
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Record::Timers => f.write_str("timer set"),
            Record::History => f.write_str("history"),
        }
    }
}

/// A write that failed after the in-memory transition already happened.
///
/// Memory stays authoritative; callers may retry the write.
#[derive(Error, Debug)]
#[error("Failed to persist {record}: {source}")]
pub struct PersistError {
    pub record: Record,
    #[source]
    pub source: StoreError,
}

impl PersistError {
    pub fn new(record: Record, source: StoreError) -> Self {
        Self { record, source }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field was blank
    #[error("'{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// Durations are whole positive seconds
    #[error("Duration must be a positive number of seconds")]
    ZeroDuration,

    /// Authoring rejects durations at or below the configured minimum
    #[error("Duration must be more than {min} seconds (got {duration})")]
    DurationTooShort { duration: u64, min: u64 },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
