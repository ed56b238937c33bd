mod config;
pub mod database;
pub mod memory;
pub mod records;

pub use config::{Config, EngineConfig, NotificationsConfig, StorageConfig, TimersConfig};
pub use database::SqliteStore;
pub use memory::MemoryStore;
pub use records::{HISTORY_KEY, TIMERS_KEY};

use std::path::PathBuf;

use crate::error::StoreError;

/// Minimal key/value contract the engine persists through.
///
/// Each value is a whole serialized record; callers never update part of one.
pub trait DurableStore: Send {
    /// Read the record stored under `key`, `None` when absent.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the record stored under `key`.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the backend refuses the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: DurableStore + ?Sized> DurableStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Returns `~/.config/multitimer[-dev]/` based on MULTITIMER_ENV.
///
/// Set MULTITIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("MULTITIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("multitimer-dev")
    } else {
        base_dir.join("multitimer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
