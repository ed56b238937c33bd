//! In-process store for tests and throwaway runs.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::DurableStore;
use crate::error::StoreError;

/// `HashMap`-backed store. Clones share the same data.
///
/// Writes to individual keys can be made to fail, which is how callers
/// rehearse an unavailable backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to `key` fail until [`MemoryStore::restore_writes`].
    pub fn fail_writes(&self, key: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(key.to_string());
        }
    }

    pub fn restore_writes(&self, key: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(key);
        }
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let refused = self
            .failing
            .lock()
            .map(|failing| failing.contains(key))
            .unwrap_or(true);
        if refused {
            return Err(StoreError::Unavailable(format!("writes to '{key}' are disabled")));
        }
        let mut values = self
            .values
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
