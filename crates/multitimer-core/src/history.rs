//! Completion history.
//!
//! The history record is an append-only list owned by [`HistoryRecorder`].
//! Entries copy the timer name at completion time, so renaming or deleting the
//! timer later never changes what was recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Record};
use crate::storage::records::{read_list, try_read_list, write_list};
use crate::storage::{DurableStore, HISTORY_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub name: String,
    /// ISO-8601 completion timestamp.
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryRecorder;

impl HistoryRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Append one entry with a read-modify-write of the whole history record.
    ///
    /// # Errors
    /// Returns a [`PersistError`] if the current record cannot be read or the
    /// updated one cannot be written. An unparseable record is replaced.
    pub fn record(
        &self,
        store: &dyn DurableStore,
        name: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<HistoryEntry, PersistError> {
        let entry = HistoryEntry {
            name: name.to_string(),
            completed_at,
        };
        let mut history: Vec<HistoryEntry> = try_read_list(store, HISTORY_KEY)
            .map_err(|e| PersistError::new(Record::History, e))?;
        history.push(entry.clone());
        write_list(store, HISTORY_KEY, &history)
            .map_err(|e| PersistError::new(Record::History, e))?;
        tracing::debug!(timer = %name, entries = history.len(), "history entry appended");
        Ok(entry)
    }

    /// All recorded completions, oldest first.
    pub fn entries(&self, store: &dyn DurableStore) -> Vec<HistoryEntry> {
        read_list(store, HISTORY_KEY)
    }
}
