//! JSON encoding of the two persisted records.
//!
//! A record is always read and written whole. Unparseable records degrade to
//! an empty list so a corrupt store never prevents the engine from loading.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::DurableStore;
use crate::error::StoreError;
use crate::timer::Timer;

/// Key of the live timer set.
pub const TIMERS_KEY: &str = "timers";
/// Key of the append-only completion history.
pub const HISTORY_KEY: &str = "completedTimers";

/// Read a list record, surfacing store failures but not parse failures.
///
/// # Errors
/// Returns the [`StoreError`] raised by the backend's `get`.
pub fn try_read_list<T: DeserializeOwned>(
    store: &dyn DurableStore,
    key: &str,
) -> Result<Vec<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => Ok(items),
        Err(e) => {
            tracing::warn!(key, error = %e, "malformed record, treating as empty");
            Ok(Vec::new())
        }
    }
}

/// Read a list record; any failure yields an empty list.
pub fn read_list<T: DeserializeOwned>(store: &dyn DurableStore, key: &str) -> Vec<T> {
    try_read_list(store, key).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "store read failed, treating record as empty");
        Vec::new()
    })
}

/// Replace a list record.
///
/// # Errors
/// Returns a [`StoreError`] if encoding or the backend write fails.
pub fn write_list<T: Serialize>(
    store: &dyn DurableStore,
    key: &str,
    items: &[T],
) -> Result<(), StoreError> {
    let json = serde_json::to_string(items).map_err(|e| StoreError::Encode(e.to_string()))?;
    store.set(key, &json)
}

/// Load the timer set, repairing or dropping records that break invariants.
pub fn load_timers(store: &dyn DurableStore) -> Vec<Timer> {
    let raw: Vec<serde_json::Value> = read_list(store, TIMERS_KEY);
    let mut timers: Vec<Timer> = Vec::with_capacity(raw.len());
    for value in raw {
        let parsed = serde_json::from_value::<Timer>(value)
            .ok()
            .and_then(Timer::sanitize);
        match parsed {
            Some(timer) if timers.iter().all(|t| t.id() != timer.id()) => timers.push(timer),
            Some(timer) => tracing::warn!(id = %timer.id(), "duplicate timer id dropped"),
            None => tracing::warn!("unreadable timer record dropped"),
        }
    }
    timers
}

/// Persist the whole timer set.
///
/// # Errors
/// Returns a [`StoreError`] if the write fails.
pub fn save_timers<'a, I>(store: &dyn DurableStore, timers: I) -> Result<(), StoreError>
where
    I: IntoIterator<Item = &'a Timer>,
{
    let timers: Vec<&Timer> = timers.into_iter().collect();
    write_list(store, TIMERS_KEY, &timers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::timer::{TimerId, TimerStatus};

    #[test]
    fn missing_record_is_empty() {
        let store = MemoryStore::new();
        assert!(load_timers(&store).is_empty());
    }

    #[test]
    fn malformed_record_is_empty() {
        let store = MemoryStore::new();
        store.set(TIMERS_KEY, "{not json").unwrap();
        assert!(load_timers(&store).is_empty());
        store.set(TIMERS_KEY, r#"{"id":"x"}"#).unwrap();
        assert!(load_timers(&store).is_empty());
    }

    #[test]
    fn bad_entries_are_dropped_individually() {
        let store = MemoryStore::new();
        store
            .set(
                TIMERS_KEY,
                r#"[
                    {"id":"a","name":"Run","category":"Workout","duration":30,"remaining":12,"status":"Running"},
                    {"id":"b","name":"Broken"},
                    {"id":"a","name":"Dup","category":"Workout","duration":30,"remaining":30,"status":"Paused"}
                ]"#,
            )
            .unwrap();
        let timers = load_timers(&store);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].id(), &TimerId::from("a"));
        assert_eq!(timers[0].status(), TimerStatus::Running);
        assert_eq!(timers[0].remaining(), 12);
    }

    #[test]
    fn reads_records_without_halfway_flag() {
        let store = MemoryStore::new();
        store
            .set(
                TIMERS_KEY,
                r#"[{"id":"1700000000000","name":"Read","duration":60,"category":"Study","remaining":60,"status":"Paused","startTime":null}]"#,
            )
            .unwrap();
        let timers = load_timers(&store);
        assert_eq!(timers.len(), 1);
        assert!(!timers[0].halfway_triggered());
    }

    #[test]
    fn save_then_load_is_identical() {
        let store = MemoryStore::new();
        let mut a = Timer::new("Run", "Workout", 30).unwrap();
        a.start();
        a.tick();
        let b = Timer::new("Read", "Study", 60).unwrap();
        let timers = vec![a, b];
        save_timers(&store, &timers).unwrap();
        assert_eq!(load_timers(&store), timers);
    }
}
