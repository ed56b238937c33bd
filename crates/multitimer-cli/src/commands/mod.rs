pub mod category;
pub mod config;
pub mod history;
pub mod run;
pub mod timer;

use multitimer_core::{Config, Engine, LogNotifier, SqliteStore};

/// Load the configuration and an engine over the configured database.
pub fn open_engine() -> Result<(Engine, Config), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = match &config.storage.database {
        Some(path) => SqliteStore::open_at(path)?,
        None => SqliteStore::open()?,
    };
    let engine = Engine::load(store, &config).with_notifier(LogNotifier);
    Ok((engine, config))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
