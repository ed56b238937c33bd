use clap::Subcommand;
use multitimer_core::{Config, ConfigError};
use serde_json::json;

use super::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dot-path key (e.g. "engine.cadence_ms")
    Get { key: String },
    /// Validate and store one value
    Set { key: String, value: String },
    /// Print the whole configuration as JSON
    List,
    /// Overwrite the file with defaults
    Reset,
    /// Print the location of the config file
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            let stored = config.get(&key);
            print_json(&json!({ "key": key, "value": stored }))?;
        }
        ConfigAction::List => print_json(&Config::load()?)?,
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            print_json(&config)?;
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
    }
    Ok(())
}
