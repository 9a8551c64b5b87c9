//! Configuration commands.

use std::path::Path;

use learnslot_core::SESSION_DURATIONS;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the effective configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;
    println!("Configuration is valid.");
    if let Some(note) = duration_note(config) {
        println!("note: {}", note);
    }
    println!("store: {}", config.store_path().display());
    Ok(())
}

/// Notes a session length outside the offered ones. Any positive length
/// works, so this is not an error.
fn duration_note(config: &ClientConfig) -> Option<String> {
    let minutes = config.preferences.duration_minutes;
    if SESSION_DURATIONS.contains(&minutes) {
        return None;
    }
    let offered: Vec<_> = SESSION_DURATIONS.iter().map(i64::to_string).collect();
    Some(format!(
        "duration_minutes = {} is not one of the offered lengths ({})",
        minutes,
        offered.join(", ")
    ))
}

/// Show the configuration and store paths.
pub fn path(config_path: &Path, config: &ClientConfig) -> ClientResult<()> {
    println!("config: {}", config_path.display());
    println!("store: {}", config.store_path().display());
    Ok(())
}
