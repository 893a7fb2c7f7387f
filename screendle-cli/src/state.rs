use anyhow::{Context, Result};
use std::path::PathBuf;

/// `$SCREENDLE_HOME`, else `~/.screendle`.
pub fn screendle_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SCREENDLE_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".screendle"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(screendle_home()?.join("config.toml"))
}

pub fn default_store_path() -> Result<PathBuf> {
    Ok(screendle_home()?.join("store.json"))
}
