use anyhow::{Context, Result};
use screendle_core::SaltTable;
use screendle_core::reconcile::{DEFAULT_HORIZON_DAYS, DEFAULT_LOOKBACK_DAYS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{default_config_path, default_store_path};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleSection,
    pub salts: SaltTable,
    pub store: StoreSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// Days ahead to schedule.
    pub days: u32,
    /// Classic repeat-avoidance window in days.
    pub lookback: u32,
    /// IANA zone deciding which day is "today".
    pub timezone: String,
    /// Abort when more Classic days than this run out of fresh movies.
    pub max_exhausted_days: Option<usize>,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            days: DEFAULT_HORIZON_DAYS,
            lookback: DEFAULT_LOOKBACK_DAYS,
            timezone: "UTC".to_string(),
            max_exhausted_days: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(p) => Ok(p.clone()),
            None => default_store_path(),
        }
    }
}

fn resolve(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

/// Load the config, falling back to defaults when the file does not exist.
/// Salts are validated here so a bad file fails before any scheduling.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = resolve(path)?;
    let cfg = if p.exists() {
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?
    } else {
        Config::default()
    };
    cfg.salts.validate().context("invalid [salts] in config")?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf> {
    let p = resolve(path)?;
    if let Some(dir) = p.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = resolve(path)?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let written = save_config(&Config::default(), path)?;
    println!("Wrote {}", written.display());
    Ok(())
}
