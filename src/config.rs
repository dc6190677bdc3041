//! Configuration loading: defaults, an optional YAML file, then environment
//! overrides. CLI flags are applied on top by the caller.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE: &str = "data/board.db";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Port the HTTP server binds.
    pub port: u16,
    /// Path to the SQLite database file.
    pub database: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database: PathBuf::from(DEFAULT_DATABASE),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then the first config file found, then
    /// environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::discover(explicit)? {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_yaml::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Locate the config file: explicit path, `./task-board.yaml`, then
    /// `~/.task-board/config.yaml`.
    fn discover(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            return Ok(Some(path.to_path_buf()));
        }

        let local = PathBuf::from("task-board.yaml");
        if local.exists() {
            return Ok(Some(local));
        }

        if let Some(home) = dirs::home_dir() {
            let user = home.join(".task-board").join("config.yaml");
            if user.exists() {
                return Ok(Some(user));
            }
        }

        Ok(None)
    }

    /// Apply `TASK_BOARD_PORT` / `TASK_BOARD_DATABASE` overrides.
    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var("TASK_BOARD_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("ignoring unparsable TASK_BOARD_PORT: {port}"),
            }
        }
        if let Ok(database) = std::env::var("TASK_BOARD_DATABASE") {
            if !database.is_empty() {
                self.database = PathBuf::from(database);
            }
        }
    }
}
