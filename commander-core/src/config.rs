//! ``src/config.rs``
//! ============================================================================
//! # Config: Engine Configuration Loader and Saver
//!
//! Loads and saves the engine settings as TOML from the platform config
//! directory resolved by [`directories`](https://docs.rs/directories).
//! A missing file yields defaults, which are written back so users have
//! something to edit.
//!
//! ## Example
//! ```rust,ignore
//! let config = Config::load()?;
//! config.save()?;
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::logging::LoggerConfig;
use crate::model::panel_state::PanelOptions;
use crate::tasks::task_queue::DrainMode;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "commander";
const APPLICATION: &str = "Commander";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub show_hidden: bool,

    /// Background threads for size and statistics work.
    pub worker_threads: usize,

    pub drain_mode: DrainMode,

    /// Minimum time between two volume rescans driven by `tick`.
    #[serde(with = "humantime_serde")]
    pub volume_poll_interval: Duration,

    /// Back stack depth per pane.
    pub history_limit: usize,

    /// Terminal program override; platform default when unset.
    pub terminal_cmd: Option<String>,

    pub logging: LoggerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_hidden: false,
            worker_threads: 4,
            drain_mode: DrainMode::FirstBatch,
            volume_poll_interval: Duration::from_secs(2),
            history_limit: 256,
            terminal_cmd: None,
            logging: LoggerConfig::default(),
        }
    }
}

impl Config {
    /// Loads config from `config.toml` in the platform config dir, or
    /// writes and returns defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path: PathBuf = Self::config_path()?;

        if path.exists() {
            info!("Loading config from {}", path.display());
            let text: String = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            Self::from_toml_str(&text)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config: Self = Self::default();
            default_config.save()?;

            Ok(default_config)
        }
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let cfg: Self = toml::from_str(text).context("Invalid config TOML")?;
        Ok(cfg)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path: PathBuf = Self::config_path()?;

        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str: String = toml::to_string_pretty(self)?;
        fs::write(&path, toml_str)?;

        Ok(())
    }

    /// Per-pane options derived from this config.
    #[must_use]
    pub const fn panel_options(&self) -> PanelOptions {
        PanelOptions {
            show_hidden: self.show_hidden,
            history_limit: self.history_limit,
        }
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let proj_dirs: ProjectDirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;

        Ok(proj_dirs.config_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            show_hidden = true
            volume_poll_interval = "500ms"
            drain_mode = "to_empty"
            "#,
        )
        .unwrap();

        assert!(cfg.show_hidden);
        assert_eq!(cfg.volume_poll_interval, Duration::from_millis(500));
        assert_eq!(cfg.drain_mode, DrainMode::ToEmpty);
        assert_eq!(cfg.worker_threads, 4);
        assert_eq!(cfg.history_limit, 256);
        assert_eq!(cfg.terminal_cmd, None);
    }

    #[test]
    fn defaults_survive_a_save_cycle() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), Config::default());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::from_toml_str("worker_threads = \"many\"").is_err());
    }
}
