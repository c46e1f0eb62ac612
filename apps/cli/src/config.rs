//! CLI configuration.
//!
//! Configuration is stored as TOML:
//! - Linux and macOS: `$XDG_CONFIG_HOME/snaptrack/config.toml`, falling
//!   back to `~/.config/snaptrack/config.toml`
//! - Windows: `%APPDATA%/snaptrack/config.toml`
//!
//! `SNAPTRACK_API_BASE`, `SNAPTRACK_WS_URL` and `SNAPTRACK_LOG_LEVEL`
//! override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use snaptrack_tracker::{PollPolicy, TrackerConfig};

pub const ENV_API_BASE: &str = "SNAPTRACK_API_BASE";
pub const ENV_WS_URL: &str = "SNAPTRACK_WS_URL";
pub const ENV_LOG_LEVEL: &str = "SNAPTRACK_LOG_LEVEL";

const APP_DIR: &str = "snaptrack";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the REST API.
    #[serde(default)]
    pub api_base: String,

    /// Base URL of the push channel. Empty disables push.
    #[serde(default)]
    pub ws_url: String,

    /// Status poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up after this many status checks (unset or 0 = never).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_poll_attempts: Option<u32>,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Token store location (defaults next to the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,
}

fn default_poll_interval_ms() -> u64 {
    1200
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            ws_url: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: None,
            log_level: default_log_level(),
            token_file: None,
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Applies environment overrides, looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup(ENV_API_BASE) {
            self.api_base = v;
        }
        if let Some(v) = lookup(ENV_WS_URL) {
            self.ws_url = v;
        }
        if let Some(v) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            self.log_level = v;
        }
    }

    /// The API base, or an error explaining how to set it.
    pub fn require_api_base(&self) -> anyhow::Result<&str> {
        let base = self.api_base.trim();
        if base.is_empty() {
            bail!("no API base configured: set `api_base` in the config file or {ENV_API_BASE}");
        }
        Ok(base)
    }

    /// Where tokens are stored.
    pub fn token_path(&self) -> Option<PathBuf> {
        self.token_file
            .clone()
            .or_else(|| app_dir().map(|d| d.join("tokens.json")))
    }

    /// Session settings for the tracker.
    pub fn tracker_config(&self) -> TrackerConfig {
        let ws_url = self.ws_url.trim();
        TrackerConfig {
            push_base: (!ws_url.is_empty()).then(|| ws_url.to_string()),
            poll: PollPolicy {
                interval: Duration::from_millis(self.poll_interval_ms),
                max_attempts: self.max_poll_attempts.filter(|m| *m > 0),
            },
            ..TrackerConfig::default()
        }
    }
}

/// Returns the default configuration file path.
fn config_path() -> Option<PathBuf> {
    app_dir().map(|d| d.join("config.toml"))
}

/// Directory holding the config and token files.
fn app_dir() -> Option<PathBuf> {
    base_config_dir(|key| std::env::var(key).ok()).map(|d| d.join(APP_DIR))
}

/// Resolves the per-user config root from environment variables.
///
/// Windows uses `%APPDATA%`. Elsewhere an absolute `$XDG_CONFIG_HOME`
/// wins over `$HOME/.config`. Empty values count as unset.
fn base_config_dir(var: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    let non_empty = |key: &str| var(key).filter(|v| !v.is_empty()).map(PathBuf::from);
    if cfg!(windows) {
        return non_empty("APPDATA");
    }
    let xdg = non_empty("XDG_CONFIG_HOME").filter(|p| p.is_absolute());
    xdg.or_else(|| non_empty("HOME").map(|home| home.join(".config")))
}
