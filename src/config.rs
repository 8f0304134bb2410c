//! Client configuration.
//!
//! Loaded from `config.toml` under the platform config directory, with
//! environment variable overrides:
//! - `TASKLINK_API_URL` — base URL of the remote task API
//! - `TASKLINK_IDLE_TIMEOUT_SECS` — idle seconds before session expiry
//!
//! A missing config file falls back to defaults; a malformed one is an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default API base URL (local development server).
const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Default idle timeout: 10 minutes.
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the remote task API (no trailing slash).
    pub api_url: String,
    /// Seconds of inactivity before the session expires.
    pub idle_timeout_secs: u64,
    /// Override path for the stored credential file.
    pub credential_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            credential_path: None,
        }
    }
}

impl Config {
    /// Load configuration: file (if present), then environment overrides.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let mut config = match path_override {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a config file. The file must exist.
    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Apply environment variable overrides on top of file/default values.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("TASKLINK_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Ok(secs) = std::env::var("TASKLINK_IDLE_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse::<u64>() {
                self.idle_timeout_secs = parsed;
            }
        }
    }

    /// Idle timeout as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Path of the credential file: explicit override, or
    /// `<data dir>/credential`.
    pub fn credential_path(&self) -> PathBuf {
        if let Some(path) = &self.credential_path {
            return path.clone();
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join("credential"))
            .unwrap_or_else(|| PathBuf::from(".tasklink").join("credential"))
    }

    /// Default config file location: `<config dir>/config.toml`.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("", "", "tasklink")
    }
}
