//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::ai::{DEFAULT_BATCH_CAP, DEFAULT_MODEL};
use crate::error::Result;
use crate::prober::{ProbeConfig, DEFAULT_PROBE_CAP, DEFAULT_PROBE_CONCURRENCY};
use crate::sources::{FetchOptions, DEFAULT_USER_AGENT};

/// Persisted settings. Never holds the Xtream password or the AI key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_probe_cap")]
    pub probe_cap: usize,
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
    #[serde(default = "default_ai_batch")]
    pub ai_batch_cap: usize,
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    // Last Xtream login, minus the password
    #[serde(default)]
    pub xtream_host: String,
    #[serde(default)]
    pub xtream_username: String,
}

fn default_user_agent() -> String { DEFAULT_USER_AGENT.to_string() }
fn default_fetch_timeout() -> u64 { 60 }
fn default_probe_timeout() -> u64 { 4 }
fn default_probe_cap() -> usize { DEFAULT_PROBE_CAP }
fn default_probe_concurrency() -> usize { DEFAULT_PROBE_CONCURRENCY }
fn default_ai_model() -> String { DEFAULT_MODEL.to_string() }
fn default_ai_batch() -> usize { DEFAULT_BATCH_CAP }
fn default_true() -> bool { true }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            fetch_timeout_secs: default_fetch_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            probe_cap: DEFAULT_PROBE_CAP,
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
            ai_model: default_ai_model(),
            ai_batch_cap: DEFAULT_BATCH_CAP,
            dark_mode: true,
            xtream_host: String::new(),
            xtream_username: String::new(),
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("m3u_editor");
        path.push("config.json");
        path
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Missing or unreadable files fall back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring corrupt config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Err(e) = self.save_to(&path) {
            warn!("Failed to save config {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            concurrency: self.probe_concurrency.max(1),
            timeout: Duration::from_secs(self.probe_timeout_secs.max(1)),
            cap: self.probe_cap,
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.fetch_timeout_secs.max(1)),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
