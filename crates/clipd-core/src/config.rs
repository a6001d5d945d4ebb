use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::paths;
use crate::policy::{Blacklist, MatchRule};

fn default_max_entries() -> i64 {
    100
}

fn default_blacklist() -> Vec<String> {
    vec![
        "KeePassXC".to_string(),
        "Bitwarden".to_string(),
        "1Password".to_string(),
    ]
}

fn default_max_image_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// How the daemon observes clipboard changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatchMode {
    /// Event-driven where the platform supports change notifications,
    /// polling otherwise.
    #[default]
    Auto,
    Event,
    Poll,
}

/// User configuration document, stored as JSON in the config dir.
///
/// Missing keys fall back to their defaults, so documents written by older
/// versions keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// History capacity; insertion past this evicts the oldest entries.
    #[serde(default = "default_max_entries")]
    pub max_entries: i64,

    /// Application name patterns whose clipboard content is never stored.
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,

    /// How blacklist patterns are compared (exact or substring).
    #[serde(default)]
    pub blacklist_match: MatchRule,

    /// Images larger than this are discarded at classification.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,

    /// Poll-driven backend tick interval.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub watch_mode: WatchMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            blacklist: default_blacklist(),
            blacklist_match: MatchRule::default(),
            max_image_bytes: default_max_image_bytes(),
            poll_interval_ms: default_poll_interval_ms(),
            watch_mode: WatchMode::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default per-user location, writing the default
    /// document on first run. An unparseable file logs a warning and falls
    /// back to defaults rather than failing the command.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let settings = Settings::default();
            settings.save_to(path)?;
            return Ok(settings);
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        match serde_json::from_str(&raw) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "settings file invalid, using defaults");
                Ok(Settings::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("writing settings to {}", path.display()))
    }

    pub fn blacklist_policy(&self) -> Blacklist {
        Blacklist::new(&self.blacklist, self.blacklist_match)
    }
}

/// Settings plus the resolved on-disk locations, bundled so command handlers
/// only thread one value around.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub settings: Settings,
    pub database_file: PathBuf,
    pub image_cache_dir: PathBuf,
    pub lock_file: PathBuf,
}

impl RuntimeConfig {
    pub fn load() -> Result<Self> {
        Ok(Self {
            settings: Settings::load()?,
            database_file: paths::database_file()?,
            image_cache_dir: paths::image_cache_dir()?,
            lock_file: paths::lock_file()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = Settings::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(settings.max_entries, 100);
        assert!(settings.blacklist.iter().any(|p| p == "KeePassXC"));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "max_entries": 5 }"#).unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.max_entries, 5);
        assert_eq!(settings.poll_interval_ms, 1000);
        assert_eq!(settings.blacklist_match, MatchRule::Exact);
    }

    #[test]
    fn invalid_document_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.max_entries, 100);
    }
}
