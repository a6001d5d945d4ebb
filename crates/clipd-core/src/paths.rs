//! Per-user file locations: config document, history database, image cache
//! and the daemon lock file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

const APP_DIR: &str = "clipd";

/// `~/.config/clipd/config.json`
pub fn config_file() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("could not determine the user config directory")?
        .join(APP_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir.join("config.json"))
}

/// `~/.local/share/clipd`
pub fn data_dir() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .context("could not determine the user data directory")?
        .join(APP_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

/// History database file.
pub fn database_file() -> Result<PathBuf> {
    Ok(data_dir()?.join("history.db"))
}

/// Directory holding cached image payloads, one content-addressed PNG per
/// distinct image.
pub fn image_cache_dir() -> Result<PathBuf> {
    let dir = data_dir()?.join("images");
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

/// Daemon single-instance lock file.
pub fn lock_file() -> Result<PathBuf> {
    Ok(data_dir()?.join("daemon.lock"))
}
