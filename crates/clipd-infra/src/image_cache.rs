use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

/// Content-addressed store for image payloads.
///
/// Each distinct image lives once as `<sha256 hex>.png`; entries reference
/// it by path. Removal is driven by the history store, which checks that no
/// surviving row still references a file before asking for its deletion.
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the PNG bytes under their digest name, unless already present.
    /// Returns the cache file path used as the entry payload.
    pub fn materialize(&self, digest: &str, png: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating image cache dir {}", self.dir.display()))?;
        let path = self.dir.join(format!("{digest}.png"));
        if !path.exists() {
            fs::write(&path, png)
                .with_context(|| format!("writing image cache file {}", path.display()))?;
        }
        Ok(path)
    }

    /// Best-effort removal of a cache file. A missing or undeletable file is
    /// logged, not an error; the rows referencing it are already gone.
    pub fn remove(&self, path: &str) {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path, error = %e, "failed to remove cached image"),
        }
    }

    /// Remove every cached image, used by `clear`.
    pub fn clear(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }
        for dirent in fs::read_dir(&self.dir)
            .with_context(|| format!("reading image cache dir {}", self.dir.display()))?
        {
            let path = dirent?.path();
            if path.is_file() {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "failed to remove cached image");
                }
            }
        }
        Ok(())
    }
}
