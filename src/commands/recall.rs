use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use clipd_core::config::RuntimeConfig;
use clipd_core::entry::{ClipEntry, ContentType};
use clipd_infra::HistoryStore;
use clipd_platform::SystemClipboard;

use super::read_selection;

/// Write a stored entry back to the system clipboard. An unresolvable
/// selection is a no-op, not an error; it may have raced with an eviction.
pub fn run(config: &RuntimeConfig, id: Option<i64>) -> Result<()> {
    let store = HistoryStore::open(config)?;

    let entry = resolve(&store, id)?;
    let Some(entry) = entry else {
        info!("selection did not resolve to a stored entry");
        return Ok(());
    };

    let mut clipboard = SystemClipboard::new()?;
    match entry.content_type {
        ContentType::Text => clipboard.write_text(&entry.payload)?,
        ContentType::Image => {
            let path = Path::new(&entry.payload);
            if !path.exists() {
                warn!(path = %path.display(), "cached image for entry {} is missing", entry.id);
                return Ok(());
            }
            clipboard.write_image_file(path)?;
        }
    }
    info!(id = entry.id, "entry restored to clipboard");
    Ok(())
}

fn resolve(store: &HistoryStore, id: Option<i64>) -> Result<Option<ClipEntry>> {
    match id {
        Some(id) => store.get_by_id(id),
        None => {
            let selection = read_selection()?;
            if selection.trim().is_empty() {
                return Ok(None);
            }
            store.get_by_payload(&selection)
        }
    }
}
