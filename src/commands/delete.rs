use anyhow::Result;
use tracing::info;

use clipd_core::config::RuntimeConfig;
use clipd_infra::HistoryStore;

use super::read_selection;

/// Remove one entry, addressed by id or by a piped picker selection.
/// No match is a harmless no-op.
pub fn run(config: &RuntimeConfig, id: Option<i64>) -> Result<()> {
    let store = HistoryStore::open(config)?;

    let deleted = match id {
        Some(id) => store.delete_by_id(id)?,
        None => {
            let selection = read_selection()?;
            if selection.trim().is_empty() {
                return Ok(());
            }
            store.delete_by_payload(&selection)?
        }
    };

    if deleted {
        info!("entry deleted");
    } else {
        info!("selection did not resolve to a stored entry");
    }
    Ok(())
}
