use anyhow::Result;

use clipd_core::config::RuntimeConfig;
use clipd_infra::HistoryStore;

/// Wipe the history, or only the entries whose payload contains `pattern`.
pub fn run(config: &RuntimeConfig, pattern: Option<String>) -> Result<()> {
    let store = HistoryStore::open(config)?;
    match pattern {
        Some(pattern) => {
            store.clear_matching(&pattern)?;
            Ok(())
        }
        None => store.clear(),
    }
}
