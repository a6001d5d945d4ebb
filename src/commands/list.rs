use std::io::Write;

use anyhow::Result;

use clipd_core::config::RuntimeConfig;
use clipd_core::entry::ContentType;
use clipd_core::escape;
use clipd_infra::HistoryStore;

/// Payload display length in the default (non `--full`) format.
const PREVIEW_CHARS: usize = 100;

pub fn run(config: &RuntimeConfig, simple: bool, limit: Option<i64>, full: bool) -> Result<()> {
    let store = HistoryStore::open(config)?;
    let entries = store.list(limit)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for entry in entries {
        let flattened = match entry.content_type {
            ContentType::Text => escape::encode(&entry.payload),
            // Image payloads are cache file paths and contain no newlines.
            ContentType::Image => entry.payload.clone(),
        };

        if simple {
            writeln!(out, "{flattened}")?;
            continue;
        }

        let display = match entry.content_type {
            ContentType::Text if full => flattened,
            ContentType::Text => flattened.chars().take(PREVIEW_CHARS).collect(),
            ContentType::Image => format!("[image] {flattened}"),
        };
        let tag = match entry.content_type {
            ContentType::Text => 'T',
            ContentType::Image => 'I',
        };
        writeln!(out, "{} [{}] {}", entry.id, tag, display)?;
    }

    Ok(())
}
