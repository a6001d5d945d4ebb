use anyhow::{Context, Result};
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info};

use clipd_core::classify::{Captured, CapturedPayload};
use clipd_core::config::RuntimeConfig;
use clipd_core::entry::{ClipEntry, ContentType};
use clipd_core::escape;
use clipd_core::policy::Blacklist;

use crate::image_cache::ImageCache;
use crate::models::{ClipRow, NewClipRow};
use crate::pool::{init_db_pool, DbPool};
use crate::schema::clips;

/// The durable, ordered clipboard history.
///
/// All mutations run inside `immediate_transaction` so the
/// check-newest-then-insert sequence and capacity eviction are atomic with
/// respect to concurrent CLI writers. Cache files are only unlinked after
/// the owning transaction committed.
pub struct HistoryStore {
    pool: DbPool,
    images: ImageCache,
    max_entries: i64,
    blacklist: Blacklist,
}

impl HistoryStore {
    /// Open (and migrate) the per-user history database.
    pub fn open(config: &RuntimeConfig) -> Result<Self> {
        let database_url = config.database_file.to_string_lossy().into_owned();
        let pool = init_db_pool(&database_url)?;
        Ok(Self {
            pool,
            images: ImageCache::new(config.image_cache_dir.clone()),
            max_entries: config.settings.max_entries,
            blacklist: config.settings.blacklist_policy(),
        })
    }

    /// Open a store against an explicit database url and cache dir.
    pub fn open_at(
        database_url: &str,
        images: ImageCache,
        max_entries: i64,
        blacklist: Blacklist,
    ) -> Result<Self> {
        Ok(Self {
            pool: init_db_pool(database_url)?,
            images,
            max_entries,
            blacklist,
        })
    }

    /// Persist a classified capture, unless the blacklist or the adjacency
    /// dedup check discards it. Returns whether a new entry was stored.
    pub fn insert(&self, captured: &Captured) -> Result<bool> {
        if self.blacklist.blocks(captured.source_app.as_deref()) {
            debug!(
                source_app = captured.source_app.as_deref(),
                "discarding capture from blacklisted application"
            );
            return Ok(false);
        }

        // Content-addressed, so writing before the transaction cannot orphan
        // anything observable: a dedup skip means the identical adjacent
        // entry already references this same file.
        let payload = match &captured.payload {
            CapturedPayload::Text(text) => text.clone(),
            CapturedPayload::Image { png, digest } => self
                .images
                .materialize(digest, png)?
                .to_string_lossy()
                .into_owned(),
        };
        let content_type = captured.content_type();

        let mut conn = self.pool.get()?;
        let (inserted, evicted_images) =
            conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
                let newest = newest_row(conn)?;
                if let Some(newest) = &newest {
                    if newest.content_type == content_type.as_str() && newest.payload == payload {
                        debug!("capture identical to most recent entry, skipping");
                        return Ok((false, Vec::new()));
                    }
                }

                // `created_at` must be non-decreasing even if the wall clock
                // stepped backwards between captures.
                let mut created_at = Utc::now().timestamp_millis();
                if let Some(newest) = &newest {
                    created_at = created_at.max(newest.created_at);
                }

                let row = NewClipRow {
                    content_type: content_type.as_str().to_string(),
                    payload: payload.clone(),
                    content_hash: captured.fingerprint.clone(),
                    created_at,
                    source_app: captured.source_app.clone(),
                };
                diesel::insert_into(clips::table)
                    .values(&row)
                    .execute(conn)
                    .context("inserting clipboard entry")?;

                let evicted = self.evict_over_capacity(conn)?;
                Ok((true, evicted))
            })?;

        for path in &evicted_images {
            self.images.remove(path);
        }
        Ok(inserted)
    }

    /// All entries, most recent first.
    pub fn list(&self, limit: Option<i64>) -> Result<Vec<ClipEntry>> {
        let mut conn = self.pool.get()?;
        let mut query = clips::table
            .order((clips::created_at.desc(), clips::id.desc()))
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let rows = query
            .load::<ClipRow>(&mut conn)
            .context("listing clipboard entries")?;
        rows.into_iter().map(ClipRow::into_entry).collect()
    }

    pub fn count(&self) -> Result<i64> {
        let mut conn = self.pool.get()?;
        Ok(clips::table.count().get_result(&mut conn)?)
    }

    pub fn get_by_id(&self, id: i64) -> Result<Option<ClipEntry>> {
        let mut conn = self.pool.get()?;
        let row = clips::table
            .find(id)
            .first::<ClipRow>(&mut conn)
            .optional()?;
        row.map(ClipRow::into_entry).transpose()
    }

    /// Resolve a picker selection back to an entry.
    ///
    /// Tries the text as-is, then with the single-line escape decoded, then
    /// with a trailing newline stripped -- pickers and shells routinely add
    /// one when piping the selected line.
    pub fn get_by_payload(&self, selection: &str) -> Result<Option<ClipEntry>> {
        let mut conn = self.pool.get()?;
        match resolve_selection(&mut conn, selection)? {
            Some(row) => row.into_entry().map(Some),
            None => Ok(None),
        }
    }

    /// Remove exactly one entry matching the selection. A selection that no
    /// longer resolves (raced with eviction or another delete) is a no-op.
    pub fn delete_by_payload(&self, selection: &str) -> Result<bool> {
        let mut conn = self.pool.get()?;
        let outcome = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
            let Some(row) = resolve_selection(conn, selection)? else {
                return Ok(None);
            };
            delete_row(conn, &row).map(Some)
        })?;

        match outcome {
            None => Ok(false),
            Some(freed_image) => {
                if let Some(path) = freed_image {
                    self.images.remove(&path);
                }
                Ok(true)
            }
        }
    }

    /// Remove the entry with the given id, if it still exists.
    pub fn delete_by_id(&self, id: i64) -> Result<bool> {
        let mut conn = self.pool.get()?;
        let outcome = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
            let row = clips::table.find(id).first::<ClipRow>(conn).optional()?;
            match row {
                None => Ok(None),
                Some(row) => delete_row(conn, &row).map(Some),
            }
        })?;

        match outcome {
            None => Ok(false),
            Some(freed_image) => {
                if let Some(path) = freed_image {
                    self.images.remove(&path);
                }
                Ok(true)
            }
        }
    }

    /// Remove all entries and all cached image data.
    pub fn clear(&self) -> Result<()> {
        let mut conn = self.pool.get()?;
        conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
            diesel::delete(clips::table)
                .execute(conn)
                .context("clearing clipboard history")?;
            // Reset the autoincrement counter so ids restart from 1.
            diesel::sql_query("DELETE FROM sqlite_sequence WHERE name = 'clips'")
                .execute(conn)?;
            Ok(())
        })?;
        self.images.clear()?;
        info!("clipboard history cleared");
        Ok(())
    }

    /// Remove the entries whose payload contains `pattern`, keeping the
    /// rest. Image cache files lose their file only when no surviving row
    /// still references them. Returns how many entries were removed.
    pub fn clear_matching(&self, pattern: &str) -> Result<usize> {
        let mut conn = self.pool.get()?;
        let (removed, orphaned) = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
            let victims: Vec<ClipRow> = clips::table
                .load::<ClipRow>(conn)?
                .into_iter()
                .filter(|row| row.payload.contains(pattern))
                .collect();
            let ids: Vec<i64> = victims.iter().map(|row| row.id).collect();

            diesel::delete(clips::table.filter(clips::id.eq_any(&ids)))
                .execute(conn)
                .context("clearing matching clipboard entries")?;

            let mut orphaned = Vec::new();
            for row in &victims {
                if row.content_type == ContentType::Image.as_str()
                    && !payload_referenced(conn, &row.payload)?
                {
                    orphaned.push(row.payload.clone());
                }
            }
            Ok((ids.len(), orphaned))
        })?;

        for path in &orphaned {
            self.images.remove(path);
        }
        info!(removed, pattern, "matching clipboard entries cleared");
        Ok(removed)
    }

    /// Delete the oldest rows beyond `max_entries`. Returns the cache file
    /// paths of evicted images that no surviving row references.
    fn evict_over_capacity(&self, conn: &mut SqliteConnection) -> Result<Vec<String>> {
        if self.max_entries <= 0 {
            return Ok(Vec::new());
        }
        let total: i64 = clips::table.count().get_result(conn)?;
        let excess = total - self.max_entries;
        if excess <= 0 {
            return Ok(Vec::new());
        }

        let victims = clips::table
            .order((clips::created_at.asc(), clips::id.asc()))
            .limit(excess)
            .load::<ClipRow>(conn)?;
        let ids: Vec<i64> = victims.iter().map(|row| row.id).collect();

        diesel::delete(clips::table.filter(clips::id.eq_any(&ids)))
            .execute(conn)
            .context("evicting oldest clipboard entries")?;
        debug!(evicted = ids.len(), "capacity eviction applied");

        let mut orphaned = Vec::new();
        for row in &victims {
            if row.content_type == ContentType::Image.as_str()
                && !payload_referenced(conn, &row.payload)?
            {
                orphaned.push(row.payload.clone());
            }
        }
        Ok(orphaned)
    }
}

/// The most recent entry, the one adjacency dedup compares against.
fn newest_row(conn: &mut SqliteConnection) -> Result<Option<ClipRow>> {
    Ok(clips::table
        .order((clips::created_at.desc(), clips::id.desc()))
        .first::<ClipRow>(conn)
        .optional()?)
}

fn payload_referenced(conn: &mut SqliteConnection, payload: &str) -> Result<bool> {
    let refs: i64 = clips::table
        .filter(clips::payload.eq(payload))
        .count()
        .get_result(conn)?;
    Ok(refs > 0)
}

/// Delete one resolved row. Returns the image cache path to free when the
/// row was an image no surviving row still references.
fn delete_row(conn: &mut SqliteConnection, row: &ClipRow) -> Result<Option<String>> {
    diesel::delete(clips::table.find(row.id))
        .execute(conn)
        .context("deleting clipboard entry")?;

    if row.content_type == ContentType::Image.as_str() && !payload_referenced(conn, &row.payload)? {
        Ok(Some(row.payload.clone()))
    } else {
        Ok(None)
    }
}

fn lookup_exact(conn: &mut SqliteConnection, payload: &str) -> Result<Option<ClipRow>> {
    Ok(clips::table
        .filter(clips::payload.eq(payload))
        .order((clips::created_at.desc(), clips::id.desc()))
        .first::<ClipRow>(conn)
        .optional()?)
}

fn resolve_selection(conn: &mut SqliteConnection, selection: &str) -> Result<Option<ClipRow>> {
    // Verbatim first, then with picker artifacts peeled off: the escape
    // decoded, a trailing newline stripped, surrounding whitespace trimmed.
    let mut candidates: Vec<String> = Vec::new();
    for form in [
        selection.to_string(),
        selection.trim_end_matches('\n').to_string(),
        selection.trim().to_string(),
    ] {
        let decoded = escape::decode(&form);
        if !candidates.contains(&form) {
            candidates.push(form);
        }
        if !candidates.contains(&decoded) {
            candidates.push(decoded);
        }
    }
    for candidate in &candidates {
        if let Some(row) = lookup_exact(conn, candidate)? {
            return Ok(Some(row));
        }
    }

    // A line in the default listing format carries the entry id up front.
    if let Some(id) = line_id_prefix(selection.trim()) {
        return Ok(clips::table.find(id).first::<ClipRow>(conn).optional()?);
    }

    Ok(None)
}

/// Parse the entry id from a default-format listing line, `"{id} [T] ..."`.
fn line_id_prefix(line: &str) -> Option<i64> {
    let end = line.find(|c: char| !c.is_ascii_digit())?;
    if end == 0 {
        return None;
    }
    let rest = line[end..].strip_prefix(" [")?;
    let mut chars = rest.chars();
    if !chars.next()?.is_ascii_uppercase() {
        return None;
    }
    chars.as_str().strip_prefix("] ")?;
    line[..end].parse().ok()
}
