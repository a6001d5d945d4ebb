use anyhow::{anyhow, Result};
use diesel::prelude::*;

use clipd_core::entry::{ClipEntry, ContentType};

/// Row as stored in the `clips` table. Kept separate from the domain type so
/// schema details (string content_type, nullable columns) stay in this crate.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::clips)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClipRow {
    pub id: i64,
    pub content_type: String,
    pub payload: String,
    pub content_hash: String,
    pub created_at: i64,
    pub source_app: Option<String>,
}

impl ClipRow {
    pub fn into_entry(self) -> Result<ClipEntry> {
        let content_type = ContentType::from_tag(&self.content_type).ok_or_else(|| {
            anyhow!("unknown content_type in row {}: {}", self.id, self.content_type)
        })?;
        Ok(ClipEntry {
            id: self.id,
            content_type,
            payload: self.payload,
            created_at: self.created_at,
            source_app: self.source_app,
        })
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::clips)]
pub struct NewClipRow {
    pub content_type: String,
    pub payload: String,
    pub content_hash: String,
    pub created_at: i64,
    pub source_app: Option<String>,
}
