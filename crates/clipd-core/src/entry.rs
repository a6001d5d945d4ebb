use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of payload an entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Image,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
        }
    }

    pub fn from_tag(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ContentType::Text),
            "image" => Some(ContentType::Image),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted clipboard capture.
///
/// Entries are immutable once stored. For `Text` the payload is the captured
/// character sequence verbatim (embedded newlines preserved); for `Image` it
/// is the absolute path of the cached PNG file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipEntry {
    /// Sqlite rowid, assigned on insert, monotonically increasing.
    pub id: i64,
    pub content_type: ContentType,
    pub payload: String,
    /// Capture time, unix milliseconds.
    pub created_at: i64,
    /// Best-effort identity of the application that owned the clipboard at
    /// capture time, `None` when undeterminable.
    pub source_app: Option<String>,
}

impl ClipEntry {
    pub fn is_image(&self) -> bool {
        self.content_type == ContentType::Image
    }
}
