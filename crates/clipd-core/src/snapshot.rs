/// Raw clipboard content as read from a backend, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContent {
    /// UTF-8 text, exactly as the clipboard delivered it.
    Text(String),
    /// Image data, already normalized to PNG bytes by the backend.
    ImagePng(Vec<u8>),
}

/// One observed clipboard state, emitted by a backend per detected change.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub content: RawContent,
    /// Owning application at capture time, when the platform could tell.
    pub source_app: Option<String>,
}

impl Snapshot {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: RawContent::Text(text.into()),
            source_app: None,
        }
    }

    pub fn with_source(mut self, source_app: Option<String>) -> Self {
        self.source_app = source_app;
        self
    }
}
