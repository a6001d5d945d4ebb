//! Turns raw backend snapshots into canonical captures.
//!
//! Text is taken verbatim. Images are size-checked and content-addressed by
//! their SHA-256 digest; the store materializes the actual cache file. A
//! snapshot that classifies to `None` is simply not history-worthy (empty
//! text, oversized image) and is dropped without surfacing an error.

use tracing::debug;

use crate::entry::ContentType;
use crate::hash::{fingerprint, image_digest};
use crate::snapshot::{RawContent, Snapshot};

/// Canonical payload of a successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedPayload {
    Text(String),
    /// PNG bytes plus their digest, which names the cache file.
    Image { png: Vec<u8>, digest: String },
}

/// A classified capture, ready for the history store.
#[derive(Debug, Clone)]
pub struct Captured {
    pub payload: CapturedPayload,
    pub source_app: Option<String>,
    /// Fingerprint over `(type, payload bytes)`, used by the poll backend.
    pub fingerprint: String,
}

impl Captured {
    pub fn content_type(&self) -> ContentType {
        match self.payload {
            CapturedPayload::Text(_) => ContentType::Text,
            CapturedPayload::Image { .. } => ContentType::Image,
        }
    }
}

/// Classify a snapshot, or discard it.
pub fn classify(snapshot: Snapshot, max_image_bytes: u64) -> Option<Captured> {
    let fp = fingerprint(&snapshot.content);
    match snapshot.content {
        RawContent::Text(text) => {
            if text.is_empty() {
                return None;
            }
            Some(Captured {
                payload: CapturedPayload::Text(text),
                source_app: snapshot.source_app,
                fingerprint: fp,
            })
        }
        RawContent::ImagePng(png) => {
            if png.is_empty() {
                return None;
            }
            if png.len() as u64 > max_image_bytes {
                debug!(
                    size = png.len(),
                    limit = max_image_bytes,
                    "discarding oversized image capture"
                );
                return None;
            }
            let digest = image_digest(&png);
            Some(Captured {
                payload: CapturedPayload::Image { png, digest },
                source_app: snapshot.source_app,
                fingerprint: fp,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_kept_verbatim() {
        let captured = classify(Snapshot::text("a\nb "), 1024).unwrap();
        assert_eq!(captured.content_type(), ContentType::Text);
        assert_eq!(captured.payload, CapturedPayload::Text("a\nb ".into()));
    }

    #[test]
    fn empty_text_is_discarded() {
        assert!(classify(Snapshot::text(""), 1024).is_none());
    }

    #[test]
    fn oversized_image_is_discarded() {
        let snapshot = Snapshot {
            content: RawContent::ImagePng(vec![0u8; 2048]),
            source_app: None,
        };
        assert!(classify(snapshot, 1024).is_none());
    }

    #[test]
    fn image_within_limit_is_digested() {
        let snapshot = Snapshot {
            content: RawContent::ImagePng(vec![1, 2, 3]),
            source_app: Some("gimp".into()),
        };
        let captured = classify(snapshot, 1024).unwrap();
        match &captured.payload {
            CapturedPayload::Image { digest, .. } => assert_eq!(digest.len(), 64),
            other => panic!("expected image payload, got {other:?}"),
        }
        assert_eq!(captured.source_app.as_deref(), Some("gimp"));
    }
}
