use sha2::{Digest, Sha256};

use crate::snapshot::RawContent;

/// Hex-encoded SHA-256 over `type tag + payload bytes`.
///
/// Used as the poll-driven change fingerprint and as the content-addressed
/// file name for cached images. Including the type tag keeps a text clip and
/// an image clip with identical bytes from colliding.
pub fn fingerprint(content: &RawContent) -> String {
    let mut hasher = Sha256::new();
    match content {
        RawContent::Text(text) => {
            hasher.update(b"text:");
            hasher.update(text.as_bytes());
        }
        RawContent::ImagePng(bytes) => {
            hasher.update(b"image:");
            hasher.update(bytes);
        }
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint of raw image bytes alone, used for cache file naming.
pub fn image_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_fingerprint() {
        let a = fingerprint(&RawContent::Text("hello".into()));
        let b = fingerprint(&RawContent::Text("hello".into()));
        assert_eq!(a, b);
    }

    #[test]
    fn type_tag_separates_text_from_image() {
        let text = fingerprint(&RawContent::Text("abc".into()));
        let image = fingerprint(&RawContent::ImagePng(b"abc".to_vec()));
        assert_ne!(text, image);
    }
}
