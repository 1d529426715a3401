// src/fingerprint.rs
//! Content fingerprints: SHA-256 hex digests over trimmed text, used as
//! change/dedup signals on raw items and as slug suffixes.

use sha2::{Digest, Sha256};

/// Hex digest of the trimmed input, or `None` for empty/whitespace-only
/// text so "no content" never hashes to a shared sentinel value.
pub fn content_hash(text: &str) -> Option<String> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    let mut hasher = Sha256::new();
    hasher.update(t.as_bytes());
    Some(hex::encode(hasher.finalize()))
}

/// First 8 hex chars of a digest, for slug suffixes.
pub fn short_hash(digest: &str) -> &str {
    &digest[..digest.len().min(8)]
}
