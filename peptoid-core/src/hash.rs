//! SHA-256 hashing for content addressing.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 hash of in-memory data.
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Short identifier: the first `len` hex digits of the SHA-256 hash.
pub fn short_id(data: &[u8], len: usize) -> String {
    let mut digest = sha256(data);
    digest.truncate(len.min(digest.len()));
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        assert_eq!(
            sha256(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id(b"hello world", 12), "b94d27b9934d");
        assert_eq!(short_id(b"hello world", 1000).len(), 64);
        assert_eq!(short_id(b"", 0), "");
    }
}
