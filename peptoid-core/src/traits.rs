//! Core trait definitions shared across the workspace.

/// An ordered sequence of single-byte residue codes.
pub trait Sequence {
    /// The raw byte representation of the sequence.
    fn as_bytes(&self) -> &[u8];

    /// Length in residues.
    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the sequence is empty.
    fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Whether any residue code in `codes` occurs in the sequence.
    fn contains_any(&self, codes: &[u8]) -> bool {
        self.as_bytes().iter().any(|b| codes.contains(b))
    }
}

/// A type whose identity can be derived from its content via cryptographic hash.
pub trait ContentAddressable {
    /// Return the content hash as a hex string (SHA-256).
    fn content_hash(&self) -> String;
}

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Codes(&'static [u8]);

    impl Sequence for Codes {
        fn as_bytes(&self) -> &[u8] {
            self.0
        }
    }

    #[test]
    fn default_methods() {
        let seq = Codes(b"FKW");
        assert_eq!(seq.len(), 3);
        assert!(!seq.is_empty());
        assert!(seq.contains_any(b"DKR"));
        assert!(!seq.contains_any(b"SY"));
        assert!(Codes(b"").is_empty());
    }
}
