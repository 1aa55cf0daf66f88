//! Structured error types for the peptoid workspace.

use thiserror::Error;

/// Unified error type for all peptoid operations.
#[derive(Debug, Error)]
pub enum PeptoidError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed SMILES, SMARTS or reaction SMARTS
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (unknown monomer code, impossible request, bad arguments)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A reaction did not match or did not converge
    #[error("reaction error: {0}")]
    Reaction(String),

    /// An atom exceeds every allowed valence
    #[error("valence error: {0}")]
    Valence(String),

    /// Malformed configuration or monomer library
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PeptoidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        let err = PeptoidError::Reaction("displacement found no match".into());
        assert_eq!(err.to_string(), "reaction error: displacement found no match");
    }

    #[test]
    fn io_converts() {
        fn open() -> Result<std::fs::File> {
            Ok(std::fs::File::open("/nonexistent/peptoid/file")?)
        }
        assert!(matches!(open(), Err(PeptoidError::Io(_))));
    }
}
