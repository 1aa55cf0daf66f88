//! Monomer library: single-character codes mapped to fragment SMILES.

use std::collections::BTreeMap;

use peptoid_chem::parse_smiles;
use peptoid_core::{PeptoidError, Result};

/// Fragments keyed by monomer code. Every fragment parsed as SMILES when it
/// was inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonomerLibrary {
    monomers: BTreeMap<char, String>,
}

impl MonomerLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a monomer. Codes must be printable ASCII.
    pub fn insert(&mut self, code: char, smiles: &str) -> Result<()> {
        if !code.is_ascii_graphic() {
            return Err(PeptoidError::InvalidInput(format!(
                "monomer code {code:?} is not a printable ASCII character"
            )));
        }
        let smiles = smiles.trim();
        parse_smiles(smiles).map_err(|e| {
            PeptoidError::InvalidInput(format!("monomer '{code}' has invalid SMILES {smiles:?}: {e}"))
        })?;
        self.monomers.insert(code, smiles.to_string());
        Ok(())
    }

    /// Build a library from `code -> SMILES` pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (char, &'a str)>,
    {
        let mut library = Self::new();
        for (code, smiles) in pairs {
            library.insert(code, smiles)?;
        }
        Ok(library)
    }

    pub fn get(&self, code: char) -> Option<&str> {
        self.monomers.get(&code).map(String::as_str)
    }

    /// Fragment for `code`, or an error naming the code and its position.
    pub fn fragment(&self, code: char, position: usize) -> Result<&str> {
        self.get(code).ok_or_else(|| {
            PeptoidError::InvalidInput(format!(
                "unknown monomer code '{code}' at position {position}"
            ))
        })
    }

    pub fn contains(&self, code: char) -> bool {
        self.monomers.contains_key(&code)
    }

    /// Codes in sorted order.
    pub fn codes(&self) -> impl Iterator<Item = char> + '_ {
        self.monomers.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.monomers.iter().map(|(&c, s)| (c, s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.monomers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monomers.is_empty()
    }
}
