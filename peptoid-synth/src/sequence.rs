//! Peptoid strings and random library generation.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use peptoid_core::{PeptoidError, Result, Sequence};
use rand::seq::SliceRandom;
use rand::Rng;

/// An ordered, non-empty string of single-character monomer codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeptoidSequence {
    codes: String,
}

impl PeptoidSequence {
    pub fn new(codes: impl Into<String>) -> Result<Self> {
        let codes = codes.into();
        if codes.is_empty() {
            return Err(PeptoidError::InvalidInput("empty peptoid sequence".into()));
        }
        Ok(Self { codes })
    }

    pub fn as_str(&self) -> &str {
        &self.codes
    }

    /// Codes in assembly order.
    pub fn codes(&self) -> impl Iterator<Item = char> + '_ {
        self.codes.chars()
    }

    pub fn last_code(&self) -> Option<char> {
        self.codes.chars().next_back()
    }

    pub fn contains_code(&self, code: char) -> bool {
        self.codes.contains(code)
    }
}

impl Sequence for PeptoidSequence {
    fn as_bytes(&self) -> &[u8] {
        self.codes.as_bytes()
    }
}

impl FromStr for PeptoidSequence {
    type Err = PeptoidError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.trim())
    }
}

impl fmt::Display for PeptoidSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.codes)
    }
}

/// Number of distinct strings of `length` over `symbols` distinct codes,
/// saturating at `usize::MAX`.
pub fn distinct_capacity(symbols: usize, length: usize) -> usize {
    match symbols {
        0 if length > 0 => 0,
        0 | 1 => 1,
        _ => {
            let mut capacity = 1usize;
            for _ in 0..length {
                capacity = capacity.saturating_mul(symbols);
                if capacity == usize::MAX {
                    break;
                }
            }
            capacity
        }
    }
}

/// Generate `n` distinct random strings of `length` codes drawn uniformly,
/// with replacement, from `alphabet`.
///
/// Strings come back in the order they were first drawn. Requests for more
/// strings than the alphabet can spell are rejected up front.
///
/// # Example
///
/// ```
/// use peptoid_synth::generate_peptoid_strings;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let set = generate_peptoid_strings(5, 3, &['A', 'F', 'K'], &mut rng).unwrap();
/// assert_eq!(set.len(), 5);
/// assert!(set.iter().all(|s| s.len() == 3));
/// ```
pub fn generate_peptoid_strings<R: Rng + ?Sized>(
    n: usize,
    length: usize,
    alphabet: &[char],
    rng: &mut R,
) -> Result<Vec<String>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    if alphabet.is_empty() {
        return Err(PeptoidError::InvalidInput(
            "cannot generate sequences from an empty alphabet".into(),
        ));
    }

    let distinct: HashSet<char> = alphabet.iter().copied().collect();
    let capacity = distinct_capacity(distinct.len(), length);
    if n > capacity {
        return Err(PeptoidError::InvalidInput(format!(
            "requested {n} distinct sequences of length {length}, \
             but {} codes only allow {capacity}",
            distinct.len()
        )));
    }

    let mut seen = HashSet::with_capacity(n);
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        let candidate: String = (0..length)
            .filter_map(|_| alphabet.choose(rng).copied())
            .collect();
        if seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    }
    Ok(out)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    proptest! {
        #[test]
        fn generated_sets_are_distinct_and_in_alphabet(
            seed in any::<u64>(),
            n in 0usize..40,
            length in 3usize..8,
            alphabet in proptest::collection::vec(prop::char::range('A', 'Z'), 2..6),
        ) {
            let distinct: HashSet<char> = alphabet.iter().copied().collect();
            let n = n.min(distinct_capacity(distinct.len(), length));
            let mut rng = StdRng::seed_from_u64(seed);
            let set = generate_peptoid_strings(n, length, &alphabet, &mut rng).unwrap();
            prop_assert_eq!(set.len(), n);
            let unique: HashSet<&String> = set.iter().collect();
            prop_assert_eq!(unique.len(), n);
            for s in &set {
                prop_assert_eq!(s.chars().count(), length);
                prop_assert!(s.chars().all(|c| alphabet.contains(&c)));
            }
        }
    }
}
