//! Stepwise submonomer assembly of a peptoid from its sequence.

use peptoid_chem::{molecular_formula, molecular_weight, parse_smiles};
use peptoid_core::hash::{sha256, short_id};
use peptoid_core::{ContentAddressable, PeptoidError, Result, Summarizable};
use serde::Serialize;
use tracing::debug;

use crate::chemistry::PeptoidChemistry;
use crate::config::SynthesisConfig;
use crate::monomer::MonomerLibrary;
use crate::sequence::PeptoidSequence;

/// Hex digits kept for assembly record identifiers.
const ID_LEN: usize = 12;

/// The two intermediate slots carried between steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisState {
    /// Halide-terminated intermediate.
    pub halide: String,
    /// Amine-terminated intermediate.
    pub amine: String,
}

impl SynthesisState {
    pub fn new(halide: &str) -> Self {
        Self {
            halide: halide.to_string(),
            amine: String::new(),
        }
    }

    /// The slot holding the finished chain.
    pub fn live(&self, ended_on_pass_through: bool) -> &str {
        if ended_on_pass_through {
            &self.halide
        } else {
            &self.amine
        }
    }
}

/// A fully assembled and deprotected peptoid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledPeptoid {
    pub id: String,
    pub sequence: String,
    pub smiles: String,
    pub formula: String,
    pub molecular_weight: f64,
}

impl ContentAddressable for AssembledPeptoid {
    fn content_hash(&self) -> String {
        sha256(self.smiles.as_bytes())
    }
}

impl Summarizable for AssembledPeptoid {
    fn summary(&self) -> String {
        format!(
            "{} {}: {} ({:.2} g/mol)",
            self.id, self.sequence, self.formula, self.molecular_weight
        )
    }
}

/// Drives displacement and coupling over a sequence, then deprotects.
#[derive(Debug, Clone)]
pub struct Assembler {
    library: MonomerLibrary,
    chemistry: PeptoidChemistry,
    start_code: char,
    pass_through: Vec<char>,
    protect_amides: bool,
}

impl Assembler {
    /// Assembler with start code `B`, pass-through code `X` and amide
    /// protection on.
    pub fn new(library: MonomerLibrary, chemistry: PeptoidChemistry) -> Self {
        Self {
            library,
            chemistry,
            start_code: 'B',
            pass_through: vec!['X'],
            protect_amides: true,
        }
    }

    pub fn from_config(config: &SynthesisConfig) -> Result<Self> {
        let library = config.library()?;
        let chemistry = PeptoidChemistry::with_deprotection(config.deprotection_rules())?;
        Ok(Self::new(library, chemistry)
            .with_start_code(config.start_code)
            .with_pass_through(config.pass_through.clone())
            .with_amide_protection(config.protect_amides))
    }

    pub fn with_start_code(mut self, code: char) -> Self {
        self.start_code = code;
        self
    }

    pub fn with_pass_through(mut self, codes: Vec<char>) -> Self {
        self.pass_through = codes;
        self
    }

    pub fn with_amide_protection(mut self, enabled: bool) -> Self {
        self.protect_amides = enabled;
        self
    }

    pub fn library(&self) -> &MonomerLibrary {
        &self.library
    }

    pub fn chemistry(&self) -> &PeptoidChemistry {
        &self.chemistry
    }

    pub fn start_code(&self) -> char {
        self.start_code
    }

    pub fn is_pass_through(&self, code: char) -> bool {
        self.pass_through.contains(&code)
    }

    /// Codes usable in sequences: the library minus the start code.
    pub fn alphabet(&self) -> Vec<char> {
        self.library
            .codes()
            .filter(|&c| c != self.start_code)
            .collect()
    }

    /// Assemble `sequence` and describe the product.
    pub fn assemble(&self, sequence: &str) -> Result<AssembledPeptoid> {
        let sequence = PeptoidSequence::new(sequence)?;
        let smiles = self.assemble_smiles(&sequence)?;
        let mol = parse_smiles(&smiles)?;
        Ok(AssembledPeptoid {
            id: short_id(smiles.as_bytes(), ID_LEN),
            sequence: sequence.to_string(),
            formula: molecular_formula(&mol),
            molecular_weight: molecular_weight(&mol),
            smiles,
        })
    }

    /// Final deprotected SMILES for `sequence`.
    pub fn assemble_smiles(&self, sequence: &PeptoidSequence) -> Result<String> {
        let start = self.library.get(self.start_code).ok_or_else(|| {
            PeptoidError::InvalidInput(format!(
                "start code '{}' is missing from the monomer library",
                self.start_code
            ))
        })?;
        // Resolve every code before running any chemistry.
        let fragments = sequence
            .codes()
            .enumerate()
            .map(|(pos, code)| self.library.fragment(code, pos).map(|f| (code, f)))
            .collect::<Result<Vec<_>>>()?;

        let mut state = SynthesisState::new(start);
        for (step, (code, fragment)) in fragments.into_iter().enumerate() {
            if self.is_pass_through(code) {
                state.halide = self.chemistry.amine_displacement(fragment, &state.halide)?;
                debug!(step, %code, halide = %state.halide, "pass-through displacement");
            } else {
                state.amine = self.chemistry.amine_displacement(fragment, &state.halide)?;
                state.halide = if self.protect_amides {
                    self.chemistry.amide_bond_formation(&state.amine)?
                } else {
                    self.chemistry.amide_bond_formation_unprotected(&state.amine)?
                };
                debug!(step, %code, amine = %state.amine, "displacement and coupling");
            }
        }

        let ended_on_pass_through = sequence
            .last_code()
            .map_or(false, |c| self.is_pass_through(c));
        self.chemistry
            .deprotect_peptoid(sequence, state.live(ended_on_pass_through))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembler() -> Assembler {
        let library = MonomerLibrary::from_pairs([
            ('B', "BrCC(=O)OC(C)(C)C"),
            ('A', "NC"),
            ('F', "NCc1ccccc1"),
        ])
        .unwrap();
        Assembler::new(library, PeptoidChemistry::new().unwrap())
    }

    #[test]
    fn state_live_slot() {
        let mut state = SynthesisState::new("BrCC(=O)O");
        state.amine = "NCC(=O)O".into();
        assert_eq!(state.live(true), "BrCC(=O)O");
        assert_eq!(state.live(false), "NCC(=O)O");
    }

    #[test]
    fn alphabet_excludes_start_code() {
        assert_eq!(assembler().alphabet(), vec!['A', 'F']);
    }

    #[test]
    fn single_monomer() {
        let product = assembler().assemble("F").unwrap();
        let expected = peptoid_chem::canonical_smiles(&parse_smiles("OC(=O)CNCc1ccccc1").unwrap());
        assert_eq!(product.smiles, expected);
        assert_eq!(product.formula, "C9H11NO2");
        assert_eq!(product.id.len(), 12);
        assert!(product.content_hash().starts_with(&product.id));
        assert!(product.summary().contains("C9H11NO2"));
    }

    #[test]
    fn unknown_code_reports_position() {
        let err = assembler().assemble("FAZ").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid input: unknown monomer code 'Z' at position 2"
        );
    }

    #[test]
    fn empty_sequence_rejected() {
        assert!(matches!(
            assembler().assemble(""),
            Err(PeptoidError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_start_code() {
        let err = assembler().with_start_code('Q').assemble("F").unwrap_err();
        assert!(matches!(err, PeptoidError::InvalidInput(_)));
    }
}
