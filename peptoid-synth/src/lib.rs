//! Peptoid library generation and submonomer assembly.
//!
//! Sequences of single-character monomer codes are generated at random, then
//! assembled by alternating amine displacement and bromoacetic acid coupling,
//! and finally deprotected according to the codes they contain.
//!
//! # Example
//!
//! ```
//! use peptoid_synth::{Assembler, SynthesisConfig};
//!
//! let config = SynthesisConfig::bundled().unwrap();
//! let assembler = Assembler::from_config(&config).unwrap();
//! let product = assembler.assemble("FA").unwrap();
//! assert_eq!(product.sequence, "FA");
//! assert!(!product.smiles.contains("Br"));
//! ```

pub mod assembly;
pub mod chemistry;
pub mod config;
pub mod deprotect;
pub mod monomer;
pub mod sequence;

pub use assembly::{AssembledPeptoid, Assembler, SynthesisState};
pub use chemistry::PeptoidChemistry;
pub use config::{RuleConfig, SynthesisConfig};
pub use deprotect::{default_rules, DeprotectionRule, Deprotector, Trigger};
pub use monomer::MonomerLibrary;
pub use sequence::{distinct_capacity, generate_peptoid_strings, PeptoidSequence};
