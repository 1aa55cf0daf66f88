//! Molecular graphs and reaction chemistry for peptoid assembly.
//!
//! Provides SMILES parsing and canonical writing, SMARTS substructure search,
//! reaction SMARTS application with atom protection, hydrogen assignment and
//! valence sanitization, and formula/weight calculation.
//!
//! # Example
//!
//! ```
//! use peptoid_chem::{canonical_smiles, parse_reaction, parse_smiles};
//!
//! let displacement =
//!     parse_reaction("[N;!H0!$(NC=[!#6;!P]):1].[#6:2][F,Cl,Br,I]>>[N:1][#6:2]").unwrap();
//! let amine = parse_smiles("NC").unwrap();
//! let halide = parse_smiles("BrCC(=O)O").unwrap();
//!
//! let products = displacement.run_reactants(&[&amine, &halide]).unwrap();
//! let expected = parse_smiles("OC(=O)CNC").unwrap();
//! assert_eq!(canonical_smiles(&products[0][0]), canonical_smiles(&expected));
//! ```

pub mod canon;
pub mod element;
pub mod molecule;
pub mod properties;
pub mod reaction;
pub mod ring;
pub mod sanitize;
pub mod smarts;
pub mod smiles;

pub use canon::{canonical_ranks, canonical_smiles};
pub use element::{element_by_number, element_by_symbol, valences_for, Element};
pub use molecule::{Bond, BondOrder, MolAtom, Molecule};
pub use properties::{molecular_formula, molecular_weight};
pub use reaction::{parse_reaction, protect_matching_atoms, Reaction, MAX_PRODUCT_SETS};
pub use ring::{find_sssr, RingInfo};
pub use sanitize::{assign_hydrogens, default_hydrogens, sanitize};
pub use smarts::{parse_smarts, smarts_find_all, smarts_match, SmartsMatch, SmartsPattern};
pub use smiles::{parse_smiles, parse_smiles_named};
