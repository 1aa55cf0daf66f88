//! The reaction set used for submonomer peptoid assembly.

use peptoid_chem::{
    canonical_smiles, parse_reaction, parse_smarts, parse_smiles, parse_smiles_named,
    protect_matching_atoms, Molecule, Reaction, SmartsPattern,
};
use peptoid_core::{PeptoidError, Result};
use tracing::debug;

use crate::deprotect::{DeprotectionRule, Deprotector};
use crate::sequence::PeptoidSequence;

/// A primary or secondary amine (not an amide, carbamate or similar)
/// displacing a halide.
pub const DISPLACEMENT_SMIRKS: &str = "[N;!H0!$(NC=[!#6;!P]):1].[#6:2][F,Cl,Br,I]>>[N:1][#6:2]";

/// Carboxylic acid + N-H amine to amide.
pub const AMIDATION_SMIRKS: &str = "[C:1](=[O:2])-[OD1].[N!H0:3]>>[C:1](=[O:2])[N:3]";

/// Amide and thioamide nitrogens, blocked before coupling.
pub const AMIDE_NITROGEN_SMARTS: &str = "[N;$(NC=[O,S])]";

pub const BROMOACETIC_ACID: &str = "OC(CBr)=O";

/// Displacement, coupling and deprotection chemistry.
#[derive(Debug, Clone)]
pub struct PeptoidChemistry {
    displacement: Reaction,
    amidation: Reaction,
    amide_nitrogen: SmartsPattern,
    bromoacetic_acid: Molecule,
    deprotector: Deprotector,
}

impl PeptoidChemistry {
    /// Chemistry with the standard deprotection table.
    pub fn new() -> Result<Self> {
        Self::with_deprotector(Deprotector::standard()?)
    }

    /// Chemistry with a custom deprotection table.
    pub fn with_deprotection(rules: Vec<DeprotectionRule>) -> Result<Self> {
        Self::with_deprotector(Deprotector::new(rules)?)
    }

    fn with_deprotector(deprotector: Deprotector) -> Result<Self> {
        Ok(Self {
            displacement: parse_reaction(DISPLACEMENT_SMIRKS)?,
            amidation: parse_reaction(AMIDATION_SMIRKS)?,
            amide_nitrogen: parse_smarts(AMIDE_NITROGEN_SMARTS)?,
            bromoacetic_acid: parse_smiles_named(BROMOACETIC_ACID, "bromoacetic acid")?,
            deprotector,
        })
    }

    pub fn deprotector(&self) -> &Deprotector {
        &self.deprotector
    }

    /// Alkylate `amine` with `alkyl_halide`, returning the canonical SMILES
    /// of the first product.
    pub fn amine_displacement(&self, amine: &str, alkyl_halide: &str) -> Result<String> {
        let amine_mol = parse_smiles(amine)?;
        let halide_mol = parse_smiles(alkyl_halide)?;
        let product = first_product(&self.displacement, &[&amine_mol, &halide_mol], || {
            format!("amine displacement found no match for {amine} + {alkyl_halide}")
        })?;
        let smiles = canonical_smiles(&product);
        debug!(%amine, %alkyl_halide, product = %smiles, "amine displacement");
        Ok(smiles)
    }

    /// Couple bromoacetic acid onto the free N-H of `amine_intermediate`.
    /// Amide and thioamide nitrogens are blocked first so only the amine
    /// can react.
    pub fn amide_bond_formation(&self, amine_intermediate: &str) -> Result<String> {
        let mut mol = parse_smiles(amine_intermediate)?;
        let blocked = protect_matching_atoms(&mut mol, &self.amide_nitrogen);
        self.couple(mol, blocked)
    }

    /// Couple bromoacetic acid onto the first N-H found, amides included.
    pub fn amide_bond_formation_unprotected(&self, amine_intermediate: &str) -> Result<String> {
        let mol = parse_smiles(amine_intermediate)?;
        self.couple(mol, 0)
    }

    fn couple(&self, mol: Molecule, blocked: usize) -> Result<String> {
        let product = first_product(&self.amidation, &[&self.bromoacetic_acid, &mol], || {
            format!("amide coupling found no free N-H in {}", canonical_smiles(&mol))
        })?;
        let smiles = canonical_smiles(&product);
        debug!(blocked, product = %smiles, "amide bond formation");
        Ok(smiles)
    }

    /// Remove protecting groups according to the codes in `sequence`.
    pub fn deprotect_peptoid(
        &self,
        sequence: &PeptoidSequence,
        protected_smiles: &str,
    ) -> Result<String> {
        let mut mol = parse_smiles(protected_smiles)?;
        let fired = self.deprotector.deprotect(sequence, &mut mol)?;
        debug!(%sequence, fired = ?fired, "deprotected");
        Ok(canonical_smiles(&mol))
    }
}

fn first_product(
    reaction: &Reaction,
    reactants: &[&Molecule],
    describe: impl FnOnce() -> String,
) -> Result<Molecule> {
    reaction
        .run_reactants(reactants)?
        .into_iter()
        .next()
        .and_then(|set| set.into_iter().next())
        .ok_or_else(|| PeptoidError::Reaction(describe()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use peptoid_chem::smarts_match;

    fn canon(smiles: &str) -> String {
        canonical_smiles(&parse_smiles(smiles).unwrap())
    }

    #[test]
    fn displacement_consumes_halide() {
        let chem = PeptoidChemistry::new().unwrap();
        let product = chem
            .amine_displacement("NCc1ccccc1", "BrCC(=O)OC(C)(C)C")
            .unwrap();
        assert_eq!(product, canon("CC(C)(C)OC(=O)CNCc1ccccc1"));
        assert!(!product.contains("Br"));
    }

    #[test]
    fn displacement_leaves_carbamate_alone() {
        let chem = PeptoidChemistry::new().unwrap();
        let product = chem
            .amine_displacement("NCCCCNC(=O)OC(C)(C)C", "BrCC(=O)OC(C)(C)C")
            .unwrap();
        assert_eq!(product, canon("CC(C)(C)OC(=O)CNCCCCNC(=O)OC(C)(C)C"));
    }

    #[test]
    fn displacement_without_amine_fails() {
        let chem = PeptoidChemistry::new().unwrap();
        let err = chem.amine_displacement("CC(=O)N(C)C", "BrCC(=O)O").unwrap_err();
        assert!(matches!(err, PeptoidError::Reaction(_)));
    }

    #[test]
    fn coupling_appends_bromoacetyl() {
        let chem = PeptoidChemistry::new().unwrap();
        let product = chem
            .amide_bond_formation("CC(C)(C)OC(=O)CNCc1ccccc1")
            .unwrap();
        assert_eq!(product, canon("CC(C)(C)OC(=O)CN(Cc1ccccc1)C(=O)CBr"));
    }

    #[test]
    fn protected_coupling_skips_amide_nitrogen() {
        let chem = PeptoidChemistry::new().unwrap();
        // secondary amide N-H precedes the amine in atom order
        let intermediate = "CC(=O)NCCNC";
        let protected = chem.amide_bond_formation(intermediate).unwrap();
        assert_eq!(protected, canon("CC(=O)NCCN(C)C(=O)CBr"));

        let unprotected = chem.amide_bond_formation_unprotected(intermediate).unwrap();
        assert_eq!(unprotected, canon("CC(=O)N(CCNC)C(=O)CBr"));
    }

    #[test]
    fn coupling_without_nh_fails() {
        let chem = PeptoidChemistry::new().unwrap();
        let err = chem.amide_bond_formation("CC(=O)N(C)C").unwrap_err();
        assert!(matches!(err, PeptoidError::Reaction(_)));
    }

    #[test]
    fn deprotect_strips_ester() {
        let chem = PeptoidChemistry::new().unwrap();
        let seq = PeptoidSequence::new("F").unwrap();
        let out = chem
            .deprotect_peptoid(&seq, "CC(C)(C)OC(=O)CNCc1ccccc1")
            .unwrap();
        assert_eq!(out, canon("OC(=O)CNCc1ccccc1"));
        let tbu = parse_smarts("OC(C)(C)C").unwrap();
        assert!(!smarts_match(&parse_smiles(&out).unwrap(), &tbu));
    }

    #[test]
    fn custom_table_replaces_default() {
        let chem = PeptoidChemistry::with_deprotection(Vec::new()).unwrap();
        let seq = PeptoidSequence::new("F").unwrap();
        let input = "CC(C)(C)OC(=O)CNCc1ccccc1";
        assert_eq!(chem.deprotect_peptoid(&seq, input).unwrap(), canon(input));
        assert_eq!(chem.deprotector().rules().count(), 0);
    }
}
