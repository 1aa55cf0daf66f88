//! Hydrogen assignment and valence checks.

use peptoid_core::{PeptoidError, Result};

use crate::element::{element_by_number, valences_for};
use crate::molecule::Molecule;

/// Number of implicit hydrogens an atom carries by default valence rules.
///
/// Non-aromatic atoms take the smallest allowed valence that accommodates
/// their bonds. Aromatic atoms reserve one extra valence unit for the
/// delocalised bond, so `c` with two ring bonds gets one hydrogen and `n`
/// with two ring bonds gets none.
pub fn default_hydrogens(mol: &Molecule, atom_idx: usize) -> u8 {
    let atom = &mol.atoms[atom_idx];
    let valences = valences_for(atom.atomic_number, atom.formal_charge);
    if valences.is_empty() {
        return 0;
    }
    let used = mol.bond_valence(atom_idx);
    if atom.is_aromatic {
        return valences[0].saturating_sub(used + 1);
    }
    valences
        .iter()
        .find(|&&v| v >= used)
        .map(|&v| v - used)
        .unwrap_or(0)
}

/// Recompute implicit hydrogens for every atom whose count is not fixed.
pub fn assign_hydrogens(mol: &mut Molecule) {
    for i in 0..mol.atom_count() {
        if !mol.atoms[i].no_implicit {
            mol.atoms[i].implicit_hydrogens = default_hydrogens(mol, i);
        }
    }
}

/// Recompute hydrogens and reject atoms that exceed every allowed valence.
pub fn sanitize(mol: &mut Molecule) -> Result<()> {
    assign_hydrogens(mol);
    for i in 0..mol.atom_count() {
        let atom = &mol.atoms[i];
        let valences = valences_for(atom.atomic_number, atom.formal_charge);
        let Some(&max) = valences.last() else {
            continue;
        };
        let aromatic_extra = u8::from(atom.is_aromatic);
        let total = mol.bond_valence(i) + aromatic_extra + atom.implicit_hydrogens;
        if total > max {
            let symbol = element_by_number(atom.atomic_number)
                .map(|e| e.symbol)
                .unwrap_or("?");
            return Err(PeptoidError::Valence(format!(
                "atom {i} ({symbol}, charge {}) has valence {total}, maximum is {max}",
                atom.formal_charge
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::{Bond, BondOrder, MolAtom};
    use crate::smiles::parse_smiles;

    #[test]
    fn aliphatic_defaults() {
        let mol = parse_smiles("CC(=O)N").unwrap();
        assert_eq!(default_hydrogens(&mol, 0), 3);
        assert_eq!(default_hydrogens(&mol, 1), 0);
        assert_eq!(default_hydrogens(&mol, 2), 0);
        assert_eq!(default_hydrogens(&mol, 3), 2);
    }

    #[test]
    fn aromatic_defaults() {
        let mol = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(default_hydrogens(&mol, 0), 1);
        assert_eq!(default_hydrogens(&mol, 3), 0);
    }

    #[test]
    fn charged_atoms_shift_valence() {
        let mol = parse_smiles("C[N+](C)(C)C").unwrap();
        assert_eq!(mol.atoms[1].implicit_hydrogens, 0);
        let mol = parse_smiles("CC(=O)[O-]").unwrap();
        assert_eq!(mol.atoms[3].implicit_hydrogens, 0);
    }

    #[test]
    fn higher_valence_states() {
        let mol = parse_smiles("CS(=O)(=O)C").unwrap();
        assert_eq!(default_hydrogens(&mol, 1), 0);
        let mol = parse_smiles("OP(=O)(O)O").unwrap();
        assert_eq!(default_hydrogens(&mol, 1), 0);
    }

    #[test]
    fn sanitize_recomputes_after_edit() {
        let mut mol = parse_smiles("CCBr").unwrap();
        mol.atoms.truncate(2);
        mol.bonds.truncate(1);
        let mut mol = Molecule::new(String::new(), mol.atoms, mol.bonds);
        sanitize(&mut mol).unwrap();
        assert_eq!(mol.atoms[1].implicit_hydrogens, 3);
    }

    #[test]
    fn sanitize_rejects_pentavalent_carbon() {
        let atoms = (0..6).map(|_| MolAtom::new(6)).collect();
        let bonds = (1..6).map(|i| Bond::new(0, i, BondOrder::Single)).collect();
        let mut mol = Molecule::new(String::new(), atoms, bonds);
        let err = sanitize(&mut mol).unwrap_err();
        assert!(matches!(err, PeptoidError::Valence(_)));
    }

    #[test]
    fn fixed_counts_are_kept() {
        let mut mol = parse_smiles("c1cc[nH]c1").unwrap();
        sanitize(&mut mol).unwrap();
        assert_eq!(mol.atoms[3].implicit_hydrogens, 1);
        assert!(mol.atoms[3].no_implicit);
    }
}
