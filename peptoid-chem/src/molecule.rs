//! Molecular graph representation.

use peptoid_core::hash::sha256;
use peptoid_core::{ContentAddressable, Summarizable};

use crate::canon::canonical_smiles;

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Contribution to the valence of a non-aromatic atom.
    ///
    /// Aromatic bonds count as one here; the extra pi electron of an aromatic
    /// atom is accounted for in [`crate::sanitize::default_hydrogens`].
    pub fn valence_contribution(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    /// Small integer code used in canonical invariants.
    pub(crate) fn code(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }
}

/// An atom in a molecular graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MolAtom {
    pub atomic_number: u8,
    pub formal_charge: i8,
    pub isotope: Option<u16>,
    pub is_aromatic: bool,
    /// Hydrogens attached to this atom that are not graph nodes.
    pub implicit_hydrogens: u8,
    /// The hydrogen count was fixed by a bracket atom or a reaction template
    /// and must not be recomputed from valence.
    pub no_implicit: bool,
    /// Excluded from reaction matching.
    pub protected: bool,
}

impl MolAtom {
    /// A neutral, non-aromatic atom whose hydrogens will be derived from valence.
    pub fn new(atomic_number: u8) -> Self {
        MolAtom {
            atomic_number,
            formal_charge: 0,
            isotope: None,
            is_aromatic: false,
            implicit_hydrogens: 0,
            no_implicit: false,
            protected: false,
        }
    }
}

/// A bond between two atoms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Bond { atom1, atom2, order }
    }

    /// The atom at the other end of the bond from `atom`.
    pub fn other(&self, atom: usize) -> usize {
        if self.atom1 == atom {
            self.atom2
        } else {
            self.atom1
        }
    }
}

/// A molecular graph with atoms, bonds, and adjacency information.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub name: String,
    pub atoms: Vec<MolAtom>,
    pub bonds: Vec<Bond>,
    /// adjacency[atom_idx] = Vec<(neighbor_atom_idx, bond_idx)>
    pub adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    /// Create a new molecule, building the adjacency list from atoms and bonds.
    pub fn new(name: String, atoms: Vec<MolAtom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, bi));
            adjacency[bond.atom2].push((bond.atom1, bi));
        }
        Molecule { name, atoms, bonds, adjacency }
    }

    /// Number of atoms in the graph (implicit hydrogens excluded).
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Number of non-hydrogen atoms.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| a.atomic_number != 1).count()
    }

    /// Neighbor atom indices for a given atom.
    pub fn neighbors(&self, atom_idx: usize) -> Vec<usize> {
        self.adjacency[atom_idx].iter().map(|&(n, _)| n).collect()
    }

    /// Graph degree of an atom (number of explicit bonds).
    pub fn degree(&self, atom_idx: usize) -> usize {
        self.adjacency[atom_idx].len()
    }

    /// Index of the bond between two atoms, if any.
    pub fn bond_index(&self, a1: usize, a2: usize) -> Option<usize> {
        self.adjacency[a1]
            .iter()
            .find(|&&(n, _)| n == a2)
            .map(|&(_, bi)| bi)
    }

    /// Find the bond between two atoms, if any.
    pub fn get_bond(&self, a1: usize, a2: usize) -> Option<&Bond> {
        self.bond_index(a1, a2).map(|bi| &self.bonds[bi])
    }

    /// Sum of bond valence contributions around an atom.
    pub fn bond_valence(&self, atom_idx: usize) -> u8 {
        self.adjacency[atom_idx]
            .iter()
            .map(|&(_, bi)| self.bonds[bi].order.valence_contribution())
            .sum()
    }

    /// Hydrogens on an atom: implicit count plus explicit `[H]` neighbours.
    pub fn total_hydrogens(&self, atom_idx: usize) -> u8 {
        let explicit = self.adjacency[atom_idx]
            .iter()
            .filter(|&&(n, _)| self.atoms[n].atomic_number == 1)
            .count() as u8;
        self.atoms[atom_idx].implicit_hydrogens + explicit
    }

    /// Total hydrogen count (implicit + explicit H atoms).
    pub fn total_hydrogen_count(&self) -> usize {
        let explicit = self.atoms.iter().filter(|a| a.atomic_number == 1).count();
        let implicit: usize = self.atoms.iter().map(|a| a.implicit_hydrogens as usize).sum();
        explicit + implicit
    }

    /// Drop every `protected` mark.
    pub fn clear_protection(&mut self) {
        for atom in &mut self.atoms {
            atom.protected = false;
        }
    }

    /// Canonical SMILES of this molecule.
    pub fn to_smiles(&self) -> String {
        canonical_smiles(self)
    }
}

impl Summarizable for Molecule {
    fn summary(&self) -> String {
        format!(
            "{}: {} atoms, {} bonds",
            if self.name.is_empty() { "Molecule" } else { &self.name },
            self.atom_count(),
            self.bond_count()
        )
    }
}

impl ContentAddressable for Molecule {
    /// Hash of the canonical SMILES, so equal structures hash equally
    /// regardless of atom order.
    fn content_hash(&self) -> String {
        sha256(canonical_smiles(self).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ethanol() -> Molecule {
        let mut c1 = MolAtom::new(6);
        c1.implicit_hydrogens = 3;
        let mut c2 = MolAtom::new(6);
        c2.implicit_hydrogens = 2;
        let mut o = MolAtom::new(8);
        o.implicit_hydrogens = 1;
        let bonds = vec![
            Bond::new(0, 1, BondOrder::Single),
            Bond::new(1, 2, BondOrder::Single),
        ];
        Molecule::new("ethanol".into(), vec![c1, c2, o], bonds)
    }

    #[test]
    fn construction_and_adjacency() {
        let mol = make_ethanol();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.neighbors(1), vec![0, 2]);
        assert_eq!(mol.degree(0), 1);
        assert_eq!(mol.bond_index(2, 1), Some(1));
        assert!(mol.get_bond(0, 2).is_none());
    }

    #[test]
    fn hydrogens_and_valence() {
        let mol = make_ethanol();
        assert_eq!(mol.total_hydrogen_count(), 6);
        assert_eq!(mol.total_hydrogens(2), 1);
        assert_eq!(mol.bond_valence(1), 2);
        assert_eq!(mol.heavy_atom_count(), 3);
    }

    #[test]
    fn bond_other_end() {
        let bond = Bond::new(3, 7, BondOrder::Double);
        assert_eq!(bond.other(3), 7);
        assert_eq!(bond.other(7), 3);
    }

    #[test]
    fn summarizable_and_content_addressable() {
        let mol = make_ethanol();
        assert!(mol.summary().starts_with("ethanol: 3 atoms"));
        let hash = mol.content_hash();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, mol.content_hash());
    }
}
