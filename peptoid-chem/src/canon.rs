//! Canonical SMILES generation.
//!
//! Atoms are ranked by iterative neighbourhood refinement with tie breaking,
//! then written by a depth-first traversal that always visits the lowest
//! ranked neighbour first.
//!
//! # Example
//!
//! ```
//! use peptoid_chem::{canonical_smiles, parse_smiles};
//!
//! let mol1 = parse_smiles("OCC").unwrap();
//! let mol2 = parse_smiles("CCO").unwrap();
//! assert_eq!(canonical_smiles(&mol1), canonical_smiles(&mol2));
//! ```

use crate::element::{element_by_number, is_organic_subset};
use crate::molecule::{BondOrder, Molecule};
use crate::sanitize::default_hydrogens;

/// Generate a canonical SMILES string for the given molecule.
pub fn canonical_smiles(mol: &Molecule) -> String {
    let n = mol.atom_count();
    if n == 0 {
        return String::new();
    }

    let ranks = canonical_ranks(mol);
    let mut walk = Traversal::new(mol);
    let mut starts = Vec::new();
    loop {
        let start = (0..n).filter(|&i| !walk.visited[i]).min_by_key(|&i| ranks[i]);
        let Some(start) = start else { break };
        starts.push(start);
        walk.visit(mol, &ranks, start, None);
    }

    let mut writer = Writer {
        mol,
        walk: &walk,
        ring_digit: vec![0; mol.bond_count()],
        digit_in_use: Vec::new(),
        out: String::new(),
    };
    for (k, &start) in starts.iter().enumerate() {
        if k > 0 {
            writer.out.push('.');
        }
        writer.emit(start);
    }
    writer.out
}

/// Canonical rank of every atom. Ranks are a permutation of `0..n`.
pub fn canonical_ranks(mol: &Molecule) -> Vec<usize> {
    let n = mol.atom_count();
    let invariants: Vec<_> = (0..n)
        .map(|i| {
            let atom = &mol.atoms[i];
            (
                mol.degree(i),
                atom.atomic_number,
                atom.isotope.unwrap_or(0),
                atom.formal_charge,
                atom.implicit_hydrogens,
                atom.is_aromatic,
            )
        })
        .collect();
    let mut classes = dense_rank(&invariants);

    loop {
        classes = refine(mol, classes);
        if count_classes(&classes) == n {
            return classes;
        }
        // Break the lowest tie by promoting its first member.
        let mut seen = vec![0usize; n];
        for &c in &classes {
            seen[c] += 1;
        }
        let Some(tied) = (0..n).find(|&c| seen[c] > 1) else {
            return classes;
        };
        let Some(chosen) = (0..n).find(|&i| classes[i] == tied) else {
            return classes;
        };
        for (i, c) in classes.iter_mut().enumerate() {
            if *c > tied || (*c == tied && i != chosen) {
                *c += 1;
            }
        }
    }
}

/// Split classes by sorted neighbour classes until nothing changes.
fn refine(mol: &Molecule, mut classes: Vec<usize>) -> Vec<usize> {
    let mut distinct = count_classes(&classes);
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = (0..mol.atom_count())
            .map(|i| {
                let mut around: Vec<(usize, u8)> = mol.adjacency[i]
                    .iter()
                    .map(|&(nb, bi)| (classes[nb], mol.bonds[bi].order.code()))
                    .collect();
                around.sort_unstable();
                (classes[i], around)
            })
            .collect();
        let next = dense_rank(&keys);
        let next_distinct = count_classes(&next);
        if next_distinct == distinct {
            return next;
        }
        classes = next;
        distinct = next_distinct;
    }
}

fn dense_rank<T: Ord + Clone>(keys: &[T]) -> Vec<usize> {
    let mut sorted = keys.to_vec();
    sorted.sort();
    sorted.dedup();
    keys.iter()
        .map(|k| sorted.binary_search(k).unwrap_or(0))
        .collect()
}

fn count_classes(classes: &[usize]) -> usize {
    let mut sorted = classes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Spanning tree and ring closures of the depth-first walk.
struct Traversal {
    visited: Vec<bool>,
    /// Tree children of each atom in visiting order.
    children: Vec<Vec<usize>>,
    /// Ring bonds that open at each atom: (bond, far atom).
    opens: Vec<Vec<(usize, usize)>>,
    /// Ring bonds that close at each atom.
    closes: Vec<Vec<usize>>,
    ring_bond: Vec<bool>,
}

impl Traversal {
    fn new(mol: &Molecule) -> Self {
        let n = mol.atom_count();
        Traversal {
            visited: vec![false; n],
            children: vec![Vec::new(); n],
            opens: vec![Vec::new(); n],
            closes: vec![Vec::new(); n],
            ring_bond: vec![false; mol.bond_count()],
        }
    }

    fn visit(&mut self, mol: &Molecule, ranks: &[usize], atom: usize, via: Option<usize>) {
        self.visited[atom] = true;
        let mut neighbors = mol.adjacency[atom].clone();
        neighbors.sort_by_key(|&(nb, _)| ranks[nb]);

        for (nb, bi) in neighbors {
            if Some(bi) == via || self.ring_bond[bi] {
                continue;
            }
            if self.visited[nb] {
                self.ring_bond[bi] = true;
                self.opens[nb].push((bi, atom));
                self.closes[atom].push(bi);
            } else {
                self.children[atom].push(nb);
                self.visit(mol, ranks, nb, Some(bi));
            }
        }
    }
}

struct Writer<'a> {
    mol: &'a Molecule,
    walk: &'a Traversal,
    ring_digit: Vec<usize>,
    digit_in_use: Vec<bool>,
    out: String,
}

impl Writer<'_> {
    fn emit(&mut self, atom: usize) {
        let mol = self.mol;
        let walk = self.walk;
        write_atom(mol, atom, &mut self.out);

        let mut released = Vec::new();
        for &bi in &walk.closes[atom] {
            let digit = self.ring_digit[bi];
            write_ring_number(digit, &mut self.out);
            released.push(digit);
        }
        for &(bi, far) in &walk.opens[atom] {
            let digit = self.take_digit();
            self.ring_digit[bi] = digit;
            self.out.push_str(bond_symbol(mol, atom, far, mol.bonds[bi].order));
            write_ring_number(digit, &mut self.out);
        }
        for digit in released {
            self.digit_in_use[digit] = false;
        }

        let children = &walk.children[atom];
        for (k, &child) in children.iter().enumerate() {
            let branch = k + 1 < children.len();
            if branch {
                self.out.push('(');
            }
            if let Some(bond) = mol.get_bond(atom, child) {
                self.out.push_str(bond_symbol(mol, atom, child, bond.order));
            }
            self.emit(child);
            if branch {
                self.out.push(')');
            }
        }
    }

    /// Lowest ring digit not currently open, starting at 1.
    fn take_digit(&mut self) -> usize {
        let digit = (1..self.digit_in_use.len())
            .find(|&d| !self.digit_in_use[d])
            .unwrap_or_else(|| self.digit_in_use.len().max(1));
        if digit >= self.digit_in_use.len() {
            self.digit_in_use.resize(digit + 1, false);
        }
        self.digit_in_use[digit] = true;
        digit
    }
}

fn write_ring_number(num: usize, output: &mut String) {
    if num < 10 {
        output.push((b'0' + num as u8) as char);
    } else {
        output.push('%');
        output.push_str(&num.to_string());
    }
}

fn bond_symbol(mol: &Molecule, a: usize, b: usize, order: BondOrder) -> &'static str {
    let both_aromatic = mol.atoms[a].is_aromatic && mol.atoms[b].is_aromatic;
    match order {
        BondOrder::Single if both_aromatic => "-",
        BondOrder::Single => "",
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
        BondOrder::Aromatic if both_aromatic => "",
        BondOrder::Aromatic => ":",
    }
}

fn write_atom(mol: &Molecule, atom_idx: usize, output: &mut String) {
    let atom = &mol.atoms[atom_idx];
    let symbol = element_by_number(atom.atomic_number)
        .map(|e| e.symbol)
        .unwrap_or("*");

    let bare = atom.formal_charge == 0
        && atom.isotope.is_none()
        && is_organic_subset(atom.atomic_number, atom.is_aromatic)
        && atom.implicit_hydrogens == default_hydrogens(mol, atom_idx);

    if !bare {
        output.push('[');
        if let Some(iso) = atom.isotope {
            output.push_str(&iso.to_string());
        }
    }
    if atom.is_aromatic {
        output.push_str(&symbol.to_ascii_lowercase());
    } else {
        output.push_str(symbol);
    }
    if bare {
        return;
    }
    if atom.implicit_hydrogens > 0 {
        output.push('H');
        if atom.implicit_hydrogens > 1 {
            output.push_str(&atom.implicit_hydrogens.to_string());
        }
    }
    if atom.formal_charge != 0 {
        output.push(if atom.formal_charge > 0 { '+' } else { '-' });
        let magnitude = atom.formal_charge.unsigned_abs();
        if magnitude > 1 {
            output.push_str(&magnitude.to_string());
        }
    }
    output.push(']');
}
