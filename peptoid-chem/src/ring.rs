//! Ring perception: ring bonds, smallest rings per atom, and an SSSR.

use std::collections::VecDeque;

use crate::molecule::Molecule;

/// Per-atom and per-bond ring facts used by SMARTS ring primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingInfo {
    /// Whether each bond lies on a cycle.
    pub bond_in_ring: Vec<bool>,
    /// Size of the smallest ring through each atom.
    pub smallest_ring: Vec<Option<usize>>,
    /// Number of SSSR rings each atom belongs to.
    pub ring_count: Vec<usize>,
}

impl RingInfo {
    pub fn new(mol: &Molecule) -> Self {
        let n = mol.atom_count();
        let mut bond_in_ring = vec![false; mol.bond_count()];
        let mut smallest_ring: Vec<Option<usize>> = vec![None; n];

        for (bi, bond) in mol.bonds.iter().enumerate() {
            if let Some(path) = shortest_path_avoiding(mol, bond.atom1, bond.atom2, bi) {
                bond_in_ring[bi] = true;
                let size = path.len();
                for atom in [bond.atom1, bond.atom2] {
                    let current = smallest_ring[atom].get_or_insert(size);
                    *current = (*current).min(size);
                }
            }
        }

        let mut ring_count = vec![0usize; n];
        for ring in find_sssr(mol) {
            for atom in ring {
                ring_count[atom] += 1;
            }
        }

        RingInfo {
            bond_in_ring,
            smallest_ring,
            ring_count,
        }
    }

    pub fn atom_in_ring(&self, atom_idx: usize) -> bool {
        self.smallest_ring[atom_idx].is_some()
    }

    /// Whether the atom lies on a ring of exactly `size` atoms.
    ///
    /// Only the smallest ring through the atom is considered.
    pub fn in_ring_of_size(&self, atom_idx: usize, size: usize) -> bool {
        self.smallest_ring[atom_idx] == Some(size)
    }
}

/// Find the smallest set of smallest rings (SSSR) in a molecule.
///
/// Each ring is a list of atom indices starting at its smallest index.
pub fn find_sssr(mol: &Molecule) -> Vec<Vec<usize>> {
    let expected = mol.bond_count() as isize - mol.atom_count() as isize
        + count_components(mol) as isize;
    if expected <= 0 {
        return Vec::new();
    }

    let mut rings: Vec<Vec<usize>> = Vec::new();
    for (bi, bond) in mol.bonds.iter().enumerate() {
        if let Some(mut ring) = shortest_path_avoiding(mol, bond.atom1, bond.atom2, bi) {
            normalize_ring(&mut ring);
            if !rings.contains(&ring) {
                rings.push(ring);
            }
        }
    }
    rings.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    rings.truncate(expected as usize);
    rings
}

/// Whether an atom lies on any cycle.
pub fn is_in_ring(mol: &Molecule, atom_idx: usize) -> bool {
    mol.adjacency[atom_idx]
        .iter()
        .any(|&(_, bi)| bond_in_ring(mol, bi))
}

/// Whether a bond lies on any cycle.
pub fn bond_in_ring(mol: &Molecule, bond_idx: usize) -> bool {
    let Some(bond) = mol.bonds.get(bond_idx) else {
        return false;
    };
    shortest_path_avoiding(mol, bond.atom1, bond.atom2, bond_idx).is_some()
}

fn count_components(mol: &Molecule) -> usize {
    let n = mol.atom_count();
    let mut visited = vec![false; n];
    let mut components = 0;

    for start in 0..n {
        if visited[start] {
            continue;
        }
        components += 1;
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(curr) = queue.pop_front() {
            for &(neighbor, _) in &mol.adjacency[curr] {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    components
}

/// BFS from `start` to `end` without crossing `excluded_bond`.
fn shortest_path_avoiding(
    mol: &Molecule,
    start: usize,
    end: usize,
    excluded_bond: usize,
) -> Option<Vec<usize>> {
    let n = mol.atom_count();
    let mut visited = vec![false; n];
    let mut parent = vec![usize::MAX; n];
    let mut queue = VecDeque::from([start]);
    visited[start] = true;

    while let Some(curr) = queue.pop_front() {
        if curr == end {
            let mut path = vec![end];
            let mut node = end;
            while node != start {
                node = parent[node];
                path.push(node);
            }
            path.reverse();
            return Some(path);
        }
        for &(neighbor, bi) in &mol.adjacency[curr] {
            if bi != excluded_bond && !visited[neighbor] {
                visited[neighbor] = true;
                parent[neighbor] = curr;
                queue.push_back(neighbor);
            }
        }
    }

    None
}

/// Rotate a ring to start at its smallest index, then pick the direction
/// with the smaller second element.
fn normalize_ring(ring: &mut [usize]) {
    let Some(min_pos) = ring
        .iter()
        .enumerate()
        .min_by_key(|&(_, &v)| v)
        .map(|(i, _)| i)
    else {
        return;
    };
    ring.rotate_left(min_pos);
    let n = ring.len();
    if n > 2 && ring[n - 1] < ring[1] {
        ring[1..].reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn benzene_one_ring() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        let rings = find_sssr(&mol);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 6);
    }

    #[test]
    fn indole_two_rings() {
        let mol = parse_smiles("c1ccc2[nH]ccc2c1").unwrap();
        let rings = find_sssr(&mol);
        assert_eq!(rings.len(), 2);
        let mut sizes: Vec<_> = rings.iter().map(Vec::len).collect();
        sizes.sort();
        assert_eq!(sizes, vec![5, 6]);

        let info = RingInfo::new(&mol);
        // fusion atoms belong to both rings
        assert_eq!(info.ring_count[3], 2);
        assert!(info.in_ring_of_size(4, 5));
        assert!(info.in_ring_of_size(0, 6));
    }

    #[test]
    fn linker_between_rings_is_acyclic() {
        let mol = parse_smiles("c1ccccc1CCc1ccccc1").unwrap();
        let info = RingInfo::new(&mol);
        assert!(!info.atom_in_ring(6));
        assert!(!info.atom_in_ring(7));
        assert!(info.atom_in_ring(5));
        assert!(!bond_in_ring(&mol, 6));
    }

    #[test]
    fn acyclic_no_rings() {
        let mol = parse_smiles("CCCC").unwrap();
        assert!(find_sssr(&mol).is_empty());
        assert!(!is_in_ring(&mol, 0));
        let info = RingInfo::new(&mol);
        assert!(info.ring_count.iter().all(|&c| c == 0));
    }
}
