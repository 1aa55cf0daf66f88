//! Molecular formula and weight.

use std::collections::BTreeMap;

use crate::element::element_by_number;
use crate::molecule::Molecule;

/// Average molecular weight, implicit hydrogens included.
pub fn molecular_weight(mol: &Molecule) -> f64 {
    let h_weight = element_by_number(1).map(|e| e.atomic_weight).unwrap_or(1.008);
    mol.atoms
        .iter()
        .map(|atom| {
            let heavy = element_by_number(atom.atomic_number)
                .map(|e| e.atomic_weight)
                .unwrap_or(0.0);
            heavy + atom.implicit_hydrogens as f64 * h_weight
        })
        .sum()
}

/// Molecular formula in Hill order: C, then H, then the rest alphabetically.
/// Without carbon every element, hydrogen included, is alphabetical.
pub fn molecular_formula(mol: &Molecule) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for atom in &mol.atoms {
        if let Some(elem) = element_by_number(atom.atomic_number) {
            *counts.entry(elem.symbol).or_insert(0) += 1;
        }
        if atom.implicit_hydrogens > 0 {
            *counts.entry("H").or_insert(0) += atom.implicit_hydrogens as usize;
        }
    }

    let mut formula = String::new();
    let mut push = |symbol: &str, count: usize| {
        formula.push_str(symbol);
        if count > 1 {
            formula.push_str(&count.to_string());
        }
    };

    if let Some(c_count) = counts.remove("C") {
        push("C", c_count);
        if let Some(h_count) = counts.remove("H") {
            push("H", h_count);
        }
    }
    for (symbol, count) in counts {
        push(symbol, count);
    }
    formula
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_smiles;

    #[test]
    fn mw_of_water() {
        let mol = parse_smiles("[OH2]").unwrap();
        let mw = molecular_weight(&mol);
        assert!((mw - 18.015).abs() < 0.01, "got {mw}");
    }

    #[test]
    fn formula_hill_order() {
        let mol = parse_smiles("BrCC(=O)OC(C)(C)C").unwrap();
        assert_eq!(molecular_formula(&mol), "C6H11BrO2");
        let mol = parse_smiles("[OH2]").unwrap();
        assert_eq!(molecular_formula(&mol), "H2O");
        let mol = parse_smiles("[Na+].[Cl-]").unwrap();
        assert_eq!(molecular_formula(&mol), "ClNa");
    }

    #[test]
    fn benzylamine() {
        let mol = parse_smiles("NCc1ccccc1").unwrap();
        assert_eq!(molecular_formula(&mol), "C7H9N");
        let mw = molecular_weight(&mol);
        assert!((mw - 107.15).abs() < 0.05, "MW={mw}");
    }
}
