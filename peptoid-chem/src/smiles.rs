//! SMILES string parser.

use std::collections::BTreeMap;

use peptoid_core::{PeptoidError, Result};

use crate::element::element_by_symbol;
use crate::molecule::{Bond, BondOrder, MolAtom, Molecule};
use crate::sanitize::assign_hydrogens;

/// Parse a SMILES string into a `Molecule`.
///
/// Stereo markers (`@`, `/`, `\`) and bracket atom-map numbers are accepted
/// and discarded. Implicit hydrogens of organic-subset atoms follow the
/// default valence rules; bracket atoms keep the count they spell out.
pub fn parse_smiles(smiles: &str) -> Result<Molecule> {
    parse_smiles_named(smiles, "")
}

/// Parse a SMILES string into a `Molecule` with a given name.
pub fn parse_smiles_named(smiles: &str, name: &str) -> Result<Molecule> {
    let smiles = smiles.trim();
    if smiles.is_empty() {
        return Err(PeptoidError::Parse("empty SMILES".into()));
    }
    let mut parser = SmilesParser::new(smiles);
    parser.parse()?;
    parser.finish()?;
    let mut mol = Molecule::new(name.to_string(), parser.atoms, parser.bonds);
    assign_hydrogens(&mut mol);
    Ok(mol)
}

struct SmilesParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<MolAtom>,
    bonds: Vec<Bond>,
    /// ring_closures[digit] = (atom_idx, bond written at the opening)
    ring_closures: BTreeMap<u16, (usize, Option<BondOrder>)>,
    /// Branch points
    stack: Vec<usize>,
    prev_atom: Option<usize>,
    pending_bond: Option<BondOrder>,
}

impl<'a> SmilesParser<'a> {
    fn new(input: &'a str) -> Self {
        SmilesParser {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            ring_closures: BTreeMap::new(),
            stack: Vec::new(),
            prev_atom: None,
            pending_bond: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, msg: impl std::fmt::Display) -> PeptoidError {
        PeptoidError::Parse(format!("{msg} at position {}", self.pos))
    }

    fn parse(&mut self) -> Result<()> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    let prev = self
                        .prev_atom
                        .ok_or_else(|| self.error("branch without preceding atom"))?;
                    if self.pending_bond.is_some() {
                        return Err(self.error("bond before '('"));
                    }
                    self.advance();
                    self.stack.push(prev);
                }
                b')' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("dangling bond before ')'"));
                    }
                    let top = self.stack.pop().ok_or_else(|| self.error("unmatched ')'"))?;
                    self.advance();
                    self.prev_atom = Some(top);
                }
                b'-' | b'=' | b'#' | b':' | b'/' | b'\\' => {
                    if self.prev_atom.is_none() {
                        return Err(self.error("bond without preceding atom"));
                    }
                    if self.pending_bond.is_some() {
                        return Err(self.error("two consecutive bond symbols"));
                    }
                    self.advance();
                    self.pending_bond = match ch {
                        b'=' => Some(BondOrder::Double),
                        b'#' => Some(BondOrder::Triple),
                        b':' => Some(BondOrder::Aromatic),
                        b'-' => Some(BondOrder::Single),
                        // directional bonds are plain bonds without stereo
                        _ => None,
                    };
                }
                b'%' => {
                    self.advance();
                    let ring_num = self.parse_two_digit_ring()?;
                    self.handle_ring_closure(ring_num)?;
                }
                b'[' => self.parse_bracket_atom()?,
                b'0'..=b'9' => {
                    self.advance();
                    self.handle_ring_closure((ch - b'0') as u16)?;
                }
                b'.' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("dangling bond before '.'"));
                    }
                    if !self.stack.is_empty() {
                        return Err(self.error("'.' inside a branch"));
                    }
                    self.advance();
                    self.prev_atom = None;
                }
                _ if is_organic_atom_start(ch) => self.parse_organic_atom()?,
                _ => {
                    return Err(self.error(format!("unexpected character '{}'", ch as char)));
                }
            }
        }
        Ok(())
    }

    fn parse_organic_atom(&mut self) -> Result<()> {
        let Some(ch) = self.advance() else {
            return Err(self.error("expected atom"));
        };
        let is_aromatic = ch.is_ascii_lowercase();
        let symbol = match ch {
            b'B' if self.peek() == Some(b'r') => {
                self.advance();
                "Br"
            }
            b'C' if self.peek() == Some(b'l') => {
                self.advance();
                "Cl"
            }
            b'B' | b'b' => "B",
            b'C' | b'c' => "C",
            b'N' | b'n' => "N",
            b'O' | b'o' => "O",
            b'P' | b'p' => "P",
            b'S' | b's' => "S",
            b'F' => "F",
            b'I' => "I",
            _ => return Err(self.error(format!("unknown organic atom '{}'", ch as char))),
        };
        let elem = element_by_symbol(symbol)
            .ok_or_else(|| self.error(format!("unknown element '{symbol}'")))?;
        let mut atom = MolAtom::new(elem.atomic_number);
        atom.is_aromatic = is_aromatic;
        self.push_atom(atom)
    }

    fn parse_bracket_atom(&mut self) -> Result<()> {
        self.advance(); // '['

        let isotope = self.parse_optional_number();

        let ch = self
            .advance()
            .ok_or_else(|| self.error("unexpected end of SMILES in bracket atom"))?;
        if !ch.is_ascii_alphabetic() {
            return Err(self.error(format!("expected element symbol, found '{}'", ch as char)));
        }
        let is_aromatic = ch.is_ascii_lowercase();
        let upper = ch.to_ascii_uppercase();

        // Two-letter symbols first: "Cl", "Br", and aromatic "se", "as".
        let symbol = match self.peek() {
            Some(next) if next.is_ascii_lowercase() => {
                let two = format!("{}{}", upper as char, next as char);
                if element_by_symbol(&two).is_some() {
                    self.advance();
                    two
                } else {
                    String::from(upper as char)
                }
            }
            _ => String::from(upper as char),
        };
        let elem = element_by_symbol(&symbol)
            .ok_or_else(|| self.error(format!("unknown element '{symbol}'")))?;

        self.skip_chirality();

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.advance();
            hydrogens = match self.peek() {
                Some(d) if d.is_ascii_digit() => {
                    self.advance();
                    d - b'0'
                }
                _ => 1,
            };
        }

        let charge = self.parse_charge()?;

        // Atom class, e.g. [CH3:7]
        if self.peek() == Some(b':') {
            self.advance();
            if self.parse_optional_number().is_none() {
                return Err(self.error("expected atom class after ':'"));
            }
        }

        if self.advance() != Some(b']') {
            return Err(self.error("expected ']' in bracket atom"));
        }

        let mut atom = MolAtom::new(elem.atomic_number);
        atom.isotope = isotope.map(|n| n.min(u16::MAX as u32) as u16);
        atom.is_aromatic = is_aromatic;
        atom.formal_charge = charge;
        atom.implicit_hydrogens = hydrogens;
        atom.no_implicit = true;
        self.push_atom(atom)
    }

    fn skip_chirality(&mut self) {
        if self.peek() != Some(b'@') {
            return;
        }
        while self.peek() == Some(b'@') {
            self.advance();
        }
        // Extended classes such as @TH1 or @OH12
        let rest = &self.input[self.pos..];
        if rest.len() >= 2 && matches!(&rest[..2], b"TH" | b"AL" | b"SP" | b"TB" | b"OH") {
            self.pos += 2;
            while matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                self.advance();
            }
        }
    }

    fn parse_charge(&mut self) -> Result<i8> {
        let sign = match self.peek() {
            Some(b'+') => 1i8,
            Some(b'-') => -1i8,
            _ => return Ok(0),
        };
        let sign_char = if sign > 0 { b'+' } else { b'-' };
        self.advance();
        if let Some(d) = self.peek().filter(u8::is_ascii_digit) {
            self.advance();
            return Ok(sign * (d - b'0') as i8);
        }
        let mut count = 1i8;
        while self.peek() == Some(sign_char) {
            self.advance();
            count += 1;
            if count > 9 {
                return Err(self.error("charge out of range"));
            }
        }
        Ok(sign * count)
    }

    fn parse_optional_number(&mut self) -> Option<u32> {
        let mut n: u32 = 0;
        let mut found = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.advance();
                n = n.saturating_mul(10).saturating_add((ch - b'0') as u32);
                found = true;
            } else {
                break;
            }
        }
        found.then_some(n)
    }

    fn parse_two_digit_ring(&mut self) -> Result<u16> {
        let d1 = self.advance().ok_or_else(|| self.error("expected digit after '%'"))?;
        let d2 = self
            .advance()
            .ok_or_else(|| self.error("expected second digit after '%'"))?;
        if !d1.is_ascii_digit() || !d2.is_ascii_digit() {
            return Err(self.error("invalid ring closure number after '%'"));
        }
        Ok((d1 - b'0') as u16 * 10 + (d2 - b'0') as u16)
    }

    fn handle_ring_closure(&mut self, ring_num: u16) -> Result<()> {
        let current = self
            .prev_atom
            .ok_or_else(|| self.error("ring closure without preceding atom"))?;

        if let Some((open_atom, open_bond)) = self.ring_closures.remove(&ring_num) {
            if open_atom == current {
                return Err(self.error(format!("ring closure {ring_num} bonds an atom to itself")));
            }
            let written = match (open_bond, self.pending_bond.take()) {
                (Some(a), Some(b)) if a != b => {
                    return Err(self.error(format!("conflicting bonds on ring closure {ring_num}")));
                }
                (a, b) => a.or(b),
            };
            self.add_bond(open_atom, current, written)?;
        } else {
            self.ring_closures
                .insert(ring_num, (current, self.pending_bond.take()));
        }
        Ok(())
    }

    fn push_atom(&mut self, atom: MolAtom) -> Result<()> {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        if let Some(prev) = self.prev_atom {
            let written = self.pending_bond.take();
            self.add_bond(prev, idx, written)?;
        }
        self.pending_bond = None;
        self.prev_atom = Some(idx);
        Ok(())
    }

    fn add_bond(&mut self, a: usize, b: usize, written: Option<BondOrder>) -> Result<()> {
        if self
            .bonds
            .iter()
            .any(|bd| (bd.atom1 == a && bd.atom2 == b) || (bd.atom1 == b && bd.atom2 == a))
        {
            return Err(self.error(format!("duplicate bond between atoms {a} and {b}")));
        }
        let both_aromatic = self.atoms[a].is_aromatic && self.atoms[b].is_aromatic;
        let order = written.unwrap_or(if both_aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        });
        self.bonds.push(Bond::new(a, b, order));
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        if !self.ring_closures.is_empty() {
            let open: Vec<_> = self.ring_closures.keys().collect();
            return Err(PeptoidError::Parse(format!(
                "unmatched ring closure(s): {open:?}"
            )));
        }
        if !self.stack.is_empty() {
            return Err(PeptoidError::Parse(format!(
                "{} unmatched '(' in SMILES",
                self.stack.len()
            )));
        }
        if self.pending_bond.is_some() {
            return Err(PeptoidError::Parse("SMILES ends with a bond".into()));
        }
        Ok(())
    }
}

fn is_organic_atom_start(ch: u8) -> bool {
    matches!(
        ch,
        b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I' | b'b' | b'c' | b'n' | b'o' | b'p' | b's'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_chain() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.atoms[0].implicit_hydrogens, 3);
        assert_eq!(mol.atoms[2].implicit_hydrogens, 1);
    }

    #[test]
    fn parse_branches_and_bonds() {
        let mol = parse_smiles("BrCC(=O)OC(C)(C)C").unwrap();
        assert_eq!(mol.atom_count(), 9);
        assert_eq!(mol.atoms[0].atomic_number, 35);
        assert_eq!(mol.get_bond(2, 3).unwrap().order, BondOrder::Double);
        assert_eq!(mol.degree(5), 4);
    }

    #[test]
    fn parse_aromatic_ring() {
        let mol = parse_smiles("NCc1ccccc1").unwrap();
        assert_eq!(mol.atom_count(), 8);
        assert_eq!(mol.bond_count(), 8);
        assert!(mol.atoms[2].is_aromatic);
        assert_eq!(mol.get_bond(2, 7).unwrap().order, BondOrder::Aromatic);
        assert_eq!(mol.get_bond(1, 2).unwrap().order, BondOrder::Single);
    }

    #[test]
    fn parse_bracket_atoms() {
        let mol = parse_smiles("[13CH3][N+](C)(C)C.[Cl-]").unwrap();
        assert_eq!(mol.atoms[0].isotope, Some(13));
        assert_eq!(mol.atoms[0].implicit_hydrogens, 3);
        assert_eq!(mol.atoms[1].formal_charge, 1);
        assert_eq!(mol.atoms[5].formal_charge, -1);
        assert_eq!(mol.atoms[5].atomic_number, 17);
    }

    #[test]
    fn parse_stereo_and_atom_class_are_dropped() {
        let mol = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        assert_eq!(mol.atoms[1].implicit_hydrogens, 1);
        let mol = parse_smiles("F/C=C/F").unwrap();
        assert_eq!(mol.bond_count(), 3);
        let mol = parse_smiles("[CH3:1][OH:2]").unwrap();
        assert_eq!(mol.atom_count(), 2);
    }

    #[test]
    fn parse_percent_ring_closure() {
        let mol = parse_smiles("C%10CCCCC%10").unwrap();
        assert_eq!(mol.bond_count(), 6);
    }

    #[test]
    fn parse_pyrrole_nh() {
        let mol = parse_smiles("c1cc[nH]c1").unwrap();
        assert!(mol.atoms[3].no_implicit);
        assert_eq!(mol.atoms[3].implicit_hydrogens, 1);
    }

    #[test]
    fn parse_errors() {
        for bad in ["", "C(", "C)", "C1CC", "C[Xx]", "=C", "CC=", "C11", "C%1", "C$", "[C"] {
            assert!(parse_smiles(bad).is_err(), "expected error for {bad:?}");
        }
    }

    #[test]
    fn parse_named() {
        let mol = parse_smiles_named("N", "glycine-amine").unwrap();
        assert_eq!(mol.name, "glycine-amine");
        assert_eq!(mol.atoms[0].implicit_hydrogens, 3);
    }
}
