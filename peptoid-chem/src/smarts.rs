//! SMARTS pattern parsing and substructure matching.
//!
//! SMARTS extends SMILES with atom/bond query primitives and logical operators.
//! Operator precedence follows Daylight: `!` binds tightest, then `&` and
//! juxtaposition, then `,`, then `;`.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashSet};

use peptoid_core::{PeptoidError, Result};

use crate::element::element_by_symbol;
use crate::molecule::{BondOrder, Molecule};
use crate::ring::RingInfo;

/// Upper bound on the matches collected by a single search.
pub const MAX_MATCHES: usize = 10_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A primitive atom query in SMARTS.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomPrimitive {
    /// Any atom (`*`).
    Any,
    /// Aromatic atoms (`a`).
    Aromatic,
    /// Aliphatic atoms (`A`).
    Aliphatic,
    /// Atomic number regardless of aromaticity (`#6`).
    AtomicNum(u8),
    /// Element symbol; uppercase is aliphatic, lowercase aromatic (`C`, `n`).
    Element { atomic_number: u8, aromatic: bool },
    /// Explicit connections (`D2`).
    Degree(u8),
    /// Total hydrogen count (`H1`).
    TotalHCount(u8),
    /// Implicit hydrogen count (`h1`).
    ImplicitHCount(u8),
    /// Connections including hydrogens (`X3`).
    Connectivity(u8),
    /// Total bond order including hydrogens (`v4`).
    Valence(u8),
    /// `R` alone means "in a ring"; `Rn` is the number of SSSR rings.
    RingMembership(Option<u8>),
    /// `r` alone means "in a ring"; `rn` is the smallest ring size.
    RingSize(Option<u8>),
    /// Formal charge (`+`, `-2`).
    Charge(i8),
    /// Mass number (`13`).
    Isotope(u16),
    /// Recursive SMARTS (`$(...)`), anchored at its first atom.
    Recursive(Box<SmartsPattern>),
}

/// A logical atom expression in SMARTS.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomExpr {
    Prim(AtomPrimitive),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
    Not(Box<AtomExpr>),
}

/// A bond expression in SMARTS.
#[derive(Debug, Clone, PartialEq)]
pub enum BondExpr {
    Single,
    Double,
    Triple,
    Aromatic,
    Ring,
    Any,
    /// The bond written as nothing: single or aromatic.
    SingleOrAromatic,
    Not(Box<BondExpr>),
    And(Vec<BondExpr>),
    Or(Vec<BondExpr>),
}

/// A single atom in a SMARTS pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartsAtom {
    pub expr: AtomExpr,
    /// Atom-map number (`[C:1]`).
    pub map: Option<u32>,
}

/// A bond between two atoms in a SMARTS pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartsBond {
    pub atom1: usize,
    pub atom2: usize,
    pub expr: BondExpr,
}

/// A parsed SMARTS pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartsPattern {
    pub atoms: Vec<SmartsAtom>,
    pub bonds: Vec<SmartsBond>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

/// A match of a pattern in a target: `atoms[p]` is the target atom matched
/// by pattern atom `p`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SmartsMatch {
    pub atoms: Vec<usize>,
}

impl SmartsMatch {
    /// Matched target atoms in ascending order.
    pub fn atom_set(&self) -> Vec<usize> {
        let mut set = self.atoms.clone();
        set.sort_unstable();
        set
    }
}

impl SmartsAtom {
    /// Primitives that must all hold, i.e. those reachable through `&`/`;` only.
    fn required(&self) -> Vec<&AtomPrimitive> {
        fn collect<'e>(expr: &'e AtomExpr, out: &mut Vec<&'e AtomPrimitive>) {
            match expr {
                AtomExpr::Prim(p) => out.push(p),
                AtomExpr::And(terms) => terms.iter().for_each(|t| collect(t, out)),
                AtomExpr::Or(_) | AtomExpr::Not(_) => {}
            }
        }
        let mut out = Vec::new();
        collect(&self.expr, &mut out);
        out
    }

    /// Element the atom requires, with its aromaticity when the symbol fixes it.
    pub fn element(&self) -> Option<(u8, Option<bool>)> {
        self.required().into_iter().find_map(|p| match p {
            AtomPrimitive::Element { atomic_number, aromatic } => {
                Some((*atomic_number, Some(*aromatic)))
            }
            AtomPrimitive::AtomicNum(z) => Some((*z, None)),
            _ => None,
        })
    }

    /// Formal charge the atom requires, if any.
    pub fn charge(&self) -> Option<i8> {
        self.required().into_iter().find_map(|p| match p {
            AtomPrimitive::Charge(c) => Some(*c),
            _ => None,
        })
    }

    /// Hydrogen count the atom requires, if any.
    pub fn hydrogen_count(&self) -> Option<u8> {
        self.required().into_iter().find_map(|p| match p {
            AtomPrimitive::TotalHCount(h) | AtomPrimitive::ImplicitHCount(h) => Some(*h),
            _ => None,
        })
    }

    /// Mass number the atom requires, if any.
    pub fn isotope(&self) -> Option<u16> {
        self.required().into_iter().find_map(|p| match p {
            AtomPrimitive::Isotope(m) => Some(*m),
            _ => None,
        })
    }
}

impl SmartsBond {
    /// The concrete bond order this bond spells out, if it is a plain order.
    pub fn order(&self) -> Option<BondOrder> {
        match self.expr {
            BondExpr::Single => Some(BondOrder::Single),
            BondExpr::Double => Some(BondOrder::Double),
            BondExpr::Triple => Some(BondOrder::Triple),
            BondExpr::Aromatic => Some(BondOrder::Aromatic),
            _ => None,
        }
    }
}

impl SmartsPattern {
    fn new(atoms: Vec<SmartsAtom>, bonds: Vec<SmartsBond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bi, bond) in bonds.iter().enumerate() {
            adjacency[bond.atom1].push((bond.atom2, bi));
            adjacency[bond.atom2].push((bond.atom1, bi));
        }
        SmartsPattern { atoms, bonds, adjacency }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Index of the pattern bond joining two pattern atoms, if any.
    pub fn bond_between(&self, a1: usize, a2: usize) -> Option<usize> {
        self.adjacency[a1]
            .iter()
            .find(|&&(n, _)| n == a2)
            .map(|&(_, bi)| bi)
    }

    /// Index of the atom carrying a given map number.
    pub fn atom_with_map(&self, map: u32) -> Option<usize> {
        self.atoms.iter().position(|a| a.map == Some(map))
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a SMARTS string into a pattern.
pub fn parse_smarts(smarts: &str) -> Result<SmartsPattern> {
    let smarts = smarts.trim();
    if smarts.is_empty() {
        return Err(PeptoidError::Parse("empty SMARTS string".into()));
    }
    let mut parser = SmartsParser::new(smarts);
    parser.parse()?;
    parser.finish()?;
    Ok(SmartsPattern::new(parser.atoms, parser.bonds))
}

struct SmartsParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<SmartsAtom>,
    bonds: Vec<SmartsBond>,
    stack: Vec<usize>,
    prev_atom: Option<usize>,
    pending_bond: Option<BondExpr>,
    ring_closures: BTreeMap<u16, (usize, Option<BondExpr>)>,
}

impl<'a> SmartsParser<'a> {
    fn new(input: &'a str) -> Self {
        SmartsParser {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            stack: Vec::new(),
            prev_atom: None,
            pending_bond: None,
            ring_closures: BTreeMap::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn error(&self, msg: impl std::fmt::Display) -> PeptoidError {
        PeptoidError::Parse(format!("SMARTS: {msg} at position {}", self.pos))
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
                b'.' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("dangling bond before '.'"));
                    }
                    self.advance();
                    self.prev_atom = None;
                }
                b'%' => {
                    self.advance();
                    let d1 = self.advance().filter(u8::is_ascii_digit);
                    let d2 = self.advance().filter(u8::is_ascii_digit);
                    let (Some(d1), Some(d2)) = (d1, d2) else {
                        return Err(self.error("expected two digits after '%'"));
                    };
                    self.handle_ring_closure((d1 - b'0') as u16 * 10 + (d2 - b'0') as u16)?;
                }
                b'0'..=b'9' => {
                    self.advance();
                    self.handle_ring_closure((ch - b'0') as u16)?;
                }
                b'[' => {
                    self.advance();
                    let atom = self.parse_bracket_atom()?;
                    self.push_atom(atom)?;
                }
                _ if is_bond_start(ch) => {
                    if self.prev_atom.is_none() {
                        return Err(self.error("bond without preceding atom"));
                    }
                    if self.pending_bond.is_some() {
                        return Err(self.error("two consecutive bond expressions"));
                    }
                    let expr = self.parse_bond_low()?;
                    self.pending_bond = Some(expr);
                }
                _ => {
                    let expr = self.parse_organic_atom()?;
                    self.push_atom(SmartsAtom { expr, map: None })?;
                }
            }
        }
        Ok(())
    }

    fn push_atom(&mut self, atom: SmartsAtom) -> Result<()> {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        if let Some(prev) = self.prev_atom {
            let expr = self.pending_bond.take().unwrap_or(BondExpr::SingleOrAromatic);
            self.bonds.push(SmartsBond { atom1: prev, atom2: idx, expr });
        }
        self.prev_atom = Some(idx);
        Ok(())
    }

    fn handle_ring_closure(&mut self, ring_num: u16) -> Result<()> {
        let current = self
            .prev_atom
            .ok_or_else(|| self.error("ring closure without preceding atom"))?;
        if let Some((open_atom, open_bond)) = self.ring_closures.remove(&ring_num) {
            if open_atom == current {
                return Err(self.error("ring closure bonds an atom to itself"));
            }
            let expr = self
                .pending_bond
                .take()
                .or(open_bond)
                .unwrap_or(BondExpr::SingleOrAromatic);
            self.bonds.push(SmartsBond { atom1: open_atom, atom2: current, expr });
        } else {
            let bond = self.pending_bond.take();
            self.ring_closures.insert(ring_num, (current, bond));
        }
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        if !self.ring_closures.is_empty() {
            let open: Vec<_> = self.ring_closures.keys().collect();
            return Err(PeptoidError::Parse(format!(
                "SMARTS: unmatched ring closure(s): {open:?}"
            )));
        }
        if !self.stack.is_empty() {
            return Err(PeptoidError::Parse("SMARTS: unmatched '('".into()));
        }
        if self.pending_bond.is_some() {
            return Err(PeptoidError::Parse("SMARTS: pattern ends with a bond".into()));
        }
        Ok(())
    }

    /// Atoms written outside brackets.
    fn parse_organic_atom(&mut self) -> Result<AtomExpr> {
        let ch = self.advance().ok_or_else(|| self.error("expected atom"))?;
        let prim = match ch {
            b'*' => AtomPrimitive::Any,
            b'a' => AtomPrimitive::Aromatic,
            b'A' => AtomPrimitive::Aliphatic,
            b'B' if self.peek() == Some(b'r') => {
                self.advance();
                element_prim("Br", false)?
            }
            b'C' if self.peek() == Some(b'l') => {
                self.advance();
                element_prim("Cl", false)?
            }
            b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I' => {
                element_prim(&(ch as char).to_string(), false)?
            }
            b'b' | b'c' | b'n' | b'o' | b'p' | b's' => {
                element_prim(&(ch.to_ascii_uppercase() as char).to_string(), true)?
            }
            _ => return Err(self.error(format!("unexpected character '{}'", ch as char))),
        };
        Ok(AtomExpr::Prim(prim))
    }

    /// Bracket atom body; the opening '[' is already consumed.
    fn parse_bracket_atom(&mut self) -> Result<SmartsAtom> {
        let expr = match self.bracket_hydrogen() {
            Some(expr) => expr,
            None => self.parse_atom_low()?,
        };
        let mut map = None;
        if self.peek() == Some(b':') {
            self.advance();
            map = Some(
                self.parse_number()
                    .ok_or_else(|| self.error("expected atom-map number after ':'"))?,
            );
        }
        if self.advance() != Some(b']') {
            return Err(self.error("expected ']'"));
        }
        Ok(SmartsAtom { expr, map })
    }

    /// `[H]`, `[2H]`, `[H+]`: a hydrogen atom rather than a hydrogen count.
    fn bracket_hydrogen(&mut self) -> Option<AtomExpr> {
        let mut offset = 0;
        while matches!(self.peek_at(offset), Some(d) if d.is_ascii_digit()) {
            offset += 1;
        }
        if self.peek_at(offset) != Some(b'H')
            || !matches!(self.peek_at(offset + 1), Some(b']' | b'+' | b'-' | b':'))
        {
            return None;
        }
        let isotope = self.parse_number();
        self.advance(); // 'H'
        let mut terms = vec![AtomExpr::Prim(AtomPrimitive::AtomicNum(1))];
        if let Some(mass) = isotope {
            terms.push(AtomExpr::Prim(AtomPrimitive::Isotope(mass.min(u16::MAX as u32) as u16)));
        }
        if let Some(charge) = self.parse_charge() {
            terms.push(AtomExpr::Prim(AtomPrimitive::Charge(charge)));
        }
        Some(if terms.len() == 1 { terms.remove(0) } else { AtomExpr::And(terms) })
    }

    fn parse_atom_low(&mut self) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_atom_or()?];
        while self.peek() == Some(b';') {
            self.advance();
            terms.push(self.parse_atom_or()?);
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn parse_atom_or(&mut self) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_atom_and()?];
        while self.peek() == Some(b',') {
            self.advance();
            terms.push(self.parse_atom_and()?);
        }
        Ok(collapse(terms, AtomExpr::Or))
    }

    fn parse_atom_and(&mut self) -> Result<AtomExpr> {
        let mut terms = vec![self.parse_atom_not()?];
        loop {
            match self.peek() {
                Some(b'&') => {
                    self.advance();
                    terms.push(self.parse_atom_not()?);
                }
                Some(b']' | b';' | b',' | b':') | None => break,
                Some(_) => terms.push(self.parse_atom_not()?),
            }
        }
        Ok(collapse(terms, AtomExpr::And))
    }

    fn parse_atom_not(&mut self) -> Result<AtomExpr> {
        if self.peek() == Some(b'!') {
            self.advance();
            return Ok(AtomExpr::Not(Box::new(self.parse_atom_not()?)));
        }
        Ok(AtomExpr::Prim(self.parse_atom_primitive()?))
    }

    fn parse_atom_primitive(&mut self) -> Result<AtomPrimitive> {
        let ch = self
            .peek()
            .ok_or_else(|| self.error("unexpected end inside bracket atom"))?;
        let prim = match ch {
            b'*' => {
                self.advance();
                AtomPrimitive::Any
            }
            b'#' => {
                self.advance();
                let n = self
                    .parse_number()
                    .ok_or_else(|| self.error("expected atomic number after '#'"))?;
                AtomPrimitive::AtomicNum(n.min(u8::MAX as u32) as u8)
            }
            b'$' => {
                self.advance();
                AtomPrimitive::Recursive(Box::new(self.parse_recursive()?))
            }
            b'+' | b'-' => match self.parse_charge() {
                Some(c) => AtomPrimitive::Charge(c),
                None => return Err(self.error("malformed charge")),
            },
            b'0'..=b'9' => {
                let n = self.parse_number().unwrap_or(0);
                AtomPrimitive::Isotope(n.min(u16::MAX as u32) as u16)
            }
            b'@' => {
                // Chirality is not matched.
                while matches!(self.peek(), Some(b'@' | b'?')) {
                    self.advance();
                }
                AtomPrimitive::Any
            }
            b'D' => self.counted(AtomPrimitive::Degree),
            b'H' => self.counted(AtomPrimitive::TotalHCount),
            b'h' => self.counted(AtomPrimitive::ImplicitHCount),
            b'X' => self.counted(AtomPrimitive::Connectivity),
            b'v' => self.counted(AtomPrimitive::Valence),
            b'R' => {
                self.advance();
                AtomPrimitive::RingMembership(self.parse_small_number())
            }
            b'r' => {
                self.advance();
                AtomPrimitive::RingSize(self.parse_small_number())
            }
            b'a' => {
                self.advance();
                if self.peek() == Some(b's') {
                    self.advance();
                    element_prim("As", true)?
                } else {
                    AtomPrimitive::Aromatic
                }
            }
            b'A' if self.peek_at(1) == Some(b's') => {
                self.pos += 2;
                element_prim("As", false)?
            }
            b'A' => {
                self.advance();
                AtomPrimitive::Aliphatic
            }
            b'b' | b'c' | b'n' | b'o' | b'p' | b's' => {
                self.advance();
                if ch == b's' && self.peek() == Some(b'e') {
                    self.advance();
                    element_prim("Se", true)?
                } else {
                    element_prim(&(ch.to_ascii_uppercase() as char).to_string(), true)?
                }
            }
            b'A'..=b'Z' => {
                self.advance();
                let one = (ch as char).to_string();
                match self.peek() {
                    Some(next) if next.is_ascii_lowercase() => {
                        let two = format!("{}{}", ch as char, next as char);
                        if element_by_symbol(&two).is_some() {
                            self.advance();
                            element_prim(&two, false)?
                        } else {
                            element_prim(&one, false).map_err(|_| self.error(format!("unknown element '{one}'")))?
                        }
                    }
                    _ => element_prim(&one, false).map_err(|_| self.error(format!("unknown element '{one}'")))?,
                }
            }
            _ => {
                return Err(self.error(format!(
                    "unsupported SMARTS primitive '{}'",
                    ch as char
                )))
            }
        };
        Ok(prim)
    }

    /// Primitive with an optional count that defaults to one.
    fn counted(&mut self, make: fn(u8) -> AtomPrimitive) -> AtomPrimitive {
        self.advance();
        make(self.parse_small_number().unwrap_or(1))
    }

    fn parse_recursive(&mut self) -> Result<SmartsPattern> {
        if self.advance() != Some(b'(') {
            return Err(self.error("expected '(' after '$'"));
        }
        let start = self.pos;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Some(b'(') => depth += 1,
                Some(b')') => depth -= 1,
                Some(_) => {}
                None => return Err(self.error("unterminated recursive SMARTS")),
            }
        }
        let inner = std::str::from_utf8(&self.input[start..self.pos - 1])
            .map_err(|_| self.error("recursive SMARTS is not valid UTF-8"))?;
        parse_smarts(inner)
    }

    fn parse_charge(&mut self) -> Option<i8> {
        let sign = match self.peek() {
            Some(b'+') => 1i8,
            Some(b'-') => -1i8,
            _ => return None,
        };
        let sign_char = self.advance()?;
        if let Some(n) = self.parse_small_number() {
            return Some(sign * n.min(9) as i8);
        }
        let mut count = 1i8;
        while self.peek() == Some(sign_char) && count < 9 {
            self.advance();
            count += 1;
        }
        Some(sign * count)
    }

    fn parse_number(&mut self) -> Option<u32> {
        let mut n: u32 = 0;
        let mut found = false;
        while let Some(ch) = self.peek().filter(u8::is_ascii_digit) {
            self.advance();
            n = n.saturating_mul(10).saturating_add((ch - b'0') as u32);
            found = true;
        }
        found.then_some(n)
    }

    fn parse_small_number(&mut self) -> Option<u8> {
        self.parse_number().map(|n| n.min(u8::MAX as u32) as u8)
    }

    fn parse_bond_low(&mut self) -> Result<BondExpr> {
        let mut terms = vec![self.parse_bond_or()?];
        while self.peek() == Some(b';') {
            self.advance();
            terms.push(self.parse_bond_or()?);
        }
        Ok(collapse(terms, BondExpr::And))
    }

    fn parse_bond_or(&mut self) -> Result<BondExpr> {
        let mut terms = vec![self.parse_bond_and()?];
        while self.peek() == Some(b',') {
            self.advance();
            terms.push(self.parse_bond_and()?);
        }
        Ok(collapse(terms, BondExpr::Or))
    }

    fn parse_bond_and(&mut self) -> Result<BondExpr> {
        let mut terms = vec![self.parse_bond_not()?];
        loop {
            match self.peek() {
                Some(b'&') => {
                    self.advance();
                    terms.push(self.parse_bond_not()?);
                }
                Some(ch) if is_bond_primitive(ch) || ch == b'!' => {
                    terms.push(self.parse_bond_not()?);
                }
                _ => break,
            }
        }
        Ok(collapse(terms, BondExpr::And))
    }

    fn parse_bond_not(&mut self) -> Result<BondExpr> {
        if self.peek() == Some(b'!') {
            self.advance();
            return Ok(BondExpr::Not(Box::new(self.parse_bond_not()?)));
        }
        let ch = self.advance().ok_or_else(|| self.error("expected bond"))?;
        Ok(match ch {
            b'-' | b'/' | b'\\' => BondExpr::Single,
            b'=' => BondExpr::Double,
            b'#' => BondExpr::Triple,
            b':' => BondExpr::Aromatic,
            b'~' => BondExpr::Any,
            b'@' => BondExpr::Ring,
            _ => return Err(self.error(format!("unexpected bond symbol '{}'", ch as char))),
        })
    }
}

fn collapse<T>(mut terms: Vec<T>, join: fn(Vec<T>) -> T) -> T {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        join(terms)
    }
}

fn element_prim(symbol: &str, aromatic: bool) -> Result<AtomPrimitive> {
    let elem = element_by_symbol(symbol)
        .ok_or_else(|| PeptoidError::Parse(format!("SMARTS: unknown element '{symbol}'")))?;
    Ok(AtomPrimitive::Element {
        atomic_number: elem.atomic_number,
        aromatic,
    })
}

fn is_bond_primitive(ch: u8) -> bool {
    matches!(ch, b'-' | b'=' | b'#' | b':' | b'~' | b'@' | b'/' | b'\\')
}

fn is_bond_start(ch: u8) -> bool {
    is_bond_primitive(ch) || ch == b'!'
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Check if any substructure of `target` matches the SMARTS `pattern`.
pub fn smarts_match(target: &Molecule, pattern: &SmartsPattern) -> bool {
    let ctx = MatchContext::new(target);
    let opts = SearchOptions {
        limit: 1,
        ..SearchOptions::default()
    };
    !search(&ctx, pattern, opts).is_empty()
}

/// Find the matches of `pattern` in `target`, one per distinct set of target
/// atoms. Matches come in ascending target-index order of the first pattern
/// atom, then the second, and so on.
pub fn smarts_find_all(target: &Molecule, pattern: &SmartsPattern) -> Vec<SmartsMatch> {
    let ctx = MatchContext::new(target);
    search(&ctx, pattern, SearchOptions::default())
}

/// Matches that avoid atoms flagged `protected`, as the reaction engine needs.
pub(crate) fn find_unprotected(
    target: &Molecule,
    pattern: &SmartsPattern,
    limit: usize,
) -> Vec<SmartsMatch> {
    let ctx = MatchContext::new(target);
    let opts = SearchOptions {
        limit,
        skip_protected: true,
        unique: true,
    };
    search(&ctx, pattern, opts)
}

#[derive(Debug, Clone, Copy)]
struct SearchOptions {
    limit: usize,
    skip_protected: bool,
    unique: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            limit: MAX_MATCHES,
            skip_protected: false,
            unique: true,
        }
    }
}

/// Target molecule plus lazily computed ring data.
struct MatchContext<'a> {
    target: &'a Molecule,
    rings: OnceCell<RingInfo>,
}

impl<'a> MatchContext<'a> {
    fn new(target: &'a Molecule) -> Self {
        MatchContext {
            target,
            rings: OnceCell::new(),
        }
    }

    fn rings(&self) -> &RingInfo {
        self.rings.get_or_init(|| RingInfo::new(self.target))
    }
}

fn search(ctx: &MatchContext<'_>, pattern: &SmartsPattern, opts: SearchOptions) -> Vec<SmartsMatch> {
    let mut state = Vf2State::new(ctx, pattern, opts);
    state.run(None);
    state.matches
}

/// Whether `pattern` matches with its first atom on `atom_idx`.
fn anchored_match(ctx: &MatchContext<'_>, pattern: &SmartsPattern, atom_idx: usize) -> bool {
    let opts = SearchOptions {
        limit: 1,
        ..SearchOptions::default()
    };
    let mut state = Vf2State::new(ctx, pattern, opts);
    state.run(Some(atom_idx));
    !state.matches.is_empty()
}

fn eval_atom_expr(expr: &AtomExpr, ctx: &MatchContext<'_>, atom_idx: usize) -> bool {
    match expr {
        AtomExpr::Prim(prim) => eval_atom_prim(prim, ctx, atom_idx),
        AtomExpr::And(terms) => terms.iter().all(|t| eval_atom_expr(t, ctx, atom_idx)),
        AtomExpr::Or(terms) => terms.iter().any(|t| eval_atom_expr(t, ctx, atom_idx)),
        AtomExpr::Not(inner) => !eval_atom_expr(inner, ctx, atom_idx),
    }
}

fn eval_atom_prim(prim: &AtomPrimitive, ctx: &MatchContext<'_>, atom_idx: usize) -> bool {
    let mol = ctx.target;
    let atom = &mol.atoms[atom_idx];
    match prim {
        AtomPrimitive::Any => true,
        AtomPrimitive::Aromatic => atom.is_aromatic,
        AtomPrimitive::Aliphatic => !atom.is_aromatic,
        AtomPrimitive::AtomicNum(z) => atom.atomic_number == *z,
        AtomPrimitive::Element { atomic_number, aromatic } => {
            atom.atomic_number == *atomic_number && atom.is_aromatic == *aromatic
        }
        AtomPrimitive::Degree(d) => mol.degree(atom_idx) == *d as usize,
        AtomPrimitive::TotalHCount(h) => mol.total_hydrogens(atom_idx) == *h,
        AtomPrimitive::ImplicitHCount(h) => atom.implicit_hydrogens == *h,
        AtomPrimitive::Connectivity(x) => {
            mol.degree(atom_idx) + atom.implicit_hydrogens as usize == *x as usize
        }
        AtomPrimitive::Valence(v) => {
            let total = mol.bond_valence(atom_idx)
                + u8::from(atom.is_aromatic)
                + atom.implicit_hydrogens;
            total == *v
        }
        AtomPrimitive::RingMembership(None) | AtomPrimitive::RingSize(None) => {
            ctx.rings().atom_in_ring(atom_idx)
        }
        AtomPrimitive::RingMembership(Some(0)) | AtomPrimitive::RingSize(Some(0)) => {
            !ctx.rings().atom_in_ring(atom_idx)
        }
        AtomPrimitive::RingMembership(Some(n)) => ctx.rings().ring_count[atom_idx] == *n as usize,
        AtomPrimitive::RingSize(Some(n)) => ctx.rings().in_ring_of_size(atom_idx, *n as usize),
        AtomPrimitive::Charge(c) => atom.formal_charge == *c,
        AtomPrimitive::Isotope(m) => atom.isotope == Some(*m),
        AtomPrimitive::Recursive(sub) => anchored_match(ctx, sub, atom_idx),
    }
}

fn eval_bond_expr(expr: &BondExpr, ctx: &MatchContext<'_>, bond_idx: usize) -> bool {
    let order = ctx.target.bonds[bond_idx].order;
    match expr {
        BondExpr::Single => order == BondOrder::Single,
        BondExpr::Double => order == BondOrder::Double,
        BondExpr::Triple => order == BondOrder::Triple,
        BondExpr::Aromatic => order == BondOrder::Aromatic,
        BondExpr::SingleOrAromatic => matches!(order, BondOrder::Single | BondOrder::Aromatic),
        BondExpr::Ring => ctx.rings().bond_in_ring[bond_idx],
        BondExpr::Any => true,
        BondExpr::Not(inner) => !eval_bond_expr(inner, ctx, bond_idx),
        BondExpr::And(terms) => terms.iter().all(|t| eval_bond_expr(t, ctx, bond_idx)),
        BondExpr::Or(terms) => terms.iter().any(|t| eval_bond_expr(t, ctx, bond_idx)),
    }
}

// ---------------------------------------------------------------------------
// VF2 subgraph isomorphism
// ---------------------------------------------------------------------------

/// Pattern atoms are matched in index order. Every atom of a parsed pattern
/// except a component's first is bonded to an earlier atom, so candidates
/// come from the neighbours of an already-matched atom.
struct Vf2State<'a, 'c> {
    ctx: &'c MatchContext<'a>,
    pattern: &'c SmartsPattern,
    opts: SearchOptions,
    core_pattern: Vec<Option<usize>>,
    core_target: Vec<bool>,
    seen: HashSet<Vec<usize>>,
    matches: Vec<SmartsMatch>,
}

impl<'a, 'c> Vf2State<'a, 'c> {
    fn new(ctx: &'c MatchContext<'a>, pattern: &'c SmartsPattern, opts: SearchOptions) -> Self {
        Vf2State {
            ctx,
            pattern,
            opts,
            core_pattern: vec![None; pattern.atoms.len()],
            core_target: vec![false; ctx.target.atom_count()],
            seen: HashSet::new(),
            matches: Vec::new(),
        }
    }

    fn done(&self) -> bool {
        self.matches.len() >= self.opts.limit
    }

    fn run(&mut self, anchor: Option<usize>) {
        if self.pattern.atoms.is_empty() || self.pattern.atoms.len() > self.ctx.target.atom_count() {
            return;
        }
        match anchor {
            Some(target_atom) => {
                if self.is_feasible(0, target_atom) {
                    self.assign(0, target_atom);
                    self.match_recursive(1);
                }
            }
            None => self.match_recursive(0),
        }
    }

    fn assign(&mut self, pattern_atom: usize, target_atom: usize) {
        self.core_pattern[pattern_atom] = Some(target_atom);
        self.core_target[target_atom] = true;
    }

    fn unassign(&mut self, pattern_atom: usize, target_atom: usize) {
        self.core_pattern[pattern_atom] = None;
        self.core_target[target_atom] = false;
    }

    fn match_recursive(&mut self, depth: usize) {
        if self.done() {
            return;
        }
        if depth == self.pattern.atoms.len() {
            self.record();
            return;
        }

        for target_atom in self.find_candidates(depth) {
            if self.core_target[target_atom] || !self.is_feasible(depth, target_atom) {
                continue;
            }
            self.assign(depth, target_atom);
            self.match_recursive(depth + 1);
            self.unassign(depth, target_atom);
            if self.done() {
                return;
            }
        }
    }

    fn record(&mut self) {
        let atoms: Vec<usize> = self.core_pattern.iter().flatten().copied().collect();
        if self.opts.unique {
            let mut key = atoms.clone();
            key.sort_unstable();
            if !self.seen.insert(key) {
                return;
            }
        }
        self.matches.push(SmartsMatch { atoms });
    }

    /// Unmatched neighbours of a matched pattern neighbour, ascending; all
    /// atoms when the pattern atom starts a new component.
    fn find_candidates(&self, pattern_atom: usize) -> Vec<usize> {
        let anchor = self.pattern.adjacency[pattern_atom]
            .iter()
            .find_map(|&(p_neighbor, _)| self.core_pattern[p_neighbor]);
        let mut candidates: Vec<usize> = match anchor {
            Some(t_mapped) => self.ctx.target.adjacency[t_mapped]
                .iter()
                .map(|&(n, _)| n)
                .collect(),
            None => (0..self.ctx.target.atom_count()).collect(),
        };
        candidates.retain(|&n| !self.core_target[n]);
        candidates.sort_unstable();
        candidates
    }

    fn is_feasible(&self, pattern_atom: usize, target_atom: usize) -> bool {
        if self.opts.skip_protected && self.ctx.target.atoms[target_atom].protected {
            return false;
        }
        for &(p_neighbor, p_bond_idx) in &self.pattern.adjacency[pattern_atom] {
            if let Some(t_mapped) = self.core_pattern[p_neighbor] {
                match self.ctx.target.bond_index(target_atom, t_mapped) {
                    Some(tbi) => {
                        if !eval_bond_expr(&self.pattern.bonds[p_bond_idx].expr, self.ctx, tbi) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }
        eval_atom_expr(&self.pattern.atoms[pattern_atom].expr, self.ctx, target_atom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
