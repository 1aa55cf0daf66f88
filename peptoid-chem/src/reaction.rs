//! Reaction SMARTS: parsing templates and running them on molecules.
//!
//! A reaction is written `reactants>>products` (an optional agents field
//! between single `>` separators is ignored). Templates on each side are
//! separated by top-level `.`; atom-map numbers tie product atoms to the
//! reactant atoms they came from.

use std::collections::{HashMap, HashSet, VecDeque};

use peptoid_core::{PeptoidError, Result};
use tracing::trace;

use crate::molecule::{Bond, BondOrder, MolAtom, Molecule};
use crate::sanitize::assign_hydrogens;
use crate::smarts::{
    find_unprotected, parse_smarts, smarts_find_all, SmartsAtom, SmartsMatch, SmartsPattern,
    MAX_MATCHES,
};

/// Upper bound on the match combinations `run_reactants` expands.
pub const MAX_PRODUCT_SETS: usize = 1000;

/// A parsed reaction.
#[derive(Debug, Clone)]
pub struct Reaction {
    smirks: String,
    /// One pattern per reactant template.
    pub reactants: Vec<SmartsPattern>,
    /// One pattern per product template.
    pub products: Vec<SmartsPattern>,
}

/// Parse reaction SMARTS (`reactant.reactant>>product`).
///
/// # Example
///
/// ```
/// use peptoid_chem::parse_reaction;
///
/// let rxn = parse_reaction("[C:1](=[O:2])-[OD1].[N!H0:3]>>[C:1](=[O:2])[N:3]").unwrap();
/// assert_eq!(rxn.reactants.len(), 2);
/// assert_eq!(rxn.products.len(), 1);
/// ```
pub fn parse_reaction(smirks: &str) -> Result<Reaction> {
    let smirks = smirks.trim();
    let parts: Vec<&str> = smirks.split('>').collect();
    let (reactant_str, product_str) = match parts.as_slice() {
        [r, _agents, p] => (r.trim(), p.trim()),
        _ => {
            return Err(PeptoidError::Parse(format!(
                "reaction SMARTS must have the form 'reactants>>products': {smirks}"
            )))
        }
    };
    if reactant_str.is_empty() || product_str.is_empty() {
        return Err(PeptoidError::Parse(
            "reaction SMARTS reactant and product sides must not be empty".into(),
        ));
    }

    let reactants = split_templates(reactant_str)
        .into_iter()
        .map(parse_smarts)
        .collect::<Result<Vec<_>>>()?;
    let products = split_templates(product_str)
        .into_iter()
        .map(parse_smarts)
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::new();
    for map in reactants.iter().flat_map(|t| t.atoms.iter().filter_map(|a| a.map)) {
        if !seen.insert(map) {
            return Err(PeptoidError::Parse(format!(
                "atom map {map} used twice among reactant templates"
            )));
        }
    }

    Ok(Reaction {
        smirks: smirks.to_string(),
        reactants,
        products,
    })
}

/// Split one side of a reaction on `.` outside brackets and parentheses.
fn split_templates(side: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    // Recursive SMARTS nests brackets inside brackets.
    let mut bracket = 0i32;
    let mut start = 0;
    for (i, ch) in side.char_indices() {
        match ch {
            '[' => bracket += 1,
            ']' => bracket -= 1,
            '(' if bracket == 0 => depth += 1,
            ')' if bracket == 0 => depth -= 1,
            '.' if bracket == 0 && depth == 0 => {
                parts.push(&side[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&side[start..]);
    parts
}

/// Mark the first atom of every match of `pattern` as protected.
///
/// Returns the number of atoms newly marked.
pub fn protect_matching_atoms(mol: &mut Molecule, pattern: &SmartsPattern) -> usize {
    let mut marked = 0;
    for m in smarts_find_all(mol, pattern) {
        if let Some(&first) = m.atoms.first() {
            if !mol.atoms[first].protected {
                mol.atoms[first].protected = true;
                marked += 1;
            }
        }
    }
    marked
}

impl Reaction {
    /// The reaction SMARTS this reaction was parsed from.
    pub fn smirks(&self) -> &str {
        &self.smirks
    }

    /// Run the reaction on one molecule per reactant template.
    ///
    /// Returns one product set per combination of template matches, in match
    /// order with the last reactant varying fastest. Atoms flagged
    /// `protected` never take part in a match. An empty result means some
    /// template did not match.
    pub fn run_reactants(&self, reactants: &[&Molecule]) -> Result<Vec<Vec<Molecule>>> {
        if reactants.len() != self.reactants.len() {
            return Err(PeptoidError::Reaction(format!(
                "reaction expects {} reactants, got {}",
                self.reactants.len(),
                reactants.len()
            )));
        }

        let per_template: Vec<Vec<SmartsMatch>> = self
            .reactants
            .iter()
            .zip(reactants)
            .map(|(template, mol)| find_unprotected(mol, template, MAX_MATCHES))
            .collect();
        if per_template.iter().any(Vec::is_empty) {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut odometer = vec![0usize; per_template.len()];
        loop {
            let combo: Vec<&SmartsMatch> = odometer
                .iter()
                .zip(&per_template)
                .map(|(&k, matches)| &matches[k])
                .collect();
            results.push(self.build_products(reactants, &combo, false)?);
            if results.len() >= MAX_PRODUCT_SETS || !advance(&mut odometer, &per_template) {
                break;
            }
        }
        trace!(smirks = %self.smirks, product_sets = results.len(), "ran reaction");
        Ok(results)
    }

    /// Apply a single-reactant, single-product reaction to the first match
    /// in `mol`, replacing it with the product. Atoms outside the match,
    /// including disconnected fragments, are kept.
    ///
    /// Returns `false` when nothing matched.
    pub fn run_reactant_in_place(&self, mol: &mut Molecule) -> Result<bool> {
        if self.reactants.len() != 1 || self.products.len() != 1 {
            return Err(PeptoidError::Reaction(format!(
                "in-place application needs one reactant and one product template: {}",
                self.smirks
            )));
        }
        let Some(found) = find_unprotected(mol, &self.reactants[0], 1).into_iter().next() else {
            return Ok(false);
        };
        let mut products = self.build_products(&[&*mol], &[&found], true)?;
        let mut product = products
            .pop()
            .ok_or_else(|| PeptoidError::Reaction("reaction produced no product".into()))?;
        product.name = std::mem::take(&mut mol.name);
        trace!(
            smirks = %self.smirks,
            atoms_before = mol.atom_count(),
            atoms_after = product.atom_count(),
            "applied reaction in place"
        );
        *mol = product;
        Ok(true)
    }

    fn build_products(
        &self,
        reactants: &[&Molecule],
        combo: &[&SmartsMatch],
        keep_disconnected: bool,
    ) -> Result<Vec<Molecule>> {
        let mut mapped: HashMap<u32, (usize, usize)> = HashMap::new();
        let mut matched: Vec<HashMap<usize, usize>> = Vec::with_capacity(combo.len());
        for (ri, (template, m)) in self.reactants.iter().zip(combo).enumerate() {
            let mut by_target = HashMap::new();
            for (pa, &target) in m.atoms.iter().enumerate() {
                by_target.insert(target, pa);
                if let Some(map) = template.atoms[pa].map {
                    mapped.insert(map, (ri, target));
                }
            }
            matched.push(by_target);
        }

        let ctx = BuildContext {
            reaction: self,
            reactants,
            matched: &matched,
            mapped: &mapped,
            keep_disconnected,
        };
        self.products.iter().map(|t| ctx.build(t)).collect()
    }
}

/// Step the odometer; `false` once every combination was produced.
fn advance(odometer: &mut [usize], per_template: &[Vec<SmartsMatch>]) -> bool {
    for pos in (0..odometer.len()).rev() {
        odometer[pos] += 1;
        if odometer[pos] < per_template[pos].len() {
            return true;
        }
        odometer[pos] = 0;
    }
    false
}

struct BuildContext<'a> {
    reaction: &'a Reaction,
    reactants: &'a [&'a Molecule],
    /// Per reactant: matched target atom -> reactant-template atom.
    matched: &'a [HashMap<usize, usize>],
    /// Atom-map number -> (reactant, target atom).
    mapped: &'a HashMap<u32, (usize, usize)>,
    keep_disconnected: bool,
}

/// Product under construction.
#[derive(Default)]
struct Draft {
    atoms: Vec<MolAtom>,
    bonds: Vec<Bond>,
    bonded: HashSet<(usize, usize)>,
    /// (reactant, reactant atom) -> product atom
    origin: HashMap<(usize, usize), usize>,
}

impl Draft {
    fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) {
        if a != b && self.bonded.insert((a.min(b), a.max(b))) {
            self.bonds.push(Bond::new(a, b, order));
        }
    }

    fn carry_atom(&mut self, ri: usize, atom: usize, reactant: &Molecule) -> usize {
        if let Some(&idx) = self.origin.get(&(ri, atom)) {
            return idx;
        }
        let idx = self.atoms.len();
        self.atoms.push(reactant.atoms[atom].clone());
        self.origin.insert((ri, atom), idx);
        idx
    }
}

impl BuildContext<'_> {
    fn build(&self, template: &SmartsPattern) -> Result<Molecule> {
        let mut draft = Draft::default();
        let mut sources: Vec<Option<(usize, usize)>> = Vec::with_capacity(template.atom_count());

        for (ti, tatom) in template.atoms.iter().enumerate() {
            let source = tatom.map.and_then(|m| self.mapped.get(&m).copied());
            let atom = match source {
                Some((ri, target)) => {
                    let mut atom = self.reactants[ri].atoms[target].clone();
                    apply_template_atom(&mut atom, tatom);
                    draft.origin.insert((ri, target), ti);
                    atom
                }
                None => new_template_atom(tatom, ti)?,
            };
            draft.atoms.push(atom);
            sources.push(source);
        }

        for tb in &template.bonds {
            let (a, b) = (tb.atom1, tb.atom2);
            let order = tb
                .order()
                .or_else(|| match (sources[a], sources[b]) {
                    (Some((ra, a_src)), Some((rb, b_src))) if ra == rb => {
                        self.reactants[ra].get_bond(a_src, b_src).map(|bond| bond.order)
                    }
                    _ => None,
                })
                .unwrap_or(if draft.atoms[a].is_aromatic && draft.atoms[b].is_aromatic {
                    BondOrder::Aromatic
                } else {
                    BondOrder::Single
                });
            draft.add_bond(a, b, order);
        }

        let mut queue: VecDeque<(usize, usize)> = sources.iter().flatten().copied().collect();
        self.carry(&mut draft, &mut queue);
        if self.keep_disconnected {
            for (ri, reactant) in self.reactants.iter().enumerate() {
                for atom in 0..reactant.atom_count() {
                    if !self.matched[ri].contains_key(&atom) && !draft.origin.contains_key(&(ri, atom)) {
                        draft.carry_atom(ri, atom, reactant);
                        queue.push_back((ri, atom));
                        self.carry(&mut draft, &mut queue);
                    }
                }
            }
        }

        let mut mol = Molecule::new(String::new(), draft.atoms, draft.bonds);
        mol.clear_protection();
        assign_hydrogens(&mut mol);
        Ok(mol)
    }

    /// Breadth-first copy of reactant atoms the templates did not match,
    /// together with their bonds.
    fn carry(&self, draft: &mut Draft, queue: &mut VecDeque<(usize, usize)>) {
        while let Some((ri, atom)) = queue.pop_front() {
            let reactant = self.reactants[ri];
            let Some(&here) = draft.origin.get(&(ri, atom)) else {
                continue;
            };
            let here_template = self.matched[ri].get(&atom).copied();

            for &(nb, bi) in &reactant.adjacency[atom] {
                let order = reactant.bonds[bi].order;
                match self.matched[ri].get(&nb) {
                    Some(&nb_template) => {
                        // Matched neighbour: only mapped atoms placed in this
                        // product survive, and the template owns bonds it names.
                        let Some(&there) = draft.origin.get(&(ri, nb)) else {
                            continue;
                        };
                        let named = here_template.is_some_and(|ht| {
                            self.reaction.reactants[ri].bond_between(ht, nb_template).is_some()
                        });
                        if !named {
                            draft.add_bond(here, there, order);
                        }
                    }
                    None => {
                        let known = draft.origin.contains_key(&(ri, nb));
                        let there = draft.carry_atom(ri, nb, reactant);
                        if !known {
                            queue.push_back((ri, nb));
                        }
                        draft.add_bond(here, there, order);
                    }
                }
            }
        }
    }
}

/// Copy the properties a product template spells out onto a mapped atom.
fn apply_template_atom(atom: &mut MolAtom, tatom: &SmartsAtom) {
    if let Some((z, aromatic)) = tatom.element() {
        atom.atomic_number = z;
        if let Some(aromatic) = aromatic {
            atom.is_aromatic = aromatic;
        }
    }
    if let Some(charge) = tatom.charge() {
        atom.formal_charge = charge;
    }
    if let Some(mass) = tatom.isotope() {
        atom.isotope = Some(mass);
    }
    if let Some(h) = tatom.hydrogen_count() {
        atom.implicit_hydrogens = h;
        atom.no_implicit = true;
    }
}

/// An atom that only exists in the product template.
fn new_template_atom(tatom: &SmartsAtom, index: usize) -> Result<MolAtom> {
    let (z, aromatic) = tatom.element().ok_or_else(|| {
        PeptoidError::Reaction(format!(
            "product template atom {index} is unmapped and names no element"
        ))
    })?;
    let mut atom = MolAtom::new(z);
    atom.is_aromatic = aromatic.unwrap_or(false);
    atom.formal_charge = tatom.charge().unwrap_or(0);
    atom.isotope = tatom.isotope();
    if let Some(h) = tatom.hydrogen_count() {
        atom.implicit_hydrogens = h;
        atom.no_implicit = true;
    }
    Ok(atom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::canonical_smiles;
    use crate::smiles::parse_smiles;

    const DISPLACEMENT: &str = "[N;!H0!$(NC=[!#6;!P]):1].[#6:2][F,Cl,Br,I]>>[N:1][#6:2]";
    const AMIDATION: &str = "[C:1](=[O:2])-[OD1].[N!H0:3]>>[C:1](=[O:2])[N:3]";

    fn smiles(smi: &str) -> String {
        canonical_smiles(&parse_smiles(smi).unwrap())
    }

    #[test]
    fn parse_reaction_templates() {
        let rxn = parse_reaction(DISPLACEMENT).unwrap();
        assert_eq!(rxn.reactants.len(), 2);
        assert_eq!(rxn.products.len(), 1);
        assert_eq!(rxn.smirks(), DISPLACEMENT);
        assert_eq!(split_templates("[C:1].(C.C)"), vec!["[C:1]", "(C.C)"]);
    }

    #[test]
    fn split_respects_nested_brackets() {
        assert_eq!(
            split_templates("[N;!H0!$(NC=[!#6;!P]):1].[#6:2][F,Cl,Br,I]"),
            vec!["[N;!H0!$(NC=[!#6;!P]):1]", "[#6:2][F,Cl,Br,I]"]
        );
        assert_eq!(
            split_templates("[C;$(C[N;$(N=[O,S])]):1].O"),
            vec!["[C;$(C[N;$(N=[O,S])]):1]", "O"]
        );
        let rxn = parse_reaction("[N;$(NC=[O,S]):1].[C:2]Br>>[N:1][C:2]").unwrap();
        assert_eq!(rxn.reactants.len(), 2);
    }

    #[test]
    fn parse_reaction_invalid() {
        assert!(parse_reaction("CC").is_err());
        assert!(parse_reaction(">>C").is_err());
        assert!(parse_reaction("C>>").is_err());
        assert!(parse_reaction("[C:1].[N:1]>>[C:1]").is_err());
        assert!(parse_reaction("C>>[").is_err());
    }

    #[test]
    fn displacement_joins_amine_and_halide() {
        let rxn = parse_reaction(DISPLACEMENT).unwrap();
        let amine = parse_smiles("NCc1ccccc1").unwrap();
        let halide = parse_smiles("BrCC(=O)OC(C)(C)C").unwrap();
        let products = rxn.run_reactants(&[&amine, &halide]).unwrap();
        assert!(!products.is_empty());
        let product = &products[0][0];
        assert_eq!(canonical_smiles(product), smiles("CC(C)(C)OC(=O)CNCc1ccccc1"));
        assert!(product.atoms.iter().all(|a| a.atomic_number != 35));
    }

    #[test]
    fn amidation_acylates_secondary_amine() {
        let rxn = parse_reaction(AMIDATION).unwrap();
        let acid = parse_smiles("OC(CBr)=O").unwrap();
        let amine = parse_smiles("CC(C)(C)OC(=O)CNCc1ccccc1").unwrap();
        let products = rxn.run_reactants(&[&acid, &amine]).unwrap();
        let product = &products[0][0];
        assert_eq!(
            canonical_smiles(product),
            smiles("CC(C)(C)OC(=O)CN(Cc1ccccc1)C(=O)CBr")
        );
    }

    #[test]
    fn protection_blocks_matching() {
        let rxn = parse_reaction(AMIDATION).unwrap();
        let acid = parse_smiles("OC(CBr)=O").unwrap();
        let mut amine = parse_smiles("CNC(=O)CNC").unwrap();
        let amide = parse_smarts("[N;$(NC=[O,S])]").unwrap();
        assert_eq!(protect_matching_atoms(&mut amine, &amide), 1);
        assert!(amine.atoms[1].protected);
        let products = rxn.run_reactants(&[&acid, &amine]).unwrap();
        assert_eq!(products.len(), 1);
        let product = &products[0][0];
        assert!(product.atoms.iter().all(|a| !a.protected));
        assert_eq!(canonical_smiles(product), smiles("CNC(=O)CN(C)C(=O)CBr"));
    }

    #[test]
    fn no_match_gives_no_products() {
        let rxn = parse_reaction(DISPLACEMENT).unwrap();
        let amine = parse_smiles("CN(C)C").unwrap();
        let halide = parse_smiles("CCBr").unwrap();
        assert!(rxn.run_reactants(&[&amine, &halide]).unwrap().is_empty());
        assert!(rxn.run_reactants(&[&amine]).is_err());
    }

    #[test]
    fn combinations_are_enumerated() {
        let rxn = parse_reaction(DISPLACEMENT).unwrap();
        let diamine = parse_smiles("NCCN").unwrap();
        let halide = parse_smiles("BrCCBr").unwrap();
        let products = rxn.run_reactants(&[&diamine, &halide]).unwrap();
        assert_eq!(products.len(), 4);
    }

    #[test]
    fn in_place_boc_removal() {
        let rxn = parse_reaction("[N:1]C(=O)OC(C)(C)(C)>>[N:1]").unwrap();
        let mut mol = parse_smiles("NCCCCNC(=O)OC(C)(C)C").unwrap();
        mol.name = "lysine side chain".into();
        assert!(rxn.run_reactant_in_place(&mut mol).unwrap());
        assert_eq!(canonical_smiles(&mol), smiles("NCCCCN"));
        assert_eq!(mol.name, "lysine side chain");
        assert!(!rxn.run_reactant_in_place(&mut mol).unwrap());
    }

    #[test]
    fn in_place_keeps_other_fragments() {
        let rxn = parse_reaction("[N:1]C(=O)OC(C)(C)(C)>>[N:1]").unwrap();
        let mut mol = parse_smiles("CNC(=O)OC(C)(C)C.[Cl-]").unwrap();
        assert!(rxn.run_reactant_in_place(&mut mol).unwrap());
        assert_eq!(canonical_smiles(&mol), smiles("CN.[Cl-]"));
    }

    #[test]
    fn in_place_aromatic_nitrogen_gets_hydrogen() {
        let rxn = parse_reaction("[n:1]C(=O)OC(C)(C)(C)>>[nH:1]").unwrap();
        let mut mol = parse_smiles("NCCc1cn(C(=O)OC(C)(C)C)c2ccccc12").unwrap();
        assert!(rxn.run_reactant_in_place(&mut mol).unwrap());
        assert_eq!(canonical_smiles(&mol), smiles("NCCc1c[nH]c2ccccc12"));
    }

    #[test]
    fn in_place_ester_and_ether_cleavage() {
        let ester =
            parse_reaction("[CX3:1](=[OX1:2])-[OX2:3]-[C](C)(C)(C)>>[C:1](=[O:2])-[O:3]").unwrap();
        let mut mol = parse_smiles("NCC(=O)OC(C)(C)C").unwrap();
        assert!(ester.run_reactant_in_place(&mut mol).unwrap());
        assert_eq!(canonical_smiles(&mol), smiles("NCC(=O)O"));

        let ether = parse_reaction("[*:1]-[OX2:3]-[C](C)(C)(C)>>[*:1]-[O:3]").unwrap();
        let mut mol = parse_smiles("NCCOC(C)(C)C").unwrap();
        assert!(ether.run_reactant_in_place(&mut mol).unwrap());
        assert_eq!(canonical_smiles(&mol), smiles("NCCO"));
    }

    #[test]
    fn in_place_requires_single_templates() {
        let rxn = parse_reaction(DISPLACEMENT).unwrap();
        let mut mol = parse_smiles("NC").unwrap();
        assert!(rxn.run_reactant_in_place(&mut mol).is_err());
    }

    #[test]
    fn unmapped_product_atoms_are_created() {
        let rxn = parse_reaction("[C:1][OH1:2]>>[C:1][O:2]C").unwrap();
        let mol = parse_smiles("CCO").unwrap();
        let products = rxn.run_reactants(&[&mol]).unwrap();
        assert_eq!(canonical_smiles(&products[0][0]), smiles("CCOC"));
    }
}
