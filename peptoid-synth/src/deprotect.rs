//! Conditional removal of protecting groups after assembly.
//!
//! Each rule is a single-template reaction SMARTS gated on the monomer codes
//! present in the sequence. Rules run in table order; a rule that fires is
//! applied in place until it stops matching, then the molecule is sanitized.

use peptoid_chem::{parse_reaction, sanitize, Molecule, Reaction};
use peptoid_core::{PeptoidError, Result};
use tracing::{debug, trace};

use crate::sequence::PeptoidSequence;

/// When a deprotection rule applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Every sequence.
    Always,
    /// Sequences containing at least one of these codes.
    AnyOf(Vec<char>),
}

impl Trigger {
    pub fn fires(&self, sequence: &PeptoidSequence) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::AnyOf(codes) => codes.iter().any(|&c| sequence.contains_code(c)),
        }
    }
}

/// A named deprotection transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprotectionRule {
    pub name: String,
    pub smirks: String,
    pub trigger: Trigger,
}

impl DeprotectionRule {
    pub fn new(name: &str, smirks: &str, trigger: Trigger) -> Self {
        Self {
            name: name.to_string(),
            smirks: smirks.to_string(),
            trigger,
        }
    }
}

/// The standard table: glycine phosphonate, Boc carbamates, aromatic Boc,
/// tert-butyl ethers, then tert-butyl esters.
pub fn default_rules() -> Vec<DeprotectionRule> {
    vec![
        DeprotectionRule::new(
            "gly",
            "[N:1]C(=P)OC(C)(C)(C)>>[N:1]",
            Trigger::AnyOf(vec!['G']),
        ),
        DeprotectionRule::new(
            "boc",
            "[N:1]C(=O)OC(C)(C)(C)>>[N:1]",
            Trigger::AnyOf(vec!['D', 'K', 'R']),
        ),
        DeprotectionRule::new(
            "aromatic_boc",
            "[n:1]C(=O)OC(C)(C)(C)>>[nH:1]",
            Trigger::AnyOf(vec!['W', 'H']),
        ),
        DeprotectionRule::new(
            "alcohol",
            "[*:1]-[OX2:3]-[C](C)(C)(C)>>[*:1]-[O:3]",
            Trigger::AnyOf(vec!['S', 'Y']),
        ),
        DeprotectionRule::new(
            "ester",
            "[CX3:1](=[OX1:2])-[OX2:3]-[C](C)(C)(C)>>[C:1](=[O:2])-[O:3]",
            Trigger::Always,
        ),
    ]
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: DeprotectionRule,
    reaction: Reaction,
}

/// A compiled, ordered deprotection table.
#[derive(Debug, Clone)]
pub struct Deprotector {
    rules: Vec<CompiledRule>,
}

impl Deprotector {
    /// Compile `rules`. Every rule must have exactly one reactant and one
    /// product template.
    pub fn new(rules: Vec<DeprotectionRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let reaction = parse_reaction(&rule.smirks)?;
                if reaction.reactants.len() != 1 || reaction.products.len() != 1 {
                    return Err(PeptoidError::InvalidInput(format!(
                        "deprotection rule '{}' must have one reactant and one product template",
                        rule.name
                    )));
                }
                Ok(CompiledRule { rule, reaction })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// The standard table from [`default_rules`].
    pub fn standard() -> Result<Self> {
        Self::new(default_rules())
    }

    pub fn rules(&self) -> impl Iterator<Item = &DeprotectionRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// Apply every rule whose trigger fires for `sequence`.
    ///
    /// Returns the names of the rules that fired, in order.
    pub fn deprotect(&self, sequence: &PeptoidSequence, mol: &mut Molecule) -> Result<Vec<String>> {
        let mut fired = Vec::new();
        for compiled in &self.rules {
            if !compiled.rule.trigger.fires(sequence) {
                continue;
            }
            let applied = apply_until_stable(&compiled.reaction, &compiled.rule.name, mol)?;
            sanitize(mol)?;
            debug!(rule = %compiled.rule.name, applied, "deprotection rule fired");
            fired.push(compiled.rule.name.clone());
        }
        Ok(fired)
    }
}

/// Run `reaction` in place until it stops matching. Bounded by the atom
/// count, since every application must remove at least one atom or bond.
fn apply_until_stable(reaction: &Reaction, name: &str, mol: &mut Molecule) -> Result<usize> {
    let limit = mol.atom_count() + 1;
    let mut applied = 0;
    while reaction.run_reactant_in_place(mol)? {
        applied += 1;
        trace!(rule = name, applied, atoms = mol.atom_count(), "in-place application");
        if applied > limit {
            return Err(PeptoidError::Reaction(format!(
                "deprotection rule '{name}' did not converge after {limit} applications"
            )));
        }
    }
    Ok(applied)
}
