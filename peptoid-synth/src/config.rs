//! TOML configuration: monomer library, assembly switches and the optional
//! deprotection table.

use std::collections::BTreeMap;
use std::path::Path;

use peptoid_core::hash::sha256;
use peptoid_core::{PeptoidError, Result};
use serde::Deserialize;
use tracing::info;

use crate::deprotect::{default_rules, DeprotectionRule, Trigger};
use crate::monomer::MonomerLibrary;

/// The demo library shipped with the workspace.
const BUNDLED: &str = include_str!("../../data/monomers.toml");

/// Assembly settings loaded from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisConfig {
    /// Code of the halide the chain is grown from.
    #[serde(default = "default_start_code")]
    pub start_code: char,
    /// Codes whose displacement product is the next halide directly.
    #[serde(default = "default_pass_through")]
    pub pass_through: Vec<char>,
    /// Block amide nitrogens before each coupling.
    #[serde(default = "default_protect_amides")]
    pub protect_amides: bool,
    /// Seed for sequence generation.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub monomers: BTreeMap<char, String>,
    /// Replaces the standard deprotection table when present.
    #[serde(default)]
    pub deprotection: Option<Vec<RuleConfig>>,
}

/// One `[[deprotection]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub name: String,
    pub smirks: String,
    /// Empty means the rule always fires.
    #[serde(default)]
    pub when_any: Vec<char>,
}

fn default_start_code() -> char {
    'B'
}

fn default_pass_through() -> Vec<char> {
    vec!['X']
}

fn default_protect_amides() -> bool {
    true
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            start_code: default_start_code(),
            pass_through: default_pass_through(),
            protect_amides: default_protect_amides(),
            seed: None,
            monomers: BTreeMap::new(),
            deprotection: None,
        }
    }
}

impl SynthesisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PeptoidError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PeptoidError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Self::load(&content, &path.display().to_string())
    }

    /// The demo library in `data/monomers.toml`.
    pub fn bundled() -> Result<Self> {
        Self::load(BUNDLED, "bundled")
    }

    /// Parse `content` and log where it came from with its digest.
    fn load(content: &str, origin: &str) -> Result<Self> {
        let config = Self::from_toml_str(content)?;
        info!(
            origin,
            config_sha256 = %sha256(content.as_bytes()),
            monomers = config.monomers.len(),
            "loaded synthesis config"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.monomers.is_empty() {
            return Err(PeptoidError::Config("no monomers defined".into()));
        }
        if !self.monomers.contains_key(&self.start_code) {
            return Err(PeptoidError::Config(format!(
                "start code '{}' has no monomer",
                self.start_code
            )));
        }
        if let Some(rules) = &self.deprotection {
            if let Some(rule) = rules.iter().find(|r| r.name.trim().is_empty()) {
                return Err(PeptoidError::Config(format!(
                    "deprotection rule with empty name: {}",
                    rule.smirks
                )));
            }
        }
        Ok(())
    }

    /// Parse every fragment into a library.
    pub fn library(&self) -> Result<MonomerLibrary> {
        MonomerLibrary::from_pairs(self.monomers.iter().map(|(&c, s)| (c, s.as_str())))
            .map_err(|e| PeptoidError::Config(e.to_string()))
    }

    /// The configured deprotection table, or the standard one.
    pub fn deprotection_rules(&self) -> Vec<DeprotectionRule> {
        match &self.deprotection {
            None => default_rules(),
            Some(rules) => rules
                .iter()
                .map(|r| {
                    let trigger = if r.when_any.is_empty() {
                        Trigger::Always
                    } else {
                        Trigger::AnyOf(r.when_any.clone())
                    };
                    DeprotectionRule::new(&r.name, &r.smirks, trigger)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
start_code = "B"

[monomers]
B = "BrCC(=O)OC(C)(C)C"
A = "NC"
"#;

    #[test]
    fn defaults_apply() {
        let config = SynthesisConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.pass_through, vec!['X']);
        assert!(config.protect_amides);
        assert_eq!(config.seed, None);
        assert_eq!(config.library().unwrap().len(), 2);
        assert_eq!(config.deprotection_rules(), default_rules());
    }

    #[test]
    fn custom_deprotection_table() {
        let toml = format!(
            "{MINIMAL}\n[[deprotection]]\nname = \"boc\"\nsmirks = \"[N:1]C(=O)OC(C)(C)(C)>>[N:1]\"\nwhen_any = [\"K\"]\n\n[[deprotection]]\nname = \"ester\"\nsmirks = \"[CX3:1](=[OX1:2])-[OX2:3]-[C](C)(C)(C)>>[C:1](=[O:2])-[O:3]\"\n"
        );
        let config = SynthesisConfig::from_toml_str(&toml).unwrap();
        let rules = config.deprotection_rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].trigger, Trigger::AnyOf(vec!['K']));
        assert_eq!(rules[1].trigger, Trigger::Always);
    }

    #[test]
    fn rejects_bad_config() {
        let missing_start = "start_code = \"Q\"\n[monomers]\nA = \"NC\"\n";
        assert!(matches!(
            SynthesisConfig::from_toml_str(missing_start),
            Err(PeptoidError::Config(_))
        ));
        assert!(matches!(
            SynthesisConfig::from_toml_str("start_code = 5"),
            Err(PeptoidError::Config(_))
        ));
        assert!(matches!(
            SynthesisConfig::from_toml_str("[monomers]\nAB = \"NC\"\n"),
            Err(PeptoidError::Config(_))
        ));
        let bad_smiles = "[monomers]\nB = \"BrCC(\"\n";
        let config = SynthesisConfig::from_toml_str(bad_smiles).unwrap();
        assert!(matches!(config.library(), Err(PeptoidError::Config(_))));
    }

    #[test]
    fn bundled_library_loads() {
        let config = SynthesisConfig::bundled().unwrap();
        let library = config.library().unwrap();
        for code in "ABDEFGHIKLMRSVWXY".chars() {
            assert!(library.contains(code), "missing {code}");
        }
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        file.flush().unwrap();
        let config = SynthesisConfig::from_file(file.path()).unwrap();
        assert_eq!(config, SynthesisConfig::from_toml_str(MINIMAL).unwrap());

        let err = SynthesisConfig::from_file("/nonexistent/peptoid/monomers.toml").unwrap_err();
        assert!(matches!(err, PeptoidError::Io(_)));
        assert!(err.to_string().contains("/nonexistent/peptoid/monomers.toml"));
    }

    #[test]
    fn file_errors_match_string_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[monomers]\nA = \"NC\"\n").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            SynthesisConfig::from_file(file.path()),
            Err(PeptoidError::Config(_))
        ));
    }
}
