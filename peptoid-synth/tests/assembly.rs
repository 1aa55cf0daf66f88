use peptoid_chem::{canonical_smiles, parse_smarts, parse_smiles, sanitize, smarts_match};
use peptoid_core::PeptoidError;
use peptoid_synth::{
    generate_peptoid_strings, Assembler, PeptoidSequence, SynthesisConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bundled() -> Assembler {
    let config = SynthesisConfig::bundled().unwrap();
    Assembler::from_config(&config).unwrap()
}

fn canon(smiles: &str) -> String {
    canonical_smiles(&parse_smiles(smiles).unwrap())
}

#[test]
fn dimer_matches_expected_structure() {
    let product = bundled().assemble("FA").unwrap();
    assert_eq!(product.smiles, canon("CNCC(=O)N(Cc1ccccc1)CC(=O)O"));
    assert_eq!(product.formula, "C12H16N2O3");
}

#[test]
fn lysine_like_side_chain_is_freed() {
    let product = bundled().assemble("KF").unwrap();
    assert_eq!(product.smiles, canon("OC(=O)CN(CCCCN)C(=O)CNCc1ccccc1"));
    let carbamate = parse_smarts("NC(=O)OC(C)(C)C").unwrap();
    assert!(!smarts_match(&parse_smiles(&product.smiles).unwrap(), &carbamate));
}

#[test]
fn pass_through_keeps_halide_slot() {
    let product = bundled().assemble("FX").unwrap();
    assert_eq!(
        product.smiles,
        canon("OC(=O)CN(Cc1ccccc1)C(=O)CNCc1ccc(CBr)cc1")
    );
}

#[test]
fn assembly_is_deterministic() {
    let a = bundled().assemble("WKYF").unwrap();
    let b = bundled().assemble("WKYF").unwrap();
    assert_eq!(a, b);
}

#[test]
fn deprotection_is_idempotent() {
    let assembler = bundled();
    for seq in ["RDS", "WHY", "GKE"] {
        let product = assembler.assemble(seq).unwrap();
        let sequence = PeptoidSequence::new(seq).unwrap();
        let again = assembler
            .chemistry()
            .deprotect_peptoid(&sequence, &product.smiles)
            .unwrap();
        assert_eq!(again, product.smiles, "sequence {seq}");
    }
}

#[test]
fn protecting_groups_removed() {
    let tbu = parse_smarts("[OX2]C([CH3])([CH3])[CH3]").unwrap();
    let assembler = bundled();
    for seq in ["RDS", "WHY", "KEY"] {
        let product = assembler.assemble(seq).unwrap();
        let mol = parse_smiles(&product.smiles).unwrap();
        assert!(!smarts_match(&mol, &tbu), "{seq}: {}", product.smiles);
        assert!(!product.smiles.contains("Br"));
    }
}

#[test]
fn repeated_guanidine_couples_on_first_free_nh() {
    let product = bundled().assemble("RRF").unwrap();
    assert_eq!(
        product.smiles,
        canon("N=C(N)NCCCNCC(=O)N(CCCN(C(=N)N)C(=O)CNCc1ccccc1)CC(=O)O")
    );
}

#[test]
fn unknown_code_fails_before_chemistry() {
    let err = bundled().assemble("FAQ").unwrap_err();
    assert!(matches!(err, PeptoidError::InvalidInput(ref m) if m.contains("'Q' at position 2")));
}

#[test]
fn generated_library_assembles() {
    let assembler = bundled();
    let alphabet = assembler.alphabet();
    let mut rng = StdRng::seed_from_u64(42);
    let sequences = generate_peptoid_strings(8, 3, &alphabet, &mut rng).unwrap();
    assert_eq!(sequences.len(), 8);
    for seq in &sequences {
        let product = assembler.assemble(seq).unwrap();
        let mut mol = parse_smiles(&product.smiles).unwrap();
        sanitize(&mut mol).unwrap();
        if !seq.contains('X') {
            assert!(!product.smiles.contains("Br"), "{seq}: {}", product.smiles);
        }
        assert!(product.molecular_weight > 0.0);
    }
}
