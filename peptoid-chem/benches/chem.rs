use criterion::{black_box, criterion_group, criterion_main, Criterion};
use peptoid_chem::{canonical_smiles, parse_reaction, parse_smiles};

/// Monomer-sized fragments and a few assembled peptoids.
const SMILES_SET: &[&str] = &[
    "BrCC(=O)OC(C)(C)C",
    "NCc1ccccc1",
    "NCC(C)C",
    "NCCCCNC(=O)OC(C)(C)C",
    "NCCCNC(=NC(=O)OC(C)(C)C)NC(=O)OC(C)(C)C",
    "NCCc1cn(C(=O)OC(C)(C)C)c2ccccc12",
    "NCCc1ccc(OC(C)(C)C)cc1",
    "CN(CC(=O)N(CC(=O)O)Cc1ccccc1)CC(C)C",
    "OC(=O)CN(CCc1c[nH]c2ccccc12)C(=O)CN(CCCCN)C(=O)CNC",
];

fn bench_smiles_parse(c: &mut Criterion) {
    let smiles_1k: Vec<&str> = SMILES_SET.iter().copied().cycle().take(1000).collect();
    c.bench_function("smiles_parse_1k", |b| {
        b.iter(|| {
            for &smi in black_box(&smiles_1k) {
                let _ = parse_smiles(smi);
            }
        })
    });
}

fn bench_canonical(c: &mut Criterion) {
    let mols: Vec<_> = SMILES_SET
        .iter()
        .filter_map(|s| parse_smiles(s).ok())
        .collect();
    c.bench_function("canonical_smiles", |b| {
        b.iter(|| {
            for mol in black_box(&mols) {
                let _ = canonical_smiles(mol);
            }
        })
    });
}

fn bench_displacement(c: &mut Criterion) {
    let rxn = parse_reaction("[N;!H0!$(NC=[!#6;!P]):1].[#6:2][F,Cl,Br,I]>>[N:1][#6:2]").unwrap();
    let amine = parse_smiles("NCc1ccccc1").unwrap();
    let halide = parse_smiles("BrCC(=O)OC(C)(C)C").unwrap();
    c.bench_function("amine_displacement", |b| {
        b.iter(|| rxn.run_reactants(black_box(&[&amine, &halide])).unwrap())
    });
}

criterion_group!(benches, bench_smiles_parse, bench_canonical, bench_displacement);
criterion_main!(benches);
