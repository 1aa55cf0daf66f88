#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(mol) = peptoid_chem::parse_smiles(data) {
        let _ = peptoid_chem::canonical_smiles(&mol);
    }
});
