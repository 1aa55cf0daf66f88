#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = peptoid_chem::parse_smarts(data);
    let _ = peptoid_chem::parse_reaction(data);
});
