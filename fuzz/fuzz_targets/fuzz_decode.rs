#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(words) = rsov_ir::words_from_bytes(data) else {
        return;
    };
    // Decoding should never panic on any input.
    let Ok(mut module) = rsov_ir::Module::decode(&words) else {
        return;
    };
    if module.resolve_ids().is_ok() {
        let _ = module.encode();
    }
});
