#![no_main]

use libfuzzer_sys::fuzz_target;
use rsov_lower::{ExportedKernel, ForEachSignature, PassthroughLowering, PipelineOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(words) = rsov_ir::words_from_bytes(data) else {
        return;
    };
    let kernels = [
        ExportedKernel::new("root", ForEachSignature::IN | ForEachSignature::OUT, 1),
        ExportedKernel::new("k", ForEachSignature::OUT | ForEachSignature::X, 0),
    ];
    // The full pipeline should reject bad modules with an error, not a panic.
    let _ = rsov_lower::add_compute_wrappers(
        &words,
        &kernels,
        &(),
        &mut PassthroughLowering,
        &PipelineOptions::default(),
    );
});
