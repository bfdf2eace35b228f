//! The lowering pipeline: kernel binary in, bound compute binary out.

use rsov_ir::{Module, Ref, Word};
use rsov_opt::{AnnotationConsolidation, IrValidation, Pass};

use crate::buffer::add_ga_metadata;
use crate::error::PipelineError;
use crate::globals::decorate_global_buffer;
use crate::header::add_header;
use crate::host::{ExportedKernel, HostModule, Lowering};
use crate::wrapper::add_wrapper;

/// Pipeline configuration.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// Run [`IrValidation`] over the module handed to the builtin lowering
    /// and log what it finds.
    pub validate: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

/// Decodes and resolves a word stream.
pub fn load_module(words: &[Word]) -> Result<Module, PipelineError> {
    let mut module = Module::decode(words).map_err(PipelineError::Stream)?;
    module.resolve_ids().map_err(PipelineError::Unresolved)?;
    Ok(module)
}

/// Lowers a kernel binary into a compute binary with one `GLCompute`
/// entry point per exported kernel.
///
/// Stages run strictly in order and the first failure aborts the whole
/// transformation; no partial binary is returned.
pub fn add_compute_wrappers(
    kernel_binary: &[Word],
    kernels: &[ExportedKernel],
    host: &dyn HostModule,
    lowering: &mut dyn Lowering,
    options: &PipelineOptions,
) -> Result<Vec<Word>, PipelineError> {
    log::debug!("decoding {} words", kernel_binary.len());
    let mut module = load_module(kernel_binary)?;

    // Globals move from Function to Uniform storage.
    rsov_opt::normalize(&mut module);
    add_header(&mut module);

    log::debug!("decorating global buffer");
    decorate_global_buffer(&mut module, host)?;

    for kernel in kernels {
        log::debug!(
            "wrapping kernel '{}' (signature {}, {} inputs)",
            kernel.name,
            kernel.signature,
            kernel.input_count
        );
        add_wrapper(&mut module, kernel)?;
    }

    AnnotationConsolidation.run(&mut module);
    if options.validate {
        IrValidation.run(&mut module);
    }

    log::debug!("handing off to builtin lowering");
    let words = lowering.translate_builtins(&mut module)?;

    // Continue from a freshly decoded module so the metadata types are
    // interned against what the builtin lowering produced.
    let mut module = load_module(&words)?;
    let metadata = add_metadata(&mut module);
    AnnotationConsolidation.run(&mut module);

    log::debug!("handing off to accessor lowering");
    let words = lowering.translate_accessors(&mut module, metadata)?;
    log::debug!("produced {} words", words.len());
    Ok(words)
}

/// Adds the allocation metadata buffer and the declarations the accessor
/// lowering uses but cannot create itself.
fn add_metadata(module: &mut Module) -> Ref {
    let metadata = add_ga_metadata(module);
    let uint = module.unsigned_int_type(32);
    module.constant(uint, 0);
    module.constant(uint, 1);
    module.pointer_type(rsov_ir::spirv::StorageClass::Uniform, uint);
    metadata
}
