use rsov_ir::spirv::{Decoration, StorageClass};
use rsov_ir::{Builder, Module, Ref, Word};
use rsov_lower::{
    ExportedKernel, HostModule, PassthroughLowering, PipelineError, PipelineOptions,
    add_compute_wrappers,
};

/// Element type of a kernel's inputs and result.
#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub enum Elem {
    Uint,
    Float4,
}

fn elem_type(module: &mut Module, elem: Elem) -> Ref {
    match elem {
        Elem::Uint => module.unsigned_int_type(32),
        Elem::Float4 => {
            let float = module.float_type(32);
            module.vector_type(float, 4)
        }
    }
}

/// Adds a kernel `name` taking `inputs` values plus `coords` uint coordinates
/// and returning its first input (or a fresh zero).
pub fn add_kernel(module: &mut Module, name: &str, elem: Elem, inputs: usize, coords: usize) {
    let ty = elem_type(module, elem);
    let uint = module.unsigned_int_type(32);
    let mut params = vec![ty; inputs];
    params.extend(std::iter::repeat_n(uint, coords));
    let fn_ty = module.function_type(ty, &params);
    let fallback = match elem {
        Elem::Uint => module.constant(uint, 0),
        Elem::Float4 => {
            let float = module.float_type(32);
            let zero = module.constant(float, 0);
            module.constant_composite(ty, &[zero; 4])
        }
    };

    let mut b = Builder::new(module);
    let func = b.begin_function(ty, 0, fn_ty);
    let args: Vec<Ref> = params
        .iter()
        .map(|&p| b.function_parameter(p).expect("function selected"))
        .collect();
    b.begin_block().expect("function selected");
    b.ret_value(args.first().copied().unwrap_or(fallback))
        .expect("block selected");
    module.set_name(func, name);
}

/// Adds a `__GPUBlock` global of `members` uints, in `Function` storage as
/// the front end emits it.
#[allow(dead_code)]
pub fn add_global_block(module: &mut Module, members: usize) -> Ref {
    let uint = module.unsigned_int_type(32);
    let st = module.struct_type(&vec![uint; members]);
    let ptr = module.pointer_type(StorageClass::Function, st);
    let var = module.add_global_variable(ptr, StorageClass::Function);
    module.set_name(var, rsov_lower::GLOBAL_BLOCK);
    st
}

/// Adds a named allocation-backed global in `Function` storage.
#[allow(dead_code)]
pub fn add_allocation_global(module: &mut Module, name: &str) {
    let uint = module.unsigned_int_type(32);
    let ptr = module.pointer_type(StorageClass::Function, uint);
    let var = module.add_global_variable(ptr, StorageClass::Function);
    module.set_name(var, name);
}

/// Runs the full pipeline with pass-through external lowerings.
pub fn lower(
    words: &[Word],
    kernels: &[ExportedKernel],
    host: &dyn HostModule,
) -> Result<Vec<Word>, PipelineError> {
    add_compute_wrappers(
        words,
        kernels,
        host,
        &mut PassthroughLowering,
        &PipelineOptions::default(),
    )
}

/// Lowers and decodes the result, asserting it is well formed.
#[allow(dead_code)]
pub fn lower_ok(words: &[Word], kernels: &[ExportedKernel], host: &dyn HostModule) -> Module {
    let out = lower(words, kernels, host).expect("lowering failed");
    rspirv::dr::load_words(&out).expect("output is not a well-formed binary");
    rsov_lower::load_module(&out).expect("output does not decode")
}

/// Bindings of every bound global, sorted.
#[allow(dead_code)]
pub fn bindings(module: &Module) -> Vec<u32> {
    let mut out: Vec<u32> = module
        .globals
        .iter()
        .filter_map(|&h| {
            module
                .decorations(h, Decoration::Binding)
                .first()
                .map(|ops| ops[0])
        })
        .collect();
    out.sort_unstable();
    out
}

/// The variable bound at `binding`.
#[allow(dead_code)]
pub fn bound_variable(module: &Module, binding: u32) -> Option<Ref> {
    module.globals.iter().copied().find(|&h| {
        module
            .decorations(h, Decoration::Binding)
            .iter()
            .any(|ops| ops.first() == Some(&binding))
    })
}
