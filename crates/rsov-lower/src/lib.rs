//! Lowering of RenderScript foreach kernels to Vulkan compute programs.
//!
//! The input is a SPIR-V module holding the kernel functions as the front
//! end emitted them. [`add_compute_wrappers`] binds globals to descriptor
//! slots, synthesizes a `GLCompute` entry point per exported kernel, and
//! adds the allocation metadata buffer, handing the module to external
//! builtin and accessor lowerings along the way.

mod buffer;
mod error;
mod globals;
mod header;
mod host;
mod pipeline;
mod signature;
mod wrapper;

pub use buffer::{
    FIRST_ALLOCATION_BINDING, FIRST_INPUT_BINDING, METADATA_BINDING, METADATA_MEMBER_OFFSETS,
    OUTPUT_BINDING, add_buffer, add_ga_metadata,
};
pub use error::{PipelineError, WrapperError};
pub use globals::{GLOBAL_BLOCK, decorate_global_buffer};
pub use header::{GLSL_STD_450, add_header};
pub use host::{
    ExportedKernel, GlobalLayout, HostModule, Lowering, LoweringError, PassthroughLowering,
    StaticHost,
};
pub use pipeline::{PipelineOptions, add_compute_wrappers, load_module};
pub use signature::ForEachSignature;
pub use wrapper::{ENTRY_PREFIX, ROOT_KERNEL, add_wrapper, linear_index};
