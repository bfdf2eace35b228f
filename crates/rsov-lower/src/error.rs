//! Error types for wrapper synthesis, global decoration, and the pipeline.

use rsov_ir::IrError;

use crate::host::LoweringError;
use crate::signature::ForEachSignature;

/// Errors raised while decorating globals or synthesizing a kernel wrapper.
#[derive(Debug, thiserror::Error)]
pub enum WrapperError {
    /// An exported kernel has no function definition in the module.
    #[error("kernel '{0}' is not defined in the module")]
    MissingKernel(String),

    /// A kernel parameter or the kernel itself has no result type.
    #[error("kernel '{0}' is missing a parameter or return type")]
    MalformedKernel(String),

    /// Legacy root-style kernels are not lowered.
    #[error("kernel '{name}' is not a foreach kernel (signature {signature})")]
    NotForEach {
        name: String,
        signature: ForEachSignature,
    },

    #[error("kernel '{0}' takes a user data argument")]
    UserData(String),

    #[error("kernel '{0}' takes a context argument")]
    Context(String),

    /// Inputs are addressed by the linear index, which the signature does not request.
    #[error("kernel '{name}' declares {inputs} inputs but no index is computed")]
    InputsWithoutIndex { name: String, inputs: u32 },

    #[error("kernel '{name}' declares {inputs} inputs but has {parameters} parameters")]
    TooFewParameters {
        name: String,
        inputs: u32,
        parameters: usize,
    },

    /// The `__GPUBlock` variable is not a pointer to a struct.
    #[error("global block %{0} is not a pointer to a struct")]
    GlobalBlockShape(u32),

    /// The native global block is not a struct.
    #[error("native global block is not a struct")]
    NativeBlockShape,

    #[error("native global block has {native} members, shader block has {shader}")]
    MemberCount { native: usize, shader: usize },

    /// An allocation-backed global has no variable in the module.
    #[error("allocation '{0}' has no global variable")]
    MissingAllocation(String),

    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Errors returned by the lowering pipeline.
///
/// Every variant maps to a negative status code through [`PipelineError::code`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The word stream could not be decoded.
    #[error("malformed word stream")]
    Stream(#[source] IrError),

    /// A referenced id was never defined.
    #[error("unresolved identifiers")]
    Unresolved(#[source] IrError),

    /// Global decoration or wrapper synthesis failed.
    #[error("structural mismatch")]
    Structural(#[from] WrapperError),

    /// An external lowering transform failed.
    #[error("external lowering failed")]
    External(#[from] LoweringError),
}

impl PipelineError {
    /// The status code reported to callers.
    pub fn code(&self) -> i32 {
        match self {
            Self::Stream(_) => -1,
            Self::Unresolved(_) => -2,
            Self::Structural(_) => -3,
            Self::External(e) if e.code < 0 => e.code,
            Self::External(_) => LoweringError::FALLBACK_CODE,
        }
    }
}
