//! Host-side collaborators.
//!
//! The lowering stage needs facts only the host compiler knows: which
//! kernels are exported and with what signature, how the native compiler
//! laid out the global block, and which globals are allocation-backed.
//! It also hands the module to two external lowering transforms. These
//! are traits so a driver can plug in its own implementations.

use rsov_ir::{IrError, Module, Ref, Word};

use crate::signature::ForEachSignature;

/// One exported foreach kernel, as listed in the kernel metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedKernel {
    pub name: String,
    pub signature: ForEachSignature,
    /// Number of input allocations the kernel reads.
    pub input_count: u32,
}

impl ExportedKernel {
    pub fn new(name: impl Into<String>, signature: ForEachSignature, input_count: u32) -> Self {
        Self {
            name: name.into(),
            signature,
            input_count,
        }
    }
}

/// The native compiler's view of the global block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GlobalLayout {
    /// A struct; byte offset of each member in declaration order.
    Struct { member_offsets: Vec<u32> },
    /// The global exists natively but is not a pointer to a struct.
    NotAStruct,
}

/// Facts about the native module the kernel was compiled from.
pub trait HostModule {
    /// Layout of the native global block, or `None` if the native module has none.
    fn global_block_layout(&self) -> Option<GlobalLayout>;

    /// Names of allocation-backed globals, or `None` if they cannot be determined.
    fn allocations(&self) -> Option<Vec<String>>;
}

/// A host with no global block and no allocations.
impl HostModule for () {
    fn global_block_layout(&self) -> Option<GlobalLayout> {
        None
    }

    fn allocations(&self) -> Option<Vec<String>> {
        None
    }
}

/// A host described by plain data, e.g. parsed from command-line flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticHost {
    pub layout: Option<GlobalLayout>,
    pub allocations: Option<Vec<String>>,
}

impl HostModule for StaticHost {
    fn global_block_layout(&self) -> Option<GlobalLayout> {
        self.layout.clone()
    }

    fn allocations(&self) -> Option<Vec<String>> {
        self.allocations.clone()
    }
}

/// Failure reported by an external lowering transform.
///
/// `code` should be negative; other values are reported as
/// [`LoweringError::FALLBACK_CODE`].
#[derive(Debug, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct LoweringError {
    pub code: i32,
    pub message: String,
}

impl LoweringError {
    /// Status for a transform failure that carries no usable code.
    pub const FALLBACK_CODE: i32 = -4;
}

/// The module could not be encoded at a hand-off.
impl From<IrError> for LoweringError {
    fn from(err: IrError) -> Self {
        Self {
            code: Self::FALLBACK_CODE,
            message: err.to_string(),
        }
    }
}

/// The two external transforms the pipeline hands the module to.
pub trait Lowering {
    /// Rewrites runtime builtin calls and returns the encoded result.
    fn translate_builtins(&mut self, module: &mut Module) -> Result<Vec<Word>, LoweringError>;

    /// Rewrites allocation accessors against the metadata variable and
    /// returns the final encoded binary.
    fn translate_accessors(
        &mut self,
        module: &mut Module,
        metadata: Ref,
    ) -> Result<Vec<Word>, LoweringError>;
}

/// Lowering that encodes the module unchanged at both hand-offs.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughLowering;

impl Lowering for PassthroughLowering {
    fn translate_builtins(&mut self, module: &mut Module) -> Result<Vec<Word>, LoweringError> {
        Ok(module.encode()?)
    }

    fn translate_accessors(
        &mut self,
        module: &mut Module,
        _metadata: Ref,
    ) -> Result<Vec<Word>, LoweringError> {
        Ok(module.encode()?)
    }
}
