//! In-memory SPIR-V module model.
//!
//! An arena of instruction nodes with resolved references, a word-stream
//! codec, interning of types and constants, and a builder for appending
//! function bodies. Lowering passes operate on [`Module`] and encode it
//! back to words at the end.

pub mod arena;
mod builder;
mod decode;
mod display;
mod encode;
mod error;
mod inst;
mod module;
pub mod stream;

pub use arena::{Arena, Handle};
pub use builder::Builder;
pub use display::{dump_module, format_inst};
pub use error::IrError;
pub use inst::{Id, InstKind, Instruction, Ref, Word, opname};
pub use module::{Block, DEFAULT_VERSION, EntryPointDefinition, FunctionDefinition, Header, Module};
pub use stream::{words_from_bytes, words_to_bytes};

/// Re-export of the SPIR-V enumerations used throughout the IR.
pub use rspirv::spirv;
