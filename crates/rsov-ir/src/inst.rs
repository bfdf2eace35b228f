//! Instruction nodes.
//!
//! Every construct of a module is an [`Instruction`] in the module arena.
//! Instructions the transformation reasons about are modelled as typed
//! [`InstKind`] variants whose id operands are [`Ref`]s; everything else
//! travels as [`InstKind::Other`] with its operand words kept verbatim.

use rspirv::spirv::{
    AddressingModel, Capability, Decoration, ExecutionMode, MemoryModel, Op, StorageClass,
};

use crate::arena::Handle;

/// A 32-bit word of the binary format.
pub type Word = u32;

/// A numeric result identifier as it appears on the wire.
pub type Id = u32;

/// A resolved reference to another instruction of the same module.
pub type Ref = Handle<Instruction>;

/// An instruction: optional result type, optional result id, and its operands.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Instruction {
    pub result_type: Option<Ref>,
    pub result_id: Option<Id>,
    pub kind: InstKind,
}

/// The closed set of instruction shapes.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum InstKind {
    /// Stand-in for an id that was referenced before its definition was decoded.
    Placeholder,

    Capability(Capability),
    Extension(String),
    ExtInstImport(String),
    MemoryModel {
        addressing: AddressingModel,
        memory: MemoryModel,
    },
    ExecutionMode {
        entry: Ref,
        mode: ExecutionMode,
        operands: Vec<Word>,
    },

    SourceExtension(String),
    Name {
        target: Ref,
        name: String,
    },
    MemberName {
        target: Ref,
        member: u32,
        name: String,
    },

    Decorate {
        target: Ref,
        decoration: Decoration,
        operands: Vec<Word>,
    },
    MemberDecorate {
        target: Ref,
        member: u32,
        decoration: Decoration,
        operands: Vec<Word>,
    },

    TypeVoid,
    TypeBool,
    TypeInt {
        width: u32,
        signed: bool,
    },
    TypeFloat {
        width: u32,
    },
    TypeVector {
        component: Ref,
        count: u32,
    },
    TypeArray {
        element: Ref,
        length: Ref,
    },
    TypeRuntimeArray {
        element: Ref,
    },
    TypeStruct {
        members: Vec<Ref>,
    },
    TypePointer {
        storage: StorageClass,
        pointee: Ref,
    },
    /// Forward declaration of a pointer type; carries no result id of its own.
    TypeForwardPointer {
        pointer: Ref,
        storage: StorageClass,
    },
    TypeFunction {
        return_type: Ref,
        parameters: Vec<Ref>,
    },

    /// A scalar constant; the value words follow the type's width.
    Constant(Vec<Word>),
    ConstantComposite(Vec<Ref>),

    Variable {
        storage: StorageClass,
        initializer: Option<Ref>,
    },

    Function {
        control: Word,
        function_type: Ref,
    },
    FunctionParameter,
    Label,

    Load {
        pointer: Ref,
        memory_access: Vec<Word>,
    },
    Store {
        pointer: Ref,
        object: Ref,
        memory_access: Vec<Word>,
    },
    AccessChain {
        base: Ref,
        indices: Vec<Ref>,
    },
    CompositeExtract {
        composite: Ref,
        indices: Vec<u32>,
    },
    IAdd(Ref, Ref),
    IMul(Ref, Ref),
    FunctionCall {
        function: Ref,
        arguments: Vec<Ref>,
    },
    Return,
    ReturnValue(Ref),

    /// Any opcode not modelled above. Result type and id are split off into
    /// the [`Instruction`]; the remaining words are opaque.
    Other {
        opcode: u16,
        operands: Vec<Word>,
    },
}

impl Instruction {
    /// An instruction without result type or result id.
    pub fn new(kind: InstKind) -> Self {
        Self {
            result_type: None,
            result_id: None,
            kind,
        }
    }

    /// An instruction defining `id`, optionally typed.
    pub fn with_result(result_type: Option<Ref>, id: Id, kind: InstKind) -> Self {
        Self {
            result_type,
            result_id: Some(id),
            kind,
        }
    }

    pub(crate) fn placeholder(id: Id) -> Self {
        Self::with_result(None, id, InstKind::Placeholder)
    }

    /// Returns `true` for an id that was referenced but never defined.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, InstKind::Placeholder)
    }

    /// The numeric opcode this instruction encodes to.
    pub fn opcode(&self) -> u16 {
        let op = match &self.kind {
            InstKind::Other { opcode, .. } => return *opcode,
            InstKind::Placeholder => Op::Nop,
            InstKind::Capability(_) => Op::Capability,
            InstKind::Extension(_) => Op::Extension,
            InstKind::ExtInstImport(_) => Op::ExtInstImport,
            InstKind::MemoryModel { .. } => Op::MemoryModel,
            InstKind::ExecutionMode { .. } => Op::ExecutionMode,
            InstKind::SourceExtension(_) => Op::SourceExtension,
            InstKind::Name { .. } => Op::Name,
            InstKind::MemberName { .. } => Op::MemberName,
            InstKind::Decorate { .. } => Op::Decorate,
            InstKind::MemberDecorate { .. } => Op::MemberDecorate,
            InstKind::TypeVoid => Op::TypeVoid,
            InstKind::TypeBool => Op::TypeBool,
            InstKind::TypeInt { .. } => Op::TypeInt,
            InstKind::TypeFloat { .. } => Op::TypeFloat,
            InstKind::TypeVector { .. } => Op::TypeVector,
            InstKind::TypeArray { .. } => Op::TypeArray,
            InstKind::TypeRuntimeArray { .. } => Op::TypeRuntimeArray,
            InstKind::TypeStruct { .. } => Op::TypeStruct,
            InstKind::TypePointer { .. } => Op::TypePointer,
            InstKind::TypeForwardPointer { .. } => Op::TypeForwardPointer,
            InstKind::TypeFunction { .. } => Op::TypeFunction,
            InstKind::Constant(_) => Op::Constant,
            InstKind::ConstantComposite(_) => Op::ConstantComposite,
            InstKind::Variable { .. } => Op::Variable,
            InstKind::Function { .. } => Op::Function,
            InstKind::FunctionParameter => Op::FunctionParameter,
            InstKind::Label => Op::Label,
            InstKind::Load { .. } => Op::Load,
            InstKind::Store { .. } => Op::Store,
            InstKind::AccessChain { .. } => Op::AccessChain,
            InstKind::CompositeExtract { .. } => Op::CompositeExtract,
            InstKind::IAdd(..) => Op::IAdd,
            InstKind::IMul(..) => Op::IMul,
            InstKind::FunctionCall { .. } => Op::FunctionCall,
            InstKind::Return => Op::Return,
            InstKind::ReturnValue(_) => Op::ReturnValue,
        };
        op as u16
    }

    /// Human-readable opcode name, e.g. `OpTypeInt`.
    pub fn opname(&self) -> String {
        opname(self.opcode())
    }

    /// Returns `true` for type declarations.
    pub fn is_type(&self) -> bool {
        matches!(
            self.kind,
            InstKind::TypeVoid
                | InstKind::TypeBool
                | InstKind::TypeInt { .. }
                | InstKind::TypeFloat { .. }
                | InstKind::TypeVector { .. }
                | InstKind::TypeArray { .. }
                | InstKind::TypeRuntimeArray { .. }
                | InstKind::TypeStruct { .. }
                | InstKind::TypePointer { .. }
                | InstKind::TypeFunction { .. }
        )
    }

    /// Every instruction this one references, result type first.
    ///
    /// Opaque operands of [`InstKind::Other`] are not inspected.
    pub fn references(&self) -> Vec<Ref> {
        let mut refs: Vec<Ref> = self.result_type.into_iter().collect();
        match &self.kind {
            InstKind::ExecutionMode { entry, .. } => refs.push(*entry),
            InstKind::Name { target, .. }
            | InstKind::MemberName { target, .. }
            | InstKind::Decorate { target, .. }
            | InstKind::MemberDecorate { target, .. } => refs.push(*target),
            InstKind::TypeVector { component, .. } => refs.push(*component),
            InstKind::TypeArray { element, length } => refs.extend([*element, *length]),
            InstKind::TypeRuntimeArray { element } => refs.push(*element),
            InstKind::TypeStruct { members } => refs.extend(members),
            InstKind::TypePointer { pointee, .. } => refs.push(*pointee),
            InstKind::TypeForwardPointer { pointer, .. } => refs.push(*pointer),
            InstKind::TypeFunction {
                return_type,
                parameters,
            } => {
                refs.push(*return_type);
                refs.extend(parameters);
            }
            InstKind::ConstantComposite(parts) => refs.extend(parts),
            InstKind::Variable { initializer, .. } => refs.extend(initializer),
            InstKind::Function { function_type, .. } => refs.push(*function_type),
            InstKind::Load { pointer, .. } => refs.push(*pointer),
            InstKind::Store { pointer, object, .. } => refs.extend([*pointer, *object]),
            InstKind::AccessChain { base, indices } => {
                refs.push(*base);
                refs.extend(indices);
            }
            InstKind::CompositeExtract { composite, .. } => refs.push(*composite),
            InstKind::IAdd(a, b) | InstKind::IMul(a, b) => refs.extend([*a, *b]),
            InstKind::FunctionCall {
                function,
                arguments,
            } => {
                refs.push(*function);
                refs.extend(arguments);
            }
            InstKind::ReturnValue(value) => refs.push(*value),
            _ => {}
        }
        refs
    }
}

/// Human-readable name for a raw opcode.
pub fn opname(opcode: u16) -> String {
    match Op::from_u32(u32::from(opcode)) {
        Some(op) => format!("Op{op:?}"),
        None => format!("Op<{opcode}>"),
    }
}
