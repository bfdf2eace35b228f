//! The module: owning registry for every instruction of one binary.

use std::collections::{HashMap, HashSet};
use std::ops::{Index, IndexMut};

use rspirv::spirv::{
    AddressingModel, BuiltIn, Capability, Decoration, ExecutionModel, MemoryModel, Op,
    SourceLanguage, StorageClass,
};

use crate::arena::Arena;
use crate::error::IrError;
use crate::inst::{Id, InstKind, Instruction, Ref, Word};

/// SPIR-V 1.0, the version written for freshly created modules.
pub const DEFAULT_VERSION: Word = 0x0001_0000;

/// Module header fields other than the magic number and schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: Word,
    pub generator: Word,
    /// One past the largest result id in use.
    pub bound: Id,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            generator: 0,
            bound: 1,
        }
    }
}

/// A GPU-invocable entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPointDefinition {
    pub model: ExecutionModel,
    /// The `OpFunction` instruction this entry point invokes.
    pub function: Ref,
    pub name: String,
    /// Global variables the entry point statically uses.
    pub interface: Vec<Ref>,
    /// Workgroup dimensions, emitted as a `LocalSize` execution mode.
    pub local_size: Option<[u32; 3]>,
}

impl EntryPointDefinition {
    pub fn new(model: ExecutionModel, function: Ref, name: impl Into<String>) -> Self {
        Self {
            model,
            function,
            name: name.into(),
            interface: Vec::new(),
            local_size: None,
        }
    }

    pub fn set_local_size(&mut self, x: u32, y: u32, z: u32) {
        self.local_size = Some([x, y, z]);
    }

    pub fn add_to_interface(&mut self, variable: Ref) {
        self.interface.push(variable);
    }
}

/// A basic block: a label followed by its instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub label: Ref,
    pub body: Vec<Ref>,
}

/// A function: its `OpFunction`, parameters, and blocks.
///
/// A function without blocks is a declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub function: Ref,
    pub parameters: Vec<Ref>,
    pub blocks: Vec<Block>,
}

impl FunctionDefinition {
    pub fn new(function: Ref) -> Self {
        Self {
            function,
            parameters: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn parameter(&self, index: usize) -> Option<Ref> {
        self.parameters.get(index).copied()
    }
}

/// Structural identity of a type, used for interning.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
enum TypeKey {
    Void,
    Bool,
    Int(u32, bool),
    Float(u32),
    Vector(Ref, u32),
    Array(Ref, Ref),
    RuntimeArray(Ref),
    Struct(Vec<Ref>),
    Pointer(StorageClass, Ref),
    Function(Ref, Vec<Ref>),
}

impl TypeKey {
    fn of(kind: &InstKind) -> Option<Self> {
        Some(match kind {
            InstKind::TypeVoid => Self::Void,
            InstKind::TypeBool => Self::Bool,
            InstKind::TypeInt { width, signed } => Self::Int(*width, *signed),
            InstKind::TypeFloat { width } => Self::Float(*width),
            InstKind::TypeVector { component, count } => Self::Vector(*component, *count),
            InstKind::TypeArray { element, length } => Self::Array(*element, *length),
            InstKind::TypeRuntimeArray { element } => Self::RuntimeArray(*element),
            InstKind::TypeStruct { members } => Self::Struct(members.clone()),
            InstKind::TypePointer { storage, pointee } => Self::Pointer(*storage, *pointee),
            InstKind::TypeFunction {
                return_type,
                parameters,
            } => Self::Function(*return_type, parameters.clone()),
            _ => return None,
        })
    }
}

/// Structural identity of a constant, used for interning.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
enum ConstKey {
    Scalar(Ref, Vec<Word>),
    Composite(Ref, Vec<Ref>),
}

impl ConstKey {
    fn of(inst: &Instruction) -> Option<Self> {
        let ty = inst.result_type?;
        match &inst.kind {
            InstKind::Constant(value) => Some(Self::Scalar(ty, value.clone())),
            InstKind::ConstantComposite(parts) => Some(Self::Composite(ty, parts.clone())),
            _ => None,
        }
    }
}

/// An in-memory SPIR-V module.
///
/// All instructions live in one arena; the section lists below hold handles
/// in emission order. Types and constants are interned: asking twice for the
/// same description returns the same instruction.
#[derive(Clone, Debug, Default)]
pub struct Module {
    pub header: Header,
    insts: Arena<Instruction>,
    ids: HashMap<Id, Ref>,

    pub capabilities: Vec<Ref>,
    pub extensions: Vec<Ref>,
    pub ext_inst_imports: Vec<Ref>,
    pub memory_model: Option<Ref>,
    pub entry_points: Vec<EntryPointDefinition>,
    /// Execution modes other than `LocalSize`, which lives on the entry point.
    pub execution_modes: Vec<Ref>,
    pub debug: Vec<Ref>,
    pub annotations: Vec<Ref>,
    /// Types, constants, and global variables in declaration order.
    pub globals: Vec<Ref>,
    pub functions: Vec<FunctionDefinition>,

    types: HashMap<TypeKey, Ref>,
    constants: HashMap<ConstKey, Ref>,
    /// Types created by [`Module::fresh_struct_type`], never interned.
    distinct: HashSet<Ref>,
}

impl Index<Ref> for Module {
    type Output = Instruction;

    fn index(&self, handle: Ref) -> &Instruction {
        &self.insts[handle]
    }
}

impl IndexMut<Ref> for Module {
    fn index_mut(&mut self, handle: Ref) -> &mut Instruction {
        &mut self.insts[handle]
    }
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates over every instruction in allocation order.
    pub fn instructions(&self) -> impl Iterator<Item = (Ref, &Instruction)> {
        self.insts.iter()
    }

    /// Allocates a fresh result id.
    pub fn alloc_id(&mut self) -> Id {
        let id = self.header.bound;
        self.header.bound = self.header.bound.saturating_add(1);
        id
    }

    /// Adds an instruction to the arena, registering its result id.
    ///
    /// The instruction is not placed in any section.
    pub fn append(&mut self, inst: Instruction) -> Ref {
        let id = inst.result_id;
        let handle = self.insts.append(inst);
        if let Some(id) = id {
            self.ids.insert(id, handle);
            self.header.bound = self.header.bound.max(id.saturating_add(1));
        }
        handle
    }

    /// Adds an instruction with a freshly allocated result id.
    pub fn define(&mut self, result_type: Option<Ref>, kind: InstKind) -> Ref {
        let id = self.alloc_id();
        self.append(Instruction::with_result(result_type, id, kind))
    }

    /// The result id of `handle`; zero if the instruction defines none.
    pub fn id_of(&self, handle: Ref) -> Id {
        self.insts[handle].result_id.unwrap_or(0)
    }

    /// The instruction defining `id`, if any.
    pub fn by_id(&self, id: Id) -> Option<Ref> {
        self.ids.get(&id).copied()
    }

    // ---- interning ----

    fn intern_type(&mut self, kind: InstKind) -> Ref {
        let key = TypeKey::of(&kind);
        if let Some(&existing) = key.as_ref().and_then(|k| self.types.get(k)) {
            return existing;
        }
        let handle = self.define(None, kind);
        self.globals.push(handle);
        if let Some(key) = key {
            self.types.insert(key, handle);
        }
        handle
    }

    fn intern_constant(&mut self, ty: Ref, kind: InstKind) -> Ref {
        let probe = Instruction::with_result(Some(ty), 0, kind);
        let key = ConstKey::of(&probe);
        if let Some(&existing) = key.as_ref().and_then(|k| self.constants.get(k)) {
            return existing;
        }
        let handle = self.define(Some(ty), probe.kind);
        self.globals.push(handle);
        if let Some(key) = key {
            self.constants.insert(key, handle);
        }
        handle
    }

    /// Rebuilds the interning tables from the global section.
    ///
    /// Needed after any rewrite that changes a type's structure, such as a
    /// storage-class change. When two declarations now coincide the first wins.
    pub fn rebuild_indices(&mut self) {
        self.types.clear();
        self.constants.clear();
        for &handle in &self.globals {
            if self.distinct.contains(&handle) {
                continue;
            }
            let inst = &self.insts[handle];
            if let Some(key) = TypeKey::of(&inst.kind) {
                self.types.entry(key).or_insert(handle);
            } else if let Some(key) = ConstKey::of(inst) {
                self.constants.entry(key).or_insert(handle);
            }
        }
    }

    pub fn void_type(&mut self) -> Ref {
        self.intern_type(InstKind::TypeVoid)
    }

    pub fn bool_type(&mut self) -> Ref {
        self.intern_type(InstKind::TypeBool)
    }

    pub fn int_type(&mut self, width: u32, signed: bool) -> Ref {
        self.intern_type(InstKind::TypeInt { width, signed })
    }

    pub fn unsigned_int_type(&mut self, width: u32) -> Ref {
        self.int_type(width, false)
    }

    pub fn float_type(&mut self, width: u32) -> Ref {
        self.intern_type(InstKind::TypeFloat { width })
    }

    pub fn vector_type(&mut self, component: Ref, count: u32) -> Ref {
        self.intern_type(InstKind::TypeVector { component, count })
    }

    pub fn array_type(&mut self, element: Ref, length: Ref) -> Ref {
        self.intern_type(InstKind::TypeArray { element, length })
    }

    pub fn runtime_array_type(&mut self, element: Ref) -> Ref {
        self.intern_type(InstKind::TypeRuntimeArray { element })
    }

    pub fn struct_type(&mut self, members: &[Ref]) -> Ref {
        self.intern_type(InstKind::TypeStruct {
            members: members.to_vec(),
        })
    }

    /// A struct type distinct from every other, even structurally equal ones.
    ///
    /// Use this for structs that carry their own member decorations. It is
    /// never returned by [`Module::struct_type`].
    pub fn fresh_struct_type(&mut self, members: &[Ref]) -> Ref {
        let handle = self.define(
            None,
            InstKind::TypeStruct {
                members: members.to_vec(),
            },
        );
        self.globals.push(handle);
        self.distinct.insert(handle);
        handle
    }

    pub fn pointer_type(&mut self, storage: StorageClass, pointee: Ref) -> Ref {
        self.intern_type(InstKind::TypePointer { storage, pointee })
    }

    pub fn function_type(&mut self, return_type: Ref, parameters: &[Ref]) -> Ref {
        self.intern_type(InstKind::TypeFunction {
            return_type,
            parameters: parameters.to_vec(),
        })
    }

    /// A 32-bit scalar constant.
    pub fn constant(&mut self, ty: Ref, value: u32) -> Ref {
        self.intern_constant(ty, InstKind::Constant(vec![value]))
    }

    pub fn constant_composite(&mut self, ty: Ref, constituents: &[Ref]) -> Ref {
        self.intern_constant(ty, InstKind::ConstantComposite(constituents.to_vec()))
    }

    /// The value of a 32-bit scalar constant.
    pub fn constant_value(&self, handle: Ref) -> Option<u32> {
        match &self.insts[handle].kind {
            InstKind::Constant(words) => words.first().copied(),
            _ => None,
        }
    }

    /// The pointee of a pointer type.
    pub fn pointee(&self, pointer_type: Ref) -> Option<Ref> {
        match self.insts[pointer_type].kind {
            InstKind::TypePointer { pointee, .. } => Some(pointee),
            _ => None,
        }
    }

    /// Byte size of a type as laid out in a buffer.
    pub fn size_of(&self, ty: Ref) -> Result<u32, IrError> {
        let unsized_err = || IrError::Unsized(self.id_of(ty));
        let overflow = || IrError::SizeOverflow(self.id_of(ty));
        match &self.insts[ty].kind {
            InstKind::TypeBool => Ok(4),
            InstKind::TypeInt { width, .. } | InstKind::TypeFloat { width } => Ok(width / 8),
            InstKind::TypeVector { component, count } => self
                .size_of(*component)?
                .checked_mul(*count)
                .ok_or_else(overflow),
            InstKind::TypeArray { element, length } => {
                let length = self.constant_value(*length).ok_or_else(unsized_err)?;
                self.size_of(*element)?
                    .checked_mul(length)
                    .ok_or_else(overflow)
            }
            InstKind::TypeStruct { members } => {
                members.iter().try_fold(0u32, |acc, &m| -> Result<u32, IrError> {
                    acc.checked_add(self.size_of(m)?).ok_or_else(overflow)
                })
            }
            // 32-bit physical addressing.
            InstKind::TypePointer { .. } => Ok(4),
            _ => Err(unsized_err()),
        }
    }

    // ---- header ----

    pub fn add_capability(&mut self, capability: Capability) {
        let present = self
            .capabilities
            .iter()
            .any(|&h| self.insts[h].kind == InstKind::Capability(capability));
        if !present {
            let handle = self.append(Instruction::new(InstKind::Capability(capability)));
            self.capabilities.push(handle);
        }
    }

    pub fn add_extension(&mut self, name: &str) {
        let present = self
            .extensions
            .iter()
            .any(|&h| matches!(&self.insts[h].kind, InstKind::Extension(n) if n == name));
        if !present {
            let handle = self.append(Instruction::new(InstKind::Extension(name.to_string())));
            self.extensions.push(handle);
        }
    }

    /// Returns the import of the named extended instruction set, adding it if missing.
    pub fn add_ext_inst_import(&mut self, name: &str) -> Ref {
        let existing = self
            .ext_inst_imports
            .iter()
            .copied()
            .find(|&h| matches!(&self.insts[h].kind, InstKind::ExtInstImport(n) if n == name));
        if let Some(handle) = existing {
            return handle;
        }
        let handle = self.define(None, InstKind::ExtInstImport(name.to_string()));
        self.ext_inst_imports.push(handle);
        handle
    }

    pub fn set_memory_model(&mut self, addressing: AddressingModel, memory: MemoryModel) {
        let kind = InstKind::MemoryModel { addressing, memory };
        match self.memory_model {
            Some(handle) => self.insts[handle].kind = kind,
            None => self.memory_model = Some(self.append(Instruction::new(kind))),
        }
    }

    /// Sets the source language, replacing any existing `OpSource`.
    pub fn set_source(&mut self, language: SourceLanguage, version: u32) {
        let source = Op::Source as u16;
        let kind = InstKind::Other {
            opcode: source,
            operands: vec![language as u32, version],
        };
        let existing = self.debug.iter().copied().find(|&h| {
            matches!(self.insts[h].kind, InstKind::Other { opcode, .. } if opcode == source)
        });
        match existing {
            Some(handle) => self.insts[handle].kind = kind,
            None => {
                let handle = self.append(Instruction::new(kind));
                self.insert_debug_source(handle);
            }
        }
    }

    pub fn add_source_extension(&mut self, name: &str) {
        let present = self
            .debug
            .iter()
            .any(|&h| matches!(&self.insts[h].kind, InstKind::SourceExtension(n) if n == name));
        if !present {
            let handle =
                self.append(Instruction::new(InstKind::SourceExtension(name.to_string())));
            self.insert_debug_source(handle);
        }
    }

    /// Source declarations precede names in the debug section.
    fn insert_debug_source(&mut self, handle: Ref) {
        let at = self
            .debug
            .iter()
            .position(|&h| {
                matches!(
                    self.insts[h].kind,
                    InstKind::Name { .. } | InstKind::MemberName { .. }
                )
            })
            .unwrap_or(self.debug.len());
        self.debug.insert(at, handle);
    }

    // ---- annotations ----

    /// Attaches a decoration to `target`. Existing decorations are kept.
    pub fn decorate(&mut self, target: Ref, decoration: Decoration, operands: &[Word]) -> Ref {
        let handle = self.append(Instruction::new(InstKind::Decorate {
            target,
            decoration,
            operands: operands.to_vec(),
        }));
        self.annotations.push(handle);
        handle
    }

    /// Attaches a decoration to member `member` of struct type `target`.
    pub fn member_decorate(
        &mut self,
        target: Ref,
        member: u32,
        decoration: Decoration,
        operands: &[Word],
    ) -> Ref {
        let handle = self.append(Instruction::new(InstKind::MemberDecorate {
            target,
            member,
            decoration,
            operands: operands.to_vec(),
        }));
        self.annotations.push(handle);
        handle
    }

    /// Operands of every `decoration` attached directly to `target`.
    pub fn decorations(&self, target: Ref, decoration: Decoration) -> Vec<&[Word]> {
        self.annotations
            .iter()
            .filter_map(|&h| match &self.insts[h].kind {
                InstKind::Decorate {
                    target: t,
                    decoration: d,
                    operands,
                } if *t == target && *d == decoration => Some(operands.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Operands of every `decoration` attached to member `member` of `target`.
    pub fn member_decorations(
        &self,
        target: Ref,
        member: u32,
        decoration: Decoration,
    ) -> Vec<&[Word]> {
        self.annotations
            .iter()
            .filter_map(|&h| match &self.insts[h].kind {
                InstKind::MemberDecorate {
                    target: t,
                    member: m,
                    decoration: d,
                    operands,
                } if *t == target && *m == member && *d == decoration => {
                    Some(operands.as_slice())
                }
                _ => None,
            })
            .collect()
    }

    pub fn has_decoration(&self, target: Ref, decoration: Decoration) -> bool {
        !self.decorations(target, decoration).is_empty()
    }

    /// Drops exact-duplicate annotation instructions, keeping first occurrences in order.
    ///
    /// Returns `true` if anything was removed.
    pub fn consolidate_annotations(&mut self) -> bool {
        let before = self.annotations.len();
        let insts = &self.insts;
        let mut seen = HashSet::new();
        self.annotations.retain(|&h| seen.insert(&insts[h]));
        self.annotations.len() != before
    }

    // ---- lookup ----

    /// The first instruction carrying debug name `name`.
    pub fn lookup_by_name(&self, name: &str) -> Option<Ref> {
        self.named(name).next()
    }

    fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Ref> + 'a {
        self.debug.iter().filter_map(move |&h| match &self.insts[h].kind {
            InstKind::Name { target, name: n } if n == name => Some(*target),
            _ => None,
        })
    }

    /// The debug name of `target`, if it has one.
    pub fn name_of(&self, target: Ref) -> Option<&str> {
        self.debug.iter().find_map(|&h| match &self.insts[h].kind {
            InstKind::Name { target: t, name } if *t == target => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn set_name(&mut self, target: Ref, name: &str) {
        let handle = self.append(Instruction::new(InstKind::Name {
            target,
            name: name.to_string(),
        }));
        self.debug.push(handle);
    }

    pub fn function_definition(&self, function: Ref) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.function == function)
    }

    /// The function whose `OpName` is `name`.
    pub fn lookup_function_definition_by_name(&self, name: &str) -> Option<&FunctionDefinition> {
        self.named(name).find_map(|target| self.function_definition(target))
    }

    // ---- declarations ----

    /// Declares a global variable of `pointer_type` in `storage`.
    pub fn add_global_variable(&mut self, pointer_type: Ref, storage: StorageClass) -> Ref {
        let handle = self.define(
            Some(pointer_type),
            InstKind::Variable {
                storage,
                initializer: None,
            },
        );
        self.globals.push(handle);
        handle
    }

    pub fn add_function_definition(&mut self, function: FunctionDefinition) -> usize {
        self.functions.push(function);
        self.functions.len() - 1
    }

    pub fn add_entry_point(&mut self, entry: EntryPointDefinition) {
        self.entry_points.push(entry);
    }

    /// The `Input` variable decorated with `builtin`, created on first use as a `uvec3`.
    pub fn builtin_variable(&mut self, builtin: BuiltIn) -> Ref {
        let existing = self.annotations.iter().find_map(|&h| match &self.insts[h].kind {
            InstKind::Decorate {
                target,
                decoration: Decoration::BuiltIn,
                operands,
            } if operands.first() == Some(&(builtin as u32))
                && matches!(self.insts[*target].kind, InstKind::Variable { .. }) =>
            {
                Some(*target)
            }
            _ => None,
        });
        if let Some(variable) = existing {
            return variable;
        }
        let uint = self.unsigned_int_type(32);
        let uvec3 = self.vector_type(uint, 3);
        let pointer = self.pointer_type(StorageClass::Input, uvec3);
        let variable = self.add_global_variable(pointer, StorageClass::Input);
        self.decorate(variable, Decoration::BuiltIn, &[builtin as u32]);
        variable
    }

    pub fn invocation_id(&mut self) -> Ref {
        self.builtin_variable(BuiltIn::GlobalInvocationId)
    }

    pub fn num_workgroups(&mut self) -> Ref {
        self.builtin_variable(BuiltIn::NumWorkgroups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_interning() {
        let mut module = Module::new();
        let u32a = module.unsigned_int_type(32);
        let u32b = module.int_type(32, false);
        let i32 = module.int_type(32, true);
        assert_eq!(u32a, u32b);
        assert_ne!(u32a, i32);

        let v3a = module.vector_type(u32a, 3);
        let v3b = module.vector_type(u32b, 3);
        assert_eq!(v3a, v3b);
        assert_eq!(module.globals.len(), 3);
    }

    #[test]
    fn constant_interning() {
        let mut module = Module::new();
        let uint = module.unsigned_int_type(32);
        let sint = module.int_type(32, true);
        let one = module.constant(uint, 1);
        assert_eq!(one, module.constant(uint, 1));
        assert_ne!(one, module.constant(uint, 0));
        assert_ne!(one, module.constant(sint, 1));

        let uvec3 = module.vector_type(uint, 3);
        let ones = module.constant_composite(uvec3, &[one, one, one]);
        assert_eq!(ones, module.constant_composite(uvec3, &[one, one, one]));
    }

    #[test]
    fn ids_are_unique_and_bound_tracks_them() {
        let mut module = Module::new();
        let a = module.void_type();
        let b = module.bool_type();
        assert_ne!(module.id_of(a), module.id_of(b));
        assert!(module.header.bound > module.id_of(b));
        assert_eq!(module.by_id(module.id_of(b)), Some(b));
    }

    #[test]
    fn size_of_aggregates() {
        let mut module = Module::new();
        let float = module.float_type(32);
        let uint = module.unsigned_int_type(32);
        let vec4 = module.vector_type(float, 4);
        let st = module.struct_type(&[uint, vec4]);
        let four = module.constant(uint, 4);
        let arr = module.array_type(uint, four);
        let rta = module.runtime_array_type(uint);
        assert_eq!(module.size_of(vec4).unwrap(), 16);
        assert_eq!(module.size_of(st).unwrap(), 20);
        assert_eq!(module.size_of(arr).unwrap(), 16);
        assert!(matches!(module.size_of(rta), Err(IrError::Unsized(_))));
    }

    #[test]
    fn size_of_overflow_is_an_error() {
        let mut module = Module::new();
        let uint = module.unsigned_int_type(32);
        let huge = module.constant(uint, 0x4000_0001);
        let arr = module.array_type(uint, huge);
        assert!(matches!(module.size_of(arr), Err(IrError::SizeOverflow(_))));

        let half = module.constant(uint, 0x2000_0000);
        let big = module.array_type(uint, half);
        let st = module.struct_type(&[big, big]);
        assert!(matches!(module.size_of(st), Err(IrError::SizeOverflow(_))));
    }

    #[test]
    fn fresh_struct_is_not_interned() {
        let mut module = Module::new();
        let uint = module.unsigned_int_type(32);
        let shared = module.struct_type(&[uint, uint]);
        let fresh = module.fresh_struct_type(&[uint, uint]);
        assert_ne!(shared, fresh);
        assert_eq!(module.struct_type(&[uint, uint]), shared);

        // Also after the indices are rebuilt, with the fresh struct first.
        let mut module = Module::new();
        let uint = module.unsigned_int_type(32);
        let fresh = module.fresh_struct_type(&[uint]);
        module.rebuild_indices();
        assert_ne!(module.struct_type(&[uint]), fresh);
    }

    #[test]
    fn header_operations_deduplicate() {
        let mut module = Module::new();
        module.add_capability(Capability::Shader);
        module.add_capability(Capability::Shader);
        assert_eq!(module.capabilities.len(), 1);

        let a = module.add_ext_inst_import("GLSL.std.450");
        let b = module.add_ext_inst_import("GLSL.std.450");
        assert_eq!(a, b);

        module.set_memory_model(AddressingModel::Logical, MemoryModel::Simple);
        module.set_memory_model(AddressingModel::Physical32, MemoryModel::GLSL450);
        let mm = module.memory_model.unwrap();
        assert_eq!(
            module[mm].kind,
            InstKind::MemoryModel {
                addressing: AddressingModel::Physical32,
                memory: MemoryModel::GLSL450,
            }
        );
    }

    #[test]
    fn sources_precede_names() {
        let mut module = Module::new();
        let void = module.void_type();
        module.set_name(void, "void");
        module.set_source(SourceLanguage::GLSL, 450);
        module.add_source_extension("GL_GOOGLE_include_directive");
        module.add_source_extension("GL_GOOGLE_include_directive");
        assert_eq!(module.debug.len(), 3);
        assert!(matches!(module[module.debug[2]].kind, InstKind::Name { .. }));
    }

    #[test]
    fn consolidation_removes_exact_duplicates_only() {
        let mut module = Module::new();
        let uint = module.unsigned_int_type(32);
        let st = module.struct_type(&[uint]);
        module.member_decorate(st, 0, Decoration::Offset, &[0]);
        module.decorate(st, Decoration::BufferBlock, &[]);
        module.member_decorate(st, 0, Decoration::Offset, &[0]);
        module.member_decorate(st, 0, Decoration::Offset, &[4]);
        assert!(module.consolidate_annotations());
        assert_eq!(module.annotations.len(), 3);
        assert!(!module.consolidate_annotations());
    }

    #[test]
    fn lookup_function_by_name() {
        let mut module = Module::new();
        let void = module.void_type();
        let fn_ty = module.function_type(void, &[]);
        let func = module.define(
            Some(void),
            InstKind::Function {
                control: 0,
                function_type: fn_ty,
            },
        );
        module.add_function_definition(FunctionDefinition::new(func));
        module.set_name(func, "invert");
        assert_eq!(module.lookup_by_name("invert"), Some(func));
        assert_eq!(
            module.lookup_function_definition_by_name("invert").map(|f| f.function),
            Some(func)
        );
        assert!(module.lookup_function_definition_by_name("root").is_none());
    }

    #[test]
    fn builtin_variables_are_created_once() {
        let mut module = Module::new();
        let gid = module.invocation_id();
        assert_eq!(module.invocation_id(), gid);
        let groups = module.num_workgroups();
        assert_ne!(gid, groups);
        assert!(module.has_decoration(gid, Decoration::BuiltIn));
    }

    #[test]
    fn rebuild_indices_after_rewrite() {
        let mut module = Module::new();
        let uint = module.unsigned_int_type(32);
        let ptr = module.pointer_type(StorageClass::Function, uint);
        if let InstKind::TypePointer { storage, .. } = &mut module[ptr].kind {
            *storage = StorageClass::Uniform;
        }
        module.rebuild_indices();
        assert_eq!(module.pointer_type(StorageClass::Uniform, uint), ptr);
        assert_ne!(module.pointer_type(StorageClass::Function, uint), ptr);
    }
}
