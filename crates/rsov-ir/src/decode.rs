//! Decoding a word stream into a [`Module`], and identifier resolution.
//!
//! Decoding is two-phase. While reading, every id operand becomes a
//! [`Ref`]: to the defining instruction if it was already seen, or to a
//! placeholder node that the definition later overwrites in place. After
//! the whole stream is read, [`Module::resolve_ids`] checks that no
//! placeholder is left, i.e. that every referenced id was declared.

use rspirv::grammar::{CoreInstructionTable, OperandKind};
use rspirv::spirv::{
    AddressingModel, Capability, Decoration, ExecutionMode, ExecutionModel, MemoryModel, Op,
    StorageClass,
};

use crate::error::IrError;
use crate::inst::{Id, InstKind, Instruction, Ref, Word, opname};
use crate::module::{Block, EntryPointDefinition, FunctionDefinition, Header, Module};
use crate::stream::{HEADER_WORDS, MAGIC, MAX_ID_BOUND, WordReader};

impl Module {
    /// Decodes a complete binary. Ids are not yet checked; call
    /// [`Module::resolve_ids`] before transforming the result.
    pub fn decode(words: &[Word]) -> Result<Module, IrError> {
        let mut reader = WordReader::new(words);
        let header = reader.read_slice(HEADER_WORDS)?;
        if header[0] != MAGIC {
            return Err(IrError::BadMagic(header[0]));
        }
        if header[3] > MAX_ID_BOUND {
            return Err(IrError::BoundTooLarge(header[3]));
        }
        let mut decoder = Decoder {
            module: Module::new(),
            function: None,
            block: None,
        };
        decoder.module.header = Header {
            version: header[1],
            generator: header[2],
            bound: header[3].max(1),
        };

        while !reader.is_empty() {
            let offset = reader.offset();
            let first = reader.read_word()?;
            let word_count = (first >> 16) as usize;
            let opcode = (first & 0xffff) as u16;
            if word_count == 0 {
                return Err(IrError::ZeroWordCount { offset });
            }
            let operands = reader.read_slice(word_count - 1)?;
            let mut operands = WordReader::with_base(operands, offset + 1);
            decoder.instruction(offset, opcode, &mut operands)?;
        }

        if decoder.function.is_some() {
            return Err(malformed(Op::Function as u16, words.len(), "missing OpFunctionEnd"));
        }
        Ok(decoder.module)
    }

    /// Verifies that every referenced id was defined and builds the interning tables.
    pub fn resolve_ids(&mut self) -> Result<(), IrError> {
        let unresolved = self
            .instructions()
            .filter(|(_, inst)| inst.is_placeholder())
            .filter_map(|(_, inst)| inst.result_id)
            .min();
        if let Some(id) = unresolved {
            return Err(IrError::UnresolvedId(id));
        }
        self.rebuild_indices();
        Ok(())
    }
}

fn malformed(opcode: u16, offset: usize, reason: impl Into<String>) -> IrError {
    IrError::Malformed {
        opname: opname(opcode),
        offset,
        reason: reason.into(),
    }
}

struct Decoder {
    module: Module,
    function: Option<FunctionDefinition>,
    block: Option<Block>,
}

/// Operand reader for a single instruction.
struct Operands<'r, 'a> {
    reader: &'r mut WordReader<'a>,
    opcode: u16,
    offset: usize,
}

impl Operands<'_, '_> {
    fn word(&mut self) -> Result<Word, IrError> {
        self.reader
            .read_word()
            .map_err(|_| malformed(self.opcode, self.offset, "missing operand"))
    }

    fn string(&mut self) -> Result<String, IrError> {
        self.reader.read_string()
    }

    fn rest(&mut self) -> Vec<Word> {
        self.reader.read_rest()
    }

    fn finish(&self) -> Result<(), IrError> {
        if self.reader.is_empty() {
            Ok(())
        } else {
            Err(malformed(self.opcode, self.offset, "trailing operands"))
        }
    }

    fn enumerant<T>(&mut self, what: &str, parse: fn(u32) -> Option<T>) -> Result<T, IrError> {
        let word = self.word()?;
        parse(word).ok_or_else(|| malformed(self.opcode, self.offset, format!("unknown {what} {word}")))
    }
}

impl Decoder {
    /// Ids are non-zero and below the header bound.
    fn check_id(&self, id: Id) -> Result<Id, IrError> {
        let bound = self.module.header.bound;
        if id == 0 || id >= bound {
            return Err(IrError::IdOutOfBound { id, bound });
        }
        Ok(id)
    }

    /// The node for `id`, creating a placeholder for forward references.
    fn reference(&mut self, id: Id) -> Result<Ref, IrError> {
        let id = self.check_id(id)?;
        Ok(match self.module.by_id(id) {
            Some(handle) => handle,
            None => self.module.append(Instruction::placeholder(id)),
        })
    }

    fn id(&mut self, ops: &mut Operands<'_, '_>) -> Result<Ref, IrError> {
        let id = ops.word()?;
        self.reference(id)
    }

    fn ids(&mut self, ops: &mut Operands<'_, '_>) -> Result<Vec<Ref>, IrError> {
        ops.rest().into_iter().map(|id| self.reference(id)).collect()
    }

    /// Places a decoded instruction in the arena, filling its placeholder if one exists.
    fn insert(&mut self, inst: Instruction) -> Result<Ref, IrError> {
        let Some(id) = inst.result_id else {
            return Ok(self.module.append(inst));
        };
        self.check_id(id)?;
        match self.module.by_id(id) {
            Some(handle) if self.module[handle].is_placeholder() => {
                self.module[handle] = inst;
                Ok(handle)
            }
            Some(_) => Err(IrError::DuplicateId(id)),
            None => Ok(self.module.append(inst)),
        }
    }

    fn instruction(
        &mut self,
        offset: usize,
        opcode: u16,
        reader: &mut WordReader<'_>,
    ) -> Result<(), IrError> {
        let mut ops = Operands {
            reader,
            opcode,
            offset,
        };
        let op = Op::from_u32(u32::from(opcode));

        // Module-level constructs that do not become plain instructions.
        match op {
            Some(Op::EntryPoint) => {
                let model = ops.enumerant("execution model", ExecutionModel::from_u32)?;
                let function = self.id(&mut ops)?;
                let name = ops.string()?;
                let interface = self.ids(&mut ops)?;
                self.module.entry_points.push(EntryPointDefinition {
                    model,
                    function,
                    name,
                    interface,
                    local_size: None,
                });
                return Ok(());
            }
            Some(Op::ExecutionMode) => {
                let entry = self.id(&mut ops)?;
                let mode = ops.enumerant("execution mode", ExecutionMode::from_u32)?;
                let operands = ops.rest();
                if mode == ExecutionMode::LocalSize && operands.len() == 3 {
                    if let Some(ep) = self
                        .module
                        .entry_points
                        .iter_mut()
                        .find(|ep| ep.function == entry)
                    {
                        ep.local_size = Some([operands[0], operands[1], operands[2]]);
                        return Ok(());
                    }
                }
                let handle = self.insert(Instruction::new(InstKind::ExecutionMode {
                    entry,
                    mode,
                    operands,
                }))?;
                self.module.execution_modes.push(handle);
                return Ok(());
            }
            Some(Op::FunctionEnd) => {
                ops.finish()?;
                let mut function = self
                    .function
                    .take()
                    .ok_or_else(|| malformed(opcode, offset, "OpFunctionEnd outside a function"))?;
                function.blocks.extend(self.block.take());
                self.module.functions.push(function);
                return Ok(());
            }
            _ => {}
        }

        let inst = self.parse(op, &mut ops)?;
        let handle = self.insert(inst)?;
        self.place(op, handle, offset)
    }

    fn parse(&mut self, op: Option<Op>, ops: &mut Operands<'_, '_>) -> Result<Instruction, IrError> {
        let Some(op) = op else {
            return self.parse_other(ops);
        };

        let inst = match op {
            Op::Capability => {
                Instruction::new(InstKind::Capability(ops.enumerant("capability", Capability::from_u32)?))
            }
            Op::Extension => Instruction::new(InstKind::Extension(ops.string()?)),
            Op::ExtInstImport => {
                let id = ops.word()?;
                Instruction::with_result(None, id, InstKind::ExtInstImport(ops.string()?))
            }
            Op::MemoryModel => {
                let addressing = ops.enumerant("addressing model", AddressingModel::from_u32)?;
                let memory = ops.enumerant("memory model", MemoryModel::from_u32)?;
                Instruction::new(InstKind::MemoryModel { addressing, memory })
            }
            Op::SourceExtension => Instruction::new(InstKind::SourceExtension(ops.string()?)),
            Op::Name => {
                let target = self.id(ops)?;
                let name = ops.string()?;
                Instruction::new(InstKind::Name { target, name })
            }
            Op::MemberName => {
                let target = self.id(ops)?;
                let member = ops.word()?;
                let name = ops.string()?;
                Instruction::new(InstKind::MemberName {
                    target,
                    member,
                    name,
                })
            }
            Op::Decorate => {
                let target = self.id(ops)?;
                let decoration = ops.enumerant("decoration", Decoration::from_u32)?;
                let operands = ops.rest();
                Instruction::new(InstKind::Decorate {
                    target,
                    decoration,
                    operands,
                })
            }
            Op::MemberDecorate => {
                let target = self.id(ops)?;
                let member = ops.word()?;
                let decoration = ops.enumerant("decoration", Decoration::from_u32)?;
                let operands = ops.rest();
                Instruction::new(InstKind::MemberDecorate {
                    target,
                    member,
                    decoration,
                    operands,
                })
            }
            Op::TypeVoid => self.result_only(ops, InstKind::TypeVoid)?,
            Op::TypeBool => self.result_only(ops, InstKind::TypeBool)?,
            Op::TypeInt => {
                let id = ops.word()?;
                let width = ops.word()?;
                let signed = ops.word()? != 0;
                Instruction::with_result(None, id, InstKind::TypeInt { width, signed })
            }
            Op::TypeFloat => {
                let id = ops.word()?;
                let width = ops.word()?;
                Instruction::with_result(None, id, InstKind::TypeFloat { width })
            }
            Op::TypeVector => {
                let id = ops.word()?;
                let component = self.id(ops)?;
                let count = ops.word()?;
                Instruction::with_result(None, id, InstKind::TypeVector { component, count })
            }
            Op::TypeArray => {
                let id = ops.word()?;
                let element = self.id(ops)?;
                let length = self.id(ops)?;
                Instruction::with_result(None, id, InstKind::TypeArray { element, length })
            }
            Op::TypeRuntimeArray => {
                let id = ops.word()?;
                let element = self.id(ops)?;
                Instruction::with_result(None, id, InstKind::TypeRuntimeArray { element })
            }
            Op::TypeStruct => {
                let id = ops.word()?;
                let members = self.ids(ops)?;
                Instruction::with_result(None, id, InstKind::TypeStruct { members })
            }
            Op::TypePointer => {
                let id = ops.word()?;
                let storage = ops.enumerant("storage class", StorageClass::from_u32)?;
                let pointee = self.id(ops)?;
                Instruction::with_result(None, id, InstKind::TypePointer { storage, pointee })
            }
            Op::TypeForwardPointer => {
                let pointer = self.id(ops)?;
                let storage = ops.enumerant("storage class", StorageClass::from_u32)?;
                Instruction::new(InstKind::TypeForwardPointer { pointer, storage })
            }
            Op::TypeFunction => {
                let id = ops.word()?;
                let return_type = self.id(ops)?;
                let parameters = self.ids(ops)?;
                Instruction::with_result(
                    None,
                    id,
                    InstKind::TypeFunction {
                        return_type,
                        parameters,
                    },
                )
            }
            Op::Constant => {
                let (ty, id) = self.typed_result(ops)?;
                Instruction::with_result(Some(ty), id, InstKind::Constant(ops.rest()))
            }
            Op::ConstantComposite => {
                let (ty, id) = self.typed_result(ops)?;
                let parts = self.ids(ops)?;
                Instruction::with_result(Some(ty), id, InstKind::ConstantComposite(parts))
            }
            Op::Variable => {
                let (ty, id) = self.typed_result(ops)?;
                let storage = ops.enumerant("storage class", StorageClass::from_u32)?;
                let initializer = if ops.reader.is_empty() {
                    None
                } else {
                    Some(self.id(ops)?)
                };
                Instruction::with_result(Some(ty), id, InstKind::Variable { storage, initializer })
            }
            Op::Function => {
                let (ty, id) = self.typed_result(ops)?;
                let control = ops.word()?;
                let function_type = self.id(ops)?;
                Instruction::with_result(
                    Some(ty),
                    id,
                    InstKind::Function {
                        control,
                        function_type,
                    },
                )
            }
            Op::FunctionParameter => {
                let (ty, id) = self.typed_result(ops)?;
                Instruction::with_result(Some(ty), id, InstKind::FunctionParameter)
            }
            Op::Label => self.result_only(ops, InstKind::Label)?,
            Op::Load => {
                let (ty, id) = self.typed_result(ops)?;
                let pointer = self.id(ops)?;
                let memory_access = ops.rest();
                Instruction::with_result(Some(ty), id, InstKind::Load { pointer, memory_access })
            }
            Op::Store => {
                let pointer = self.id(ops)?;
                let object = self.id(ops)?;
                let memory_access = ops.rest();
                Instruction::new(InstKind::Store {
                    pointer,
                    object,
                    memory_access,
                })
            }
            Op::AccessChain => {
                let (ty, id) = self.typed_result(ops)?;
                let base = self.id(ops)?;
                let indices = self.ids(ops)?;
                Instruction::with_result(Some(ty), id, InstKind::AccessChain { base, indices })
            }
            Op::CompositeExtract => {
                let (ty, id) = self.typed_result(ops)?;
                let composite = self.id(ops)?;
                let indices = ops.rest();
                Instruction::with_result(
                    Some(ty),
                    id,
                    InstKind::CompositeExtract { composite, indices },
                )
            }
            Op::IAdd | Op::IMul => {
                let (ty, id) = self.typed_result(ops)?;
                let a = self.id(ops)?;
                let b = self.id(ops)?;
                let kind = match op {
                    Op::IAdd => InstKind::IAdd(a, b),
                    _ => InstKind::IMul(a, b),
                };
                Instruction::with_result(Some(ty), id, kind)
            }
            Op::FunctionCall => {
                let (ty, id) = self.typed_result(ops)?;
                let function = self.id(ops)?;
                let arguments = self.ids(ops)?;
                Instruction::with_result(
                    Some(ty),
                    id,
                    InstKind::FunctionCall {
                        function,
                        arguments,
                    },
                )
            }
            Op::Return => Instruction::new(InstKind::Return),
            Op::ReturnValue => {
                let value = self.id(ops)?;
                Instruction::new(InstKind::ReturnValue(value))
            }
            _ => return self.parse_other(ops),
        };
        ops.finish()?;
        Ok(inst)
    }

    fn result_only(&mut self, ops: &mut Operands<'_, '_>, kind: InstKind) -> Result<Instruction, IrError> {
        let id = ops.word()?;
        Ok(Instruction::with_result(None, id, kind))
    }

    fn typed_result(&mut self, ops: &mut Operands<'_, '_>) -> Result<(Ref, Id), IrError> {
        let ty = self.id(ops)?;
        let id = ops.word()?;
        Ok((ty, id))
    }

    /// An opcode outside the modelled set. The grammar says whether it
    /// starts with a result type and result id; everything after is opaque.
    fn parse_other(&mut self, ops: &mut Operands<'_, '_>) -> Result<Instruction, IrError> {
        let (has_type, has_result) = match CoreInstructionTable::lookup_opcode(ops.opcode) {
            Some(grammar) => {
                let first = grammar.operands.first().map(|o| &o.kind);
                let second = grammar.operands.get(1).map(|o| &o.kind);
                match (first, second) {
                    (Some(OperandKind::IdResultType), Some(OperandKind::IdResult)) => (true, true),
                    (Some(OperandKind::IdResult), _) => (false, true),
                    _ => (false, false),
                }
            }
            None => (false, false),
        };
        let mut words = ops.rest().into_iter();
        let result_type = match has_type.then(|| words.next()).flatten() {
            Some(id) => Some(self.reference(id)?),
            None => None,
        };
        let result_id = if has_result { words.next() } else { None };
        Ok(Instruction {
            result_type,
            result_id,
            kind: InstKind::Other {
                opcode: ops.opcode,
                operands: words.collect(),
            },
        })
    }

    /// Routes a decoded instruction to its module section or the open function.
    fn place(&mut self, op: Option<Op>, handle: Ref, offset: usize) -> Result<(), IrError> {
        let opcode = self.module[handle].opcode();

        if let Some(function) = self.function.as_mut() {
            match op {
                Some(Op::Function) => {
                    return Err(malformed(opcode, offset, "nested OpFunction"));
                }
                Some(Op::FunctionParameter) => {
                    if self.block.is_some() || !function.blocks.is_empty() {
                        return Err(malformed(opcode, offset, "parameter after first block"));
                    }
                    function.parameters.push(handle);
                }
                Some(Op::Label) => {
                    function.blocks.extend(self.block.take());
                    self.block = Some(Block {
                        label: handle,
                        body: Vec::new(),
                    });
                }
                _ => match self.block.as_mut() {
                    Some(block) => block.body.push(handle),
                    None => {
                        return Err(malformed(opcode, offset, "instruction outside a block"));
                    }
                },
            }
            return Ok(());
        }

        let module = &mut self.module;
        match op {
            Some(Op::Capability) => module.capabilities.push(handle),
            Some(Op::Extension) => module.extensions.push(handle),
            Some(Op::ExtInstImport) => module.ext_inst_imports.push(handle),
            Some(Op::MemoryModel) => module.memory_model = Some(handle),
            Some(Op::ExecutionModeId) => module.execution_modes.push(handle),
            Some(
                Op::String
                | Op::Source
                | Op::SourceContinued
                | Op::SourceExtension
                | Op::Name
                | Op::MemberName
                | Op::ModuleProcessed,
            ) => module.debug.push(handle),
            Some(
                Op::Decorate
                | Op::MemberDecorate
                | Op::DecorationGroup
                | Op::GroupDecorate
                | Op::GroupMemberDecorate
                | Op::DecorateId
                | Op::DecorateString
                | Op::MemberDecorateString,
            ) => module.annotations.push(handle),
            Some(Op::Function) => self.function = Some(FunctionDefinition::new(handle)),
            Some(Op::FunctionParameter | Op::Label) => {
                return Err(malformed(opcode, offset, "outside a function"));
            }
            _ => module.globals.push(handle),
        }
        Ok(())
    }
}
