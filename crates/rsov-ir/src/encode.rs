//! Encoding a [`Module`] back into a word stream.

use rspirv::spirv::{ExecutionMode, Op};

use crate::error::IrError;
use crate::inst::{InstKind, Instruction, Ref, Word, opname};
use crate::module::Module;
use crate::stream::{MAGIC, MAX_RECORD_WORDS, WordWriter, string_words};

impl Module {
    /// Serializes the module in logical layout order.
    ///
    /// The header bound is one past the largest id in use. Placeholder
    /// nodes are never emitted. Fails if an instruction does not fit the
    /// 16-bit word count.
    pub fn encode(&self) -> Result<Vec<Word>, IrError> {
        let mut out = WordWriter::new();
        out.write_words(&[
            MAGIC,
            self.header.version,
            self.header.generator,
            self.header.bound,
            0,
        ]);

        let sections = [&self.capabilities, &self.extensions, &self.ext_inst_imports];
        for section in sections {
            self.emit_all(&mut out, section)?;
        }
        if let Some(mm) = self.memory_model {
            self.emit(&mut out, mm)?;
        }

        for ep in &self.entry_points {
            let mut operands = vec![ep.model as u32, self.id_of(ep.function)];
            operands.extend(string_words(&ep.name));
            operands.extend(ep.interface.iter().map(|&v| self.id_of(v)));
            write_record(&mut out, Op::EntryPoint as u16, &operands)?;
        }
        for ep in &self.entry_points {
            if let Some([x, y, z]) = ep.local_size {
                let operands = [
                    self.id_of(ep.function),
                    ExecutionMode::LocalSize as u32,
                    x,
                    y,
                    z,
                ];
                write_record(&mut out, Op::ExecutionMode as u16, &operands)?;
            }
        }
        self.emit_all(&mut out, &self.execution_modes)?;

        self.emit_all(&mut out, &self.debug)?;
        self.emit_all(&mut out, &self.annotations)?;
        self.emit_all(&mut out, &self.globals)?;

        for function in &self.functions {
            self.emit(&mut out, function.function)?;
            self.emit_all(&mut out, &function.parameters)?;
            for block in &function.blocks {
                self.emit(&mut out, block.label)?;
                self.emit_all(&mut out, &block.body)?;
            }
            write_record(&mut out, Op::FunctionEnd as u16, &[])?;
        }

        Ok(out.into_words())
    }

    fn emit_all(&self, out: &mut WordWriter, handles: &[Ref]) -> Result<(), IrError> {
        for &handle in handles {
            self.emit(out, handle)?;
        }
        Ok(())
    }

    fn emit(&self, out: &mut WordWriter, handle: Ref) -> Result<(), IrError> {
        let inst = &self[handle];
        if inst.is_placeholder() {
            return Ok(());
        }
        let mut operands = Vec::new();
        if let Some(ty) = inst.result_type {
            operands.push(self.id_of(ty));
        }
        if let Some(id) = inst.result_id {
            operands.push(id);
        }
        operands.extend(self.operand_words(inst));
        write_record(out, inst.opcode(), &operands)
    }

    /// Operand words following the result type and result id.
    fn operand_words(&self, inst: &Instruction) -> Vec<Word> {
        let id = |h: &Ref| self.id_of(*h);
        let ids = |hs: &[Ref]| hs.iter().map(id).collect::<Vec<_>>();
        match &inst.kind {
            InstKind::Placeholder
            | InstKind::TypeVoid
            | InstKind::TypeBool
            | InstKind::FunctionParameter
            | InstKind::Label
            | InstKind::Return => Vec::new(),
            InstKind::Capability(capability) => vec![*capability as u32],
            InstKind::Extension(name)
            | InstKind::ExtInstImport(name)
            | InstKind::SourceExtension(name) => string_words(name),
            InstKind::MemoryModel { addressing, memory } => {
                vec![*addressing as u32, *memory as u32]
            }
            InstKind::ExecutionMode {
                entry,
                mode,
                operands,
            } => [vec![id(entry), *mode as u32], operands.clone()].concat(),
            InstKind::Name { target, name } => [vec![id(target)], string_words(name)].concat(),
            InstKind::MemberName {
                target,
                member,
                name,
            } => [vec![id(target), *member], string_words(name)].concat(),
            InstKind::Decorate {
                target,
                decoration,
                operands,
            } => [vec![id(target), *decoration as u32], operands.clone()].concat(),
            InstKind::MemberDecorate {
                target,
                member,
                decoration,
                operands,
            } => [vec![id(target), *member, *decoration as u32], operands.clone()].concat(),
            InstKind::TypeInt { width, signed } => vec![*width, u32::from(*signed)],
            InstKind::TypeFloat { width } => vec![*width],
            InstKind::TypeVector { component, count } => vec![id(component), *count],
            InstKind::TypeArray { element, length } => vec![id(element), id(length)],
            InstKind::TypeRuntimeArray { element } => vec![id(element)],
            InstKind::TypeStruct { members } => ids(members),
            InstKind::TypePointer { storage, pointee } => vec![*storage as u32, id(pointee)],
            InstKind::TypeForwardPointer { pointer, storage } => {
                vec![id(pointer), *storage as u32]
            }
            InstKind::TypeFunction {
                return_type,
                parameters,
            } => [vec![id(return_type)], ids(parameters)].concat(),
            InstKind::Constant(value) => value.clone(),
            InstKind::ConstantComposite(parts) => ids(parts),
            InstKind::Variable {
                storage,
                initializer,
            } => {
                let mut words = vec![*storage as u32];
                words.extend(initializer.as_ref().map(id));
                words
            }
            InstKind::Function {
                control,
                function_type,
            } => vec![*control, id(function_type)],
            InstKind::Load {
                pointer,
                memory_access,
            } => [vec![id(pointer)], memory_access.clone()].concat(),
            InstKind::Store {
                pointer,
                object,
                memory_access,
            } => [vec![id(pointer), id(object)], memory_access.clone()].concat(),
            InstKind::AccessChain { base, indices } => [vec![id(base)], ids(indices)].concat(),
            InstKind::CompositeExtract { composite, indices } => {
                [vec![id(composite)], indices.clone()].concat()
            }
            InstKind::IAdd(a, b) | InstKind::IMul(a, b) => vec![id(a), id(b)],
            InstKind::FunctionCall {
                function,
                arguments,
            } => [vec![id(function)], ids(arguments)].concat(),
            InstKind::ReturnValue(value) => vec![id(value)],
            InstKind::Other { operands, .. } => operands.clone(),
        }
    }
}

fn write_record(out: &mut WordWriter, opcode: u16, operands: &[Word]) -> Result<(), IrError> {
    let words = operands.len() + 1;
    if words > MAX_RECORD_WORDS {
        return Err(IrError::RecordTooLong {
            opname: opname(opcode),
            words,
        });
    }
    out.write_word(((words as u32) << 16) | u32::from(opcode));
    out.write_words(operands);
    Ok(())
}
