//! Textual disassembly for debugging.

use std::fmt;

use crate::inst::{InstKind, Ref};
use crate::module::{Header, Module};

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = (self.version >> 16) & 0xff;
        let minor = (self.version >> 8) & 0xff;
        write!(
            f,
            "; SPIR-V {major}.{minor}, generator {:#x}, bound {}",
            self.generator, self.bound
        )
    }
}

/// Formats one instruction as `%id = OpName %type operands...`.
pub fn format_inst(module: &Module, handle: Ref) -> String {
    let inst = &module[handle];
    let id = |h: &Ref| format!("%{}", module.id_of(*h));
    let ids = |hs: &[Ref]| hs.iter().map(id).collect::<Vec<_>>().join(" ");
    let words = |ws: &[u32]| {
        ws.iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let operands = match &inst.kind {
        InstKind::Placeholder => "<unresolved>".to_string(),
        InstKind::Capability(c) => format!("{c:?}"),
        InstKind::Extension(s) | InstKind::ExtInstImport(s) | InstKind::SourceExtension(s) => {
            format!("{s:?}")
        }
        InstKind::MemoryModel { addressing, memory } => format!("{addressing:?} {memory:?}"),
        InstKind::ExecutionMode {
            entry,
            mode,
            operands,
        } => format!("{} {mode:?} {}", id(entry), words(operands)),
        InstKind::Name { target, name } => format!("{} {name:?}", id(target)),
        InstKind::MemberName {
            target,
            member,
            name,
        } => format!("{} {member} {name:?}", id(target)),
        InstKind::Decorate {
            target,
            decoration,
            operands,
        } => format!("{} {decoration:?} {}", id(target), words(operands)),
        InstKind::MemberDecorate {
            target,
            member,
            decoration,
            operands,
        } => format!("{} {member} {decoration:?} {}", id(target), words(operands)),
        InstKind::TypeVoid
        | InstKind::TypeBool
        | InstKind::FunctionParameter
        | InstKind::Label
        | InstKind::Return => String::new(),
        InstKind::TypeInt { width, signed } => format!("{width} {}", u32::from(*signed)),
        InstKind::TypeFloat { width } => width.to_string(),
        InstKind::TypeVector { component, count } => format!("{} {count}", id(component)),
        InstKind::TypeArray { element, length } => format!("{} {}", id(element), id(length)),
        InstKind::TypeRuntimeArray { element } => id(element),
        InstKind::TypeStruct { members } => ids(members),
        InstKind::TypePointer { storage, pointee } => format!("{storage:?} {}", id(pointee)),
        InstKind::TypeForwardPointer { pointer, storage } => {
            format!("{} {storage:?}", id(pointer))
        }
        InstKind::TypeFunction {
            return_type,
            parameters,
        } => format!("{} {}", id(return_type), ids(parameters)),
        InstKind::Constant(value) => words(value),
        InstKind::ConstantComposite(parts) => ids(parts),
        InstKind::Variable {
            storage,
            initializer,
        } => match initializer {
            Some(init) => format!("{storage:?} {}", id(init)),
            None => format!("{storage:?}"),
        },
        InstKind::Function {
            control,
            function_type,
        } => format!("{control} {}", id(function_type)),
        InstKind::Load { pointer, .. } => id(pointer),
        InstKind::Store { pointer, object, .. } => format!("{} {}", id(pointer), id(object)),
        InstKind::AccessChain { base, indices } => format!("{} {}", id(base), ids(indices)),
        InstKind::CompositeExtract { composite, indices } => {
            format!("{} {}", id(composite), words(indices))
        }
        InstKind::IAdd(a, b) | InstKind::IMul(a, b) => format!("{} {}", id(a), id(b)),
        InstKind::FunctionCall {
            function,
            arguments,
        } => format!("{} {}", id(function), ids(arguments)),
        InstKind::ReturnValue(value) => id(value),
        InstKind::Other { operands, .. } => words(operands),
    };

    let mut line = String::new();
    if let Some(result) = inst.result_id {
        line.push_str(&format!("%{result} = "));
    }
    line.push_str(&inst.opname());
    if let Some(ty) = inst.result_type {
        line.push(' ');
        line.push_str(&id(&ty));
    }
    if !operands.is_empty() {
        line.push(' ');
        line.push_str(operands.trim_end());
    }
    line
}

/// Dumps a whole module in layout order.
pub fn dump_module(module: &Module) -> String {
    let mut out = format!("{}\n", module.header);
    let section = |out: &mut String, handles: &[Ref]| {
        for &h in handles {
            out.push_str(&format_inst(module, h));
            out.push('\n');
        }
    };

    section(&mut out, &module.capabilities);
    section(&mut out, &module.extensions);
    section(&mut out, &module.ext_inst_imports);
    section(&mut out, module.memory_model.as_slice());

    for ep in &module.entry_points {
        let interface = ep
            .interface
            .iter()
            .map(|&v| format!(" %{}", module.id_of(v)))
            .collect::<String>();
        out.push_str(&format!(
            "OpEntryPoint {:?} %{} {:?}{interface}\n",
            ep.model,
            module.id_of(ep.function),
            ep.name
        ));
        if let Some([x, y, z]) = ep.local_size {
            out.push_str(&format!(
                "OpExecutionMode %{} LocalSize {x} {y} {z}\n",
                module.id_of(ep.function)
            ));
        }
    }
    section(&mut out, &module.execution_modes);
    section(&mut out, &module.debug);
    section(&mut out, &module.annotations);
    section(&mut out, &module.globals);

    for function in &module.functions {
        out.push('\n');
        section(&mut out, &[function.function]);
        section(&mut out, &function.parameters);
        for block in &function.blocks {
            section(&mut out, &[block.label]);
            for &h in &block.body {
                out.push_str("    ");
                out.push_str(&format_inst(module, h));
                out.push('\n');
            }
        }
        out.push_str("OpFunctionEnd\n");
    }
    out
}
