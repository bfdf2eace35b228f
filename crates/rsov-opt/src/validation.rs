//! IR validation pass.
//!
//! Checks the binding and layout invariants of a lowered module and logs
//! warnings for problems found. This pass never modifies the module.

use rsov_ir::spirv::{Decoration, StorageClass};
use rsov_ir::{InstKind, Module, Ref};

use crate::Pass;

/// Validates binding and layout invariants. Returns `false` (never modifies the module).
#[derive(Debug)]
pub struct IrValidation;

impl Pass for IrValidation {
    fn name(&self) -> &str {
        "ir-validation"
    }

    fn run(&self, module: &mut Module) -> bool {
        for problem in validate_module(module) {
            log::warn!("{problem}");
        }
        false
    }
}

/// Collects a description of every violated invariant.
pub fn validate_module(module: &Module) -> Vec<String> {
    let mut problems = Vec::new();

    for ep in &module.entry_points {
        if let Some(size) = ep.local_size {
            for (i, &extent) in size.iter().enumerate() {
                if extent == 0 {
                    problems.push(format!("entry point '{}' has local_size[{i}] = 0", ep.name));
                }
            }
        }
    }

    for &handle in &module.globals {
        if !module.has_decoration(handle, Decoration::Binding) {
            continue;
        }
        let InstKind::Variable { storage, .. } = module[handle].kind else {
            problems.push(format!("binding on non-variable %{}", module.id_of(handle)));
            continue;
        };
        if storage != StorageClass::Uniform {
            problems.push(format!(
                "bound variable %{} is in {storage:?} storage, expected Uniform",
                module.id_of(handle)
            ));
        }
        let pointee = module[handle]
            .result_type
            .and_then(|ty| module.pointee(ty));
        match pointee {
            Some(block) if matches!(module[block].kind, InstKind::TypeStruct { .. }) => {
                if !module.has_decoration(block, Decoration::BufferBlock)
                    && !module.has_decoration(block, Decoration::Block)
                {
                    problems.push(format!(
                        "bound variable %{} points to struct %{} without a block decoration",
                        module.id_of(handle),
                        module.id_of(block)
                    ));
                }
                check_offsets(module, block, &mut problems);
            }
            _ => problems.push(format!(
                "bound variable %{} does not point to a struct",
                module.id_of(handle)
            )),
        }
    }

    problems
}

/// Member offsets of a block struct must strictly increase.
fn check_offsets(module: &Module, block: Ref, problems: &mut Vec<String>) {
    let InstKind::TypeStruct { members } = &module[block].kind else {
        return;
    };
    let mut previous: Option<u32> = None;
    for member in 0..members.len() as u32 {
        let Some(&offset) = module
            .member_decorations(block, member, Decoration::Offset)
            .first()
            .and_then(|ops| ops.first())
        else {
            continue;
        };
        if previous.is_some_and(|p| offset <= p) {
            problems.push(format!(
                "struct %{} member {member} offset {offset} does not increase",
                module.id_of(block)
            ));
        }
        previous = Some(offset);
    }
}
