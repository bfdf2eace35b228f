//! Global block and allocation decoration.

use rsov_ir::spirv::Decoration;
use rsov_ir::{InstKind, Module};

use crate::buffer::{FIRST_ALLOCATION_BINDING, METADATA_BINDING};
use crate::error::WrapperError;
use crate::host::{GlobalLayout, HostModule};

/// Name of the variable holding the kernel script's globals.
pub const GLOBAL_BLOCK: &str = "__GPUBlock";

/// Binds the global block and copies the native member offsets onto it,
/// then binds every allocation-backed global.
///
/// A module without a global block is left untouched. Member offsets are
/// taken verbatim from the host so both sides agree byte for byte.
pub fn decorate_global_buffer(
    module: &mut Module,
    host: &dyn HostModule,
) -> Result<(), WrapperError> {
    let Some(variable) = module.lookup_by_name(GLOBAL_BLOCK) else {
        log::debug!("no {GLOBAL_BLOCK} in module");
        return Ok(());
    };

    let block = module[variable]
        .result_type
        .and_then(|ty| module.pointee(ty))
        .filter(|&st| matches!(module[st].kind, InstKind::TypeStruct { .. }))
        .ok_or_else(|| WrapperError::GlobalBlockShape(module.id_of(variable)))?;

    module.decorate(variable, Decoration::DescriptorSet, &[0]);
    module.decorate(variable, Decoration::Binding, &[METADATA_BINDING]);
    module.decorate(block, Decoration::BufferBlock, &[]);

    let offsets = match host.global_block_layout() {
        None => {
            log::debug!("host has no native {GLOBAL_BLOCK}");
            return Ok(());
        }
        Some(GlobalLayout::NotAStruct) => return Err(WrapperError::NativeBlockShape),
        Some(GlobalLayout::Struct { member_offsets }) => member_offsets,
    };

    let shader_members = match &module[block].kind {
        InstKind::TypeStruct { members } => members.len(),
        _ => 0,
    };
    if offsets.len() > shader_members {
        return Err(WrapperError::MemberCount {
            native: offsets.len(),
            shader: shader_members,
        });
    }
    for (member, offset) in (0u32..).zip(offsets) {
        module.member_decorate(block, member, Decoration::Offset, &[offset]);
    }

    let Some(allocations) = host.allocations() else {
        log::debug!("host reports no allocation info");
        return Ok(());
    };
    for (binding, name) in (FIRST_ALLOCATION_BINDING..).zip(allocations) {
        let variable = module
            .lookup_by_name(&name)
            .ok_or(WrapperError::MissingAllocation(name))?;
        module.decorate(variable, Decoration::DescriptorSet, &[0]);
        module.decorate(variable, Decoration::Binding, &[binding]);
    }
    Ok(())
}
