//! Descriptor-bound buffers.
//!
//! Binding convention: 0 is the allocation metadata (or the global block),
//! 1 the kernel output, 2 and up the kernel inputs by position, and
//! allocation-backed globals from 3 on.

use rsov_ir::spirv::{Decoration, StorageClass};
use rsov_ir::{IrError, Module, Ref};

/// Binding of the allocation metadata buffer.
pub const METADATA_BINDING: u32 = 0;
/// Binding of the kernel output buffer.
pub const OUTPUT_BINDING: u32 = 1;
/// Binding of the first kernel input; input `i` is at `FIRST_INPUT_BINDING + i`.
pub const FIRST_INPUT_BINDING: u32 = 2;
/// First binding handed to allocation-backed globals.
pub const FIRST_ALLOCATION_BINDING: u32 = 3;

/// Byte offsets of the metadata record members.
///
/// Shifted by 4 from the natural `0, 4, 8, 12`: an access chain with
/// constant indices into this record yields a pointer 4 bytes short at
/// runtime. Re-validate against the accessor lowering before changing.
pub const METADATA_MEMBER_OFFSETS: [u32; 4] = [4, 8, 12, 16];

/// Declares a `Uniform` buffer of `element`s at descriptor set 0, `binding`.
///
/// The buffer is a runtime array wrapped in a one-member `BufferBlock` struct.
pub fn add_buffer(module: &mut Module, element: Ref, binding: u32) -> Result<Ref, IrError> {
    let stride = module.size_of(element)?;
    let array = module.runtime_array_type(element);
    module.decorate(array, Decoration::ArrayStride, &[stride]);

    let block = module.struct_type(&[array]);
    module.decorate(block, Decoration::BufferBlock, &[]);
    module.member_decorate(block, 0, Decoration::Offset, &[0]);

    let pointer = module.pointer_type(StorageClass::Uniform, block);
    let variable = module.add_global_variable(pointer, StorageClass::Uniform);
    module.decorate(variable, Decoration::DescriptorSet, &[0]);
    module.decorate(variable, Decoration::Binding, &[binding]);
    Ok(variable)
}

/// Declares the allocation metadata buffer at binding 0 and returns its variable.
///
/// Each record is `{ element_size, x_size, y_size, reserved }`, all `u32`.
pub fn add_ga_metadata(module: &mut Module) -> Ref {
    let uint = module.unsigned_int_type(32);
    // Not interned: a four-uint struct may already carry other offsets.
    let record = module.fresh_struct_type(&[uint; 4]);
    for (member, offset) in (0u32..).zip(METADATA_MEMBER_OFFSETS) {
        module.member_decorate(record, member, Decoration::Offset, &[offset]);
    }

    let array = module.runtime_array_type(record);
    let stride = METADATA_MEMBER_OFFSETS.len() as u32 * 4;
    module.decorate(array, Decoration::ArrayStride, &[stride]);

    let block = module.struct_type(&[array]);
    module.decorate(block, Decoration::BufferBlock, &[]);

    let pointer = module.pointer_type(StorageClass::Uniform, block);
    let variable = module.add_global_variable(pointer, StorageClass::Uniform);
    module.decorate(variable, Decoration::DescriptorSet, &[0]);
    module.decorate(variable, Decoration::Binding, &[METADATA_BINDING]);
    variable
}
