//! Compute entry point synthesis for foreach kernels.
//!
//! A foreach kernel handles one cell of the launch grid and takes its
//! inputs as values. The wrapper built here is the actual `GLCompute`
//! entry point: it derives the cell's linear index from the invocation id,
//! loads each input from its bound buffer, calls the kernel, and stores
//! the result into the output buffer.

use rsov_ir::spirv::{ExecutionModel, StorageClass};
use rsov_ir::{Builder, EntryPointDefinition, Module, Ref};

use crate::buffer::{FIRST_INPUT_BINDING, OUTPUT_BINDING, add_buffer};
use crate::error::WrapperError;
use crate::host::ExportedKernel;
use crate::signature::ForEachSignature;

/// The metadata slot reserved for the root kernel, which may be absent.
pub const ROOT_KERNEL: &str = "root";

/// Prefix of synthesized entry point names.
pub const ENTRY_PREFIX: &str = "entry_";

/// The flattened buffer index of a grid cell, x fastest, then y, then z.
///
/// `global` is the grid extent; its z component does not affect the index.
pub fn linear_index(coord: [u32; 3], global: [u32; 3]) -> u32 {
    let [x, y, z] = coord;
    let [gx, gy, _] = global;
    let rows = y.wrapping_add(gy.wrapping_mul(z));
    x.wrapping_add(gx.wrapping_mul(rows))
}

/// Values the wrapper derives from the invocation id.
struct Cell {
    x: Ref,
    y: Ref,
    z: Ref,
    index: Ref,
    invocation_id: Ref,
    num_workgroups: Ref,
}

/// Emits the linear index computation into the current block.
///
/// The workgroup extent is fixed at 1x1x1, so the global extent is the
/// workgroup count.
fn emit_cell(b: &mut Builder<'_>, uint: Ref) -> Result<Cell, WrapperError> {
    let uvec3 = b.module().vector_type(uint, 3);

    let invocation_id = b.module().invocation_id();
    let iid = b.load(uvec3, invocation_id)?;
    let x = b.composite_extract(uint, iid, &[0])?;
    let y = b.composite_extract(uint, iid, &[1])?;
    let z = b.composite_extract(uint, iid, &[2])?;

    let one = b.module().constant(uint, 1);
    let group_size = b.module().constant_composite(uvec3, &[one, one, one]);
    let group_size_x = b.composite_extract(uint, group_size, &[0])?;
    let group_size_y = b.composite_extract(uint, group_size, &[1])?;

    let num_workgroups = b.module().num_workgroups();
    let groups = b.load(uvec3, num_workgroups)?;
    let groups_x = b.composite_extract(uint, groups, &[0])?;
    let groups_y = b.composite_extract(uint, groups, &[1])?;

    let global_x = b.i_mul(uint, group_size_x, groups_x)?;
    let global_y = b.i_mul(uint, group_size_y, groups_y)?;
    let rows_along_z = b.i_mul(uint, global_y, z)?;
    let rows = b.i_add(uint, y, rows_along_z)?;
    let cells_before_row = b.i_mul(uint, global_x, rows)?;
    let index = b.i_add(uint, cells_before_row, x)?;

    Ok(Cell {
        x,
        y,
        z,
        index,
        invocation_id,
        num_workgroups,
    })
}

/// Checks a kernel against what the wrapper can lower.
fn check_signature(kernel: &ExportedKernel) -> Result<(), WrapperError> {
    let sig = kernel.signature;
    let name = || kernel.name.clone();
    if !sig.contains(ForEachSignature::KERNEL) {
        return Err(WrapperError::NotForEach {
            name: name(),
            signature: sig,
        });
    }
    if sig.contains(ForEachSignature::USR_DATA) {
        return Err(WrapperError::UserData(name()));
    }
    if sig.contains(ForEachSignature::CTXT) {
        return Err(WrapperError::Context(name()));
    }
    if kernel.input_count > 0 && !sig.needs_index() {
        return Err(WrapperError::InputsWithoutIndex {
            name: name(),
            inputs: kernel.input_count,
        });
    }
    Ok(())
}

/// Synthesizes the `entry_<name>` compute entry point for one exported kernel.
///
/// Input `i` is read from binding `2 + i`, the result is written to binding
/// 1. A missing `root` kernel is skipped; any other rejection leaves the
/// module's entry points unchanged.
pub fn add_wrapper(module: &mut Module, kernel: &ExportedKernel) -> Result<(), WrapperError> {
    let Some(definition) = module.lookup_function_definition_by_name(&kernel.name) else {
        if kernel.name == ROOT_KERNEL {
            log::debug!("no root kernel, skipping");
            return Ok(());
        }
        return Err(WrapperError::MissingKernel(kernel.name.clone()));
    };
    let function = definition.function;
    let parameters = definition.parameters.clone();

    if let Err(err) = check_signature(kernel) {
        log::warn!("rejecting kernel: {err}");
        return Err(err);
    }
    if parameters.len() < kernel.input_count as usize {
        return Err(WrapperError::TooFewParameters {
            name: kernel.name.clone(),
            inputs: kernel.input_count,
            parameters: parameters.len(),
        });
    }
    let input_types: Vec<Ref> = parameters
        .iter()
        .take(kernel.input_count as usize)
        .map(|&p| module[p].result_type)
        .collect::<Option<_>>()
        .ok_or_else(|| WrapperError::MalformedKernel(kernel.name.clone()))?;
    let return_type = module[function]
        .result_type
        .ok_or_else(|| WrapperError::MalformedKernel(kernel.name.clone()))?;

    let sig = kernel.signature;
    let uint = module.unsigned_int_type(32);
    let void = module.void_type();
    let fn_ty = module.function_type(void, &[]);

    let mut b = Builder::new(module);
    let wrapper = b.begin_function(void, 0, fn_ty);
    b.begin_block()?;

    let cell = if sig.needs_index() {
        Some(emit_cell(&mut b, uint)?)
    } else {
        None
    };

    let zero = b.module().constant(uint, 0);
    let mut arguments = Vec::new();
    if let Some(cell) = &cell {
        for (binding, &element) in (FIRST_INPUT_BINDING..).zip(&input_types) {
            let buffer = add_buffer(b.module(), element, binding)?;
            let pointer_type = b.module().pointer_type(StorageClass::Uniform, element);
            let pointer = b.access_chain(pointer_type, buffer, &[zero, cell.index])?;
            arguments.push(b.load(element, pointer)?);
        }

        if sig.contains(ForEachSignature::X) {
            arguments.push(cell.x);
            if sig.contains(ForEachSignature::Y) {
                arguments.push(cell.y);
                if sig.contains(ForEachSignature::Z) {
                    arguments.push(cell.z);
                }
            }
        }
    }

    let result = b.function_call(return_type, function, &arguments)?;

    if let (Some(cell), true) = (&cell, sig.contains(ForEachSignature::OUT)) {
        let buffer = add_buffer(b.module(), return_type, OUTPUT_BINDING)?;
        let pointer_type = b.module().pointer_type(StorageClass::Uniform, return_type);
        let pointer = b.access_chain(pointer_type, buffer, &[zero, cell.index])?;
        b.store(pointer, result)?;
    }
    b.ret()?;

    let name = format!("{ENTRY_PREFIX}{}", kernel.name);
    let mut entry = EntryPointDefinition::new(ExecutionModel::GLCompute, wrapper, name.as_str());
    entry.set_local_size(1, 1, 1);
    if let Some(cell) = &cell {
        entry.add_to_interface(cell.invocation_id);
        entry.add_to_interface(cell.num_workgroups);
    }
    module.add_entry_point(entry);
    log::info!("synthesized entry point '{name}' ({sig})");
    Ok(())
}
