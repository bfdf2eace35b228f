//! Storage-class normalization.
//!
//! The front end emits every module-scope pointer and variable in the
//! `Function` storage class. Kernel globals live in buffers, so this pass
//! moves them to `Uniform`.

use rsov_ir::spirv::StorageClass;
use rsov_ir::{InstKind, Module};

use crate::Pass;

/// Rewrites `Function` storage to `Uniform` on global pointer types,
/// forward pointers, and variables.
#[derive(Debug)]
pub struct GlobalStorageClass;

impl Pass for GlobalStorageClass {
    fn name(&self) -> &str {
        "global-storage-class"
    }

    fn run(&self, module: &mut Module) -> bool {
        let mut changed = false;
        for handle in module.globals.clone() {
            let storage = match &mut module[handle].kind {
                InstKind::TypePointer { storage, .. }
                | InstKind::TypeForwardPointer { storage, .. }
                | InstKind::Variable { storage, .. } => storage,
                _ => continue,
            };
            if *storage == StorageClass::Function {
                *storage = StorageClass::Uniform;
                changed = true;
            }
        }
        if changed {
            // Pointer type keys include the storage class.
            module.rebuild_indices();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_storage_becomes_uniform() {
        let mut module = Module::new();
        let uint = module.unsigned_int_type(32);
        let ptr = module.pointer_type(StorageClass::Function, uint);
        let var = module.add_global_variable(ptr, StorageClass::Function);

        assert!(GlobalStorageClass.run(&mut module));
        assert!(matches!(
            module[ptr].kind,
            InstKind::TypePointer {
                storage: StorageClass::Uniform,
                ..
            }
        ));
        assert!(matches!(
            module[var].kind,
            InstKind::Variable {
                storage: StorageClass::Uniform,
                ..
            }
        ));
        // The interning table sees the rewritten pointer.
        assert_eq!(module.pointer_type(StorageClass::Uniform, uint), ptr);
    }

    #[test]
    fn other_storage_classes_untouched() {
        let mut module = Module::new();
        let gid = module.invocation_id();
        let uint = module.unsigned_int_type(32);
        module.pointer_type(StorageClass::Private, uint);

        assert!(!GlobalStorageClass.run(&mut module));
        assert!(matches!(
            module[gid].kind,
            InstKind::Variable {
                storage: StorageClass::Input,
                ..
            }
        ));
    }

    #[test]
    fn forward_pointer_is_rewritten() {
        let mut module = Module::new();
        let uint = module.unsigned_int_type(32);
        let ptr = module.pointer_type(StorageClass::Function, uint);
        let fwd = module.append(rsov_ir::Instruction::new(InstKind::TypeForwardPointer {
            pointer: ptr,
            storage: StorageClass::Function,
        }));
        module.globals.insert(0, fwd);

        assert!(GlobalStorageClass.run(&mut module));
        assert!(matches!(
            module[fwd].kind,
            InstKind::TypeForwardPointer {
                storage: StorageClass::Uniform,
                ..
            }
        ));
    }
}
