//! Module passes.
//!
//! Provides a [`Pass`] trait, a [`PassManager`] with fixed-point iteration,
//! and the passes the lowering pipeline runs between its stages
//! (storage-class normalization, annotation consolidation, validation).

mod consolidate;
mod storage_class;
mod validation;

pub use consolidate::AnnotationConsolidation;
pub use storage_class::GlobalStorageClass;
pub use validation::{IrValidation, validate_module};

use std::fmt::Debug;

use rsov_ir::Module;

/// A pass that transforms a module.
pub trait Pass: Debug {
    /// Human-readable name of the pass.
    fn name(&self) -> &str;

    /// Run the pass on a module. Returns `true` if anything was modified.
    fn run(&self, module: &mut Module) -> bool;
}

/// Maximum number of fixed-point iterations before giving up.
const MAX_ITERATIONS: usize = 10;

/// Runs passes in sequence with fixed-point iteration.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PassManager {
    /// Creates an empty pass manager with no passes.
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Storage-class normalization followed by annotation consolidation.
    pub fn normalize() -> Self {
        let mut pm = Self::new();
        pm.add_pass(Box::new(GlobalStorageClass));
        pm.add_pass(Box::new(AnnotationConsolidation));
        pm
    }

    /// Adds a pass to the pipeline.
    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Names of the registered passes, in run order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Runs all passes until a fixed point is reached or the iteration limit.
    ///
    /// Returns `true` if any pass changed the module.
    pub fn run(&self, module: &mut Module) -> bool {
        let mut any = false;
        for iteration in 0..MAX_ITERATIONS {
            let mut changed = false;
            for pass in &self.passes {
                if pass.run(module) {
                    log::debug!("pass '{}' changed the module (iteration {iteration})", pass.name());
                    changed = true;
                }
            }
            any |= changed;
            if !changed {
                break;
            }
        }
        any
    }
}

/// Convenience function: rewrites global storage classes and merges duplicate annotations.
pub fn normalize(module: &mut Module) -> bool {
    PassManager::normalize().run(module)
}
