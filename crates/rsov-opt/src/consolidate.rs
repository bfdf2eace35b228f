//! Annotation consolidation.

use rsov_ir::Module;

use crate::Pass;

/// Drops exact-duplicate decoration instructions, keeping the first of each.
///
/// Wrapper synthesis and global decoration may decorate the same target
/// more than once.
#[derive(Debug)]
pub struct AnnotationConsolidation;

impl Pass for AnnotationConsolidation {
    fn name(&self) -> &str {
        "annotation-consolidation"
    }

    fn run(&self, module: &mut Module) -> bool {
        module.consolidate_annotations()
    }
}

#[cfg(test)]
mod tests {
    use rsov_ir::spirv::Decoration;

    use super::*;

    #[test]
    fn duplicate_bindings_merge() {
        let mut module = Module::new();
        let gid = module.invocation_id();
        module.decorate(gid, Decoration::DescriptorSet, &[0]);
        module.decorate(gid, Decoration::DescriptorSet, &[0]);
        module.decorate(gid, Decoration::Binding, &[2]);

        assert!(AnnotationConsolidation.run(&mut module));
        // BuiltIn, DescriptorSet, Binding.
        assert_eq!(module.annotations.len(), 3);
        assert_eq!(module.decorations(gid, Decoration::DescriptorSet).len(), 1);
        assert!(!AnnotationConsolidation.run(&mut module));
    }
}
