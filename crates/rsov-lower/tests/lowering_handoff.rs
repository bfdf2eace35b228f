//! Integration test: what the external lowerings see at each hand-off.

use rsov_ir::spirv::{Decoration, StorageClass};
use rsov_ir::{InstKind, Module, Ref, Word};
use rsov_lower::{
    Lowering, LoweringError, METADATA_BINDING, PipelineOptions, add_compute_wrappers,
};

/// Records what the pipeline hands over and passes the module through.
#[derive(Default)]
struct Recorder {
    entry_points_at_builtins: Option<usize>,
    metadata: Option<(Vec<u32>, bool, bool)>,
}

impl Lowering for Recorder {
    fn translate_builtins(&mut self, module: &mut Module) -> Result<Vec<Word>, LoweringError> {
        self.entry_points_at_builtins = Some(module.entry_points.len());
        Ok(module.encode()?)
    }

    fn translate_accessors(
        &mut self,
        module: &mut Module,
        metadata: Ref,
    ) -> Result<Vec<Word>, LoweringError> {
        let binding: Vec<u32> = module
            .decorations(metadata, Decoration::Binding)
            .iter()
            .flat_map(|ops| ops.iter().copied())
            .collect();

        // The accessor lowering needs these to exist already; asking for
        // them again must not add anything.
        let before = module.globals.len();
        let uint = module.unsigned_int_type(32);
        module.constant(uint, 0);
        module.constant(uint, 1);
        module.pointer_type(StorageClass::Uniform, uint);
        let preregistered = module.globals.len() == before;

        let uniform = matches!(
            module[metadata].kind,
            InstKind::Variable {
                storage: StorageClass::Uniform,
                ..
            }
        );
        self.metadata = Some((binding, preregistered, uniform));
        Ok(module.encode()?)
    }
}

#[test]
fn metadata_is_handed_to_accessor_lowering() {
    let words = Module::new().encode().unwrap();
    let mut recorder = Recorder::default();
    add_compute_wrappers(&words, &[], &(), &mut recorder, &PipelineOptions::default()).unwrap();

    assert_eq!(recorder.entry_points_at_builtins, Some(0));
    let (binding, preregistered, uniform) = recorder.metadata.unwrap();
    assert_eq!(binding, [METADATA_BINDING]);
    assert!(preregistered);
    assert!(uniform);
}

#[test]
fn accessor_lowering_output_is_returned_verbatim() {
    struct Fixed;
    impl Lowering for Fixed {
        fn translate_builtins(&mut self, m: &mut Module) -> Result<Vec<Word>, LoweringError> {
            Ok(m.encode()?)
        }
        fn translate_accessors(&mut self, _: &mut Module, _: Ref) -> Result<Vec<Word>, LoweringError> {
            Ok(vec![1, 2, 3])
        }
    }

    let words = Module::new().encode().unwrap();
    let out =
        add_compute_wrappers(&words, &[], &(), &mut Fixed, &PipelineOptions::default()).unwrap();
    assert_eq!(out, [1, 2, 3]);
}
