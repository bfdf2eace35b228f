mod common;

use common::{Elem, add_kernel, lower};
use rsov_ir::Module;
use rsov_ir::spirv::Op;
use rsov_lower::{ExportedKernel, ForEachSignature, GlobalLayout, PipelineError, StaticHost};

const IN_OUT: ForEachSignature = ForEachSignature::from_bits(0x23);

#[test]
fn bad_magic_is_a_stream_error() {
    let err = lower(&[0xdead_beef, 0, 0, 1, 0], &[], &()).unwrap_err();
    assert!(matches!(err, PipelineError::Stream(_)));
    assert_eq!(err.code(), -1);
}

#[test]
fn id_beyond_bound_is_a_stream_error() {
    let words = [
        rsov_ir::stream::MAGIC,
        0x0001_0000,
        0,
        10,
        0,
        (2 << 16) | Op::TypeVoid as u32,
        0xffff_ffff,
    ];
    let err = lower(&words, &[], &()).unwrap_err();
    assert!(matches!(err, PipelineError::Stream(_)));
    assert_eq!(err.code(), -1);
}

#[test]
fn dangling_id_is_unresolved() {
    let mut words = Module::new().encode().unwrap();
    words[3] = 10;
    words.extend([(3 << 16) | Op::Name as u32, 7, 0]);
    let err = lower(&words, &[], &()).unwrap_err();
    assert_eq!(err.code(), -2);
}

#[test]
fn user_data_kernel_is_rejected() {
    let mut module = Module::new();
    add_kernel(&mut module, "k", Elem::Uint, 1, 0);
    let kernels = [ExportedKernel::new("k", IN_OUT | ForEachSignature::USR_DATA, 1)];
    let err = lower(&module.encode().unwrap(), &kernels, &()).unwrap_err();
    assert!(matches!(err, PipelineError::Structural(_)));
    assert_eq!(err.code(), -3);
}

#[test]
fn context_kernel_is_rejected() {
    let mut module = Module::new();
    add_kernel(&mut module, "k", Elem::Uint, 1, 0);
    let kernels = [ExportedKernel::new("k", IN_OUT | ForEachSignature::CTXT, 1)];
    assert_eq!(lower(&module.encode().unwrap(), &kernels, &()).unwrap_err().code(), -3);
}

#[test]
fn legacy_kernel_is_rejected() {
    let mut module = Module::new();
    add_kernel(&mut module, "k", Elem::Uint, 1, 0);
    let sig = ForEachSignature::IN | ForEachSignature::OUT;
    let kernels = [ExportedKernel::new("k", sig, 1)];
    assert_eq!(lower(&module.encode().unwrap(), &kernels, &()).unwrap_err().code(), -3);
}

#[test]
fn missing_non_root_kernel_is_fatal() {
    let module = Module::new();
    let kernels = [ExportedKernel::new("absent", IN_OUT, 1)];
    assert_eq!(lower(&module.encode().unwrap(), &kernels, &()).unwrap_err().code(), -3);
}

#[test]
fn missing_root_is_fine() {
    let module = Module::new();
    let kernels = [ExportedKernel::new("root", IN_OUT, 1)];
    let out = lower(&module.encode().unwrap(), &kernels, &()).unwrap();
    let decoded = rsov_lower::load_module(&out).unwrap();
    assert!(decoded.entry_points.is_empty());
}

#[test]
fn native_block_mismatch_is_structural() {
    let mut module = Module::new();
    common::add_global_block(&mut module, 1);
    let host = StaticHost {
        layout: Some(GlobalLayout::Struct {
            member_offsets: vec![0, 4, 8],
        }),
        allocations: None,
    };
    assert_eq!(lower(&module.encode().unwrap(), &[], &host).unwrap_err().code(), -3);
}

#[test]
fn missing_allocation_is_structural() {
    let mut module = Module::new();
    common::add_global_block(&mut module, 1);
    let host = StaticHost {
        layout: Some(GlobalLayout::Struct {
            member_offsets: vec![0],
        }),
        allocations: Some(vec!["gNowhere".into()]),
    };
    assert_eq!(lower(&module.encode().unwrap(), &[], &host).unwrap_err().code(), -3);
}
