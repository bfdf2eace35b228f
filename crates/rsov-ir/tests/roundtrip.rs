//! Integration test: build a small compute module programmatically, encode
//! it, check the binary with an independent parser, and decode it back.

use rsov_ir::spirv::{
    AddressingModel, Capability, Decoration, ExecutionMode, ExecutionModel, MemoryModel, Op,
    StorageClass,
};
use rsov_ir::stream::{MAGIC, string_words};
use rsov_ir::*;

/// A module with one `GLCompute` entry point that loads the invocation id
/// and stores its x component into a uniform buffer at index x.
fn build_module() -> Module {
    let mut module = Module::new();
    module.add_capability(Capability::Shader);
    module.add_ext_inst_import("GLSL.std.450");
    module.set_memory_model(AddressingModel::Logical, MemoryModel::GLSL450);

    // ---- Types ----
    let void = module.void_type();
    let uint = module.unsigned_int_type(32);
    let uvec3 = module.vector_type(uint, 3);
    let rta = module.runtime_array_type(uint);
    module.decorate(rta, Decoration::ArrayStride, &[4]);
    let block = module.struct_type(&[rta]);
    module.decorate(block, Decoration::BufferBlock, &[]);
    module.member_decorate(block, 0, Decoration::Offset, &[0]);
    let block_ptr = module.pointer_type(StorageClass::Uniform, block);
    let elem_ptr = module.pointer_type(StorageClass::Uniform, uint);
    let zero = module.constant(uint, 0);
    let fn_ty = module.function_type(void, &[]);

    // ---- Globals ----
    let buffer = module.add_global_variable(block_ptr, StorageClass::Uniform);
    module.decorate(buffer, Decoration::DescriptorSet, &[0]);
    module.decorate(buffer, Decoration::Binding, &[1]);
    module.set_name(buffer, "out");
    let gid = module.invocation_id();

    // ---- Body ----
    let mut b = Builder::new(&mut module);
    let main = b.begin_function(void, 0, fn_ty);
    b.begin_block().unwrap();
    let id = b.load(uvec3, gid).unwrap();
    let x = b.composite_extract(uint, id, &[0]).unwrap();
    let slot = b.access_chain(elem_ptr, buffer, &[zero, x]).unwrap();
    b.store(slot, x).unwrap();
    b.ret().unwrap();

    module.set_name(main, "main");
    let mut ep = EntryPointDefinition::new(ExecutionModel::GLCompute, main, "main");
    ep.set_local_size(1, 1, 1);
    ep.add_to_interface(gid);
    module.add_entry_point(ep);
    module
}

#[test]
fn encoded_module_parses_with_rspirv() {
    let module = build_module();
    let words = module.encode().unwrap();

    let loaded = rspirv::dr::load_words(&words).expect("rspirv rejects encoded module");
    assert_eq!(loaded.entry_points.len(), 1);
    assert_eq!(loaded.execution_modes.len(), 1);
    assert_eq!(loaded.functions.len(), 1);
    assert_eq!(loaded.capabilities.len(), 1);
    // ArrayStride, BufferBlock, Offset, DescriptorSet, Binding, BuiltIn.
    assert_eq!(loaded.annotations.len(), 6);

    let header = loaded.header.expect("header");
    assert_eq!(header.bound, module.header.bound);
}

#[test]
fn decode_then_encode_is_stable() {
    let words = build_module().encode().unwrap();

    let mut decoded = Module::decode(&words).unwrap();
    decoded.resolve_ids().unwrap();
    assert_eq!(decoded.encode().unwrap(), words);

    assert_eq!(decoded.entry_points.len(), 1);
    assert_eq!(decoded.entry_points[0].name, "main");
    assert_eq!(decoded.entry_points[0].local_size, Some([1, 1, 1]));
    let main = decoded.lookup_function_definition_by_name("main").unwrap();
    assert_eq!(main.blocks[0].body.len(), 5);
}

#[test]
fn decoded_module_reuses_existing_types() {
    let words = build_module().encode().unwrap();
    let mut decoded = Module::decode(&words).unwrap();
    decoded.resolve_ids().unwrap();

    let globals_before = decoded.globals.len();
    let uint = decoded.unsigned_int_type(32);
    let _ = decoded.vector_type(uint, 3);
    let _ = decoded.constant(uint, 0);
    assert_eq!(decoded.globals.len(), globals_before);

    let gid = decoded.invocation_id();
    assert!(decoded.has_decoration(gid, Decoration::BuiltIn));
    assert_eq!(decoded.globals.len(), globals_before);
}

#[test]
fn dump_mentions_every_section() {
    let text = dump_module(&build_module());
    for needle in [
        "OpCapability Shader",
        "OpExtInstImport \"GLSL.std.450\"",
        "OpMemoryModel Logical GLSL450",
        "OpEntryPoint GLCompute",
        "LocalSize 1 1 1",
        "OpName",
        "OpDecorate",
        "OpTypeRuntimeArray",
        "OpAccessChain",
        "OpFunctionEnd",
    ] {
        assert!(text.contains(needle), "missing {needle:?} in\n{text}");
    }
}

#[test]
fn truncated_binary_is_rejected() {
    let words = build_module().encode().unwrap();
    // The header plus the first word of `OpCapability Shader`.
    let cut = &words[..6];
    assert!(matches!(
        Module::decode(cut),
        Err(IrError::Truncated { .. })
    ));
}

#[test]
fn bytes_roundtrip_through_words() {
    let words = build_module().encode().unwrap();
    let bytes = words_to_bytes(&words);
    assert_eq!(words_from_bytes(&bytes).unwrap(), words);
    assert_eq!(words[0] >> 16, 0x0723);
    assert_eq!(opname(Op::Variable as u16), "OpVariable");
}

fn record(op: Op, operands: &[Word]) -> Vec<Word> {
    let mut words = vec![((operands.len() as u32 + 1) << 16) | op as u32];
    words.extend_from_slice(operands);
    words
}

/// Instructions the builder never produces: a forward pointer to a
/// self-referencing struct, an extended instruction and a non-LocalSize
/// execution mode.
fn hand_assembled() -> Vec<Word> {
    let mut words = vec![MAGIC, 0x0001_0000, 0, 12, 0];
    words.extend(record(Op::Capability, &[Capability::Shader as u32]));
    words.extend(record(Op::Capability, &[Capability::Addresses as u32]));
    let mut import = vec![1];
    import.extend(string_words("GLSL.std.450"));
    words.extend(record(Op::ExtInstImport, &import));
    words.extend(record(
        Op::MemoryModel,
        &[AddressingModel::Physical32 as u32, MemoryModel::GLSL450 as u32],
    ));
    let mut entry = vec![ExecutionModel::GLCompute as u32, 9];
    entry.extend(string_words("main"));
    words.extend(record(Op::EntryPoint, &entry));
    words.extend(record(
        Op::ExecutionMode,
        &[9, ExecutionMode::LocalSizeHint as u32, 4, 4, 1],
    ));

    words.extend(record(Op::TypeVoid, &[2]));
    words.extend(record(Op::TypeFunction, &[3, 2]));
    words.extend(record(Op::TypeFloat, &[4, 32]));
    words.extend(record(
        Op::TypeForwardPointer,
        &[6, StorageClass::CrossWorkgroup as u32],
    ));
    words.extend(record(Op::TypeStruct, &[7, 4, 6]));
    words.extend(record(
        Op::TypePointer,
        &[6, StorageClass::CrossWorkgroup as u32, 7],
    ));
    words.extend(record(Op::Constant, &[4, 8, 0x3f80_0000]));

    words.extend(record(Op::Function, &[2, 9, 0, 3]));
    words.extend(record(Op::Label, &[10]));
    // %11 = OpExtInst %float %1 Sqrt %8
    words.extend(record(Op::ExtInst, &[4, 11, 1, 31, 8]));
    words.extend(record(Op::Return, &[]));
    words.extend(record(Op::FunctionEnd, &[]));
    words
}

#[test]
fn hand_assembled_binary_roundtrips() {
    let words = hand_assembled();
    rspirv::dr::load_words(&words).expect("input is not a well-formed binary");

    let mut module = Module::decode(&words).unwrap();
    module.resolve_ids().unwrap();
    let encoded = module.encode().unwrap();
    assert_eq!(encoded, words);

    let mut again = Module::decode(&encoded).unwrap();
    again.resolve_ids().unwrap();
    assert_eq!(again.encode().unwrap(), words);
    rspirv::dr::load_words(&encoded).expect("rspirv rejects re-encoded module");

    assert_eq!(again.entry_points.len(), 1);
    assert_eq!(again.entry_points[0].local_size, None);
    assert_eq!(again.execution_modes.len(), 1);

    let pointer = again.by_id(6).unwrap();
    let strukt = again.by_id(7).unwrap();
    assert_eq!(
        again[strukt].kind,
        InstKind::TypeStruct {
            members: vec![again.by_id(4).unwrap(), pointer],
        }
    );
    assert!(matches!(
        again[pointer].kind,
        InstKind::TypePointer {
            storage: StorageClass::CrossWorkgroup,
            ..
        }
    ));

    let body = &again.functions[0].blocks[0].body;
    assert_eq!(body.len(), 2);
    let ext = body[0];
    assert_eq!(again[ext].result_id, Some(11));
    assert_eq!(again[ext].result_type, again.by_id(4));
    assert!(matches!(
        &again[ext].kind,
        InstKind::Other { opcode, operands }
            if *opcode == Op::ExtInst as u16 && operands == &[1, 31, 8]
    ));
}
