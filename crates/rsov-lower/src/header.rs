//! Module header for a Vulkan compute program.

use rsov_ir::Module;
use rsov_ir::spirv::{AddressingModel, Capability, MemoryModel, SourceLanguage};

/// Extended instruction set imported by every lowered module.
pub const GLSL_STD_450: &str = "GLSL.std.450";

const SOURCE_EXTENSIONS: [&str; 4] = [
    "GL_ARB_separate_shader_objects",
    "GL_ARB_shading_language_420pack",
    "GL_GOOGLE_cpp_style_line_directive",
    "GL_GOOGLE_include_directive",
];

/// Declares the capability, memory model, imports, and source the
/// compute program needs. Safe to call on a module that already has them.
pub fn add_header(module: &mut Module) {
    module.add_capability(Capability::Shader);
    module.set_memory_model(AddressingModel::Physical32, MemoryModel::GLSL450);
    module.add_ext_inst_import(GLSL_STD_450);
    module.set_source(SourceLanguage::GLSL, 450);
    for ext in SOURCE_EXTENSIONS {
        module.add_source_extension(ext);
    }
}
