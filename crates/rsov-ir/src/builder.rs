//! Instruction builder for appending code to a module.
//!
//! A [`Builder`] borrows a module mutably and tracks the function and
//! block new instructions go into. Types and constants are requested from
//! the module itself, which interns them.

use crate::error::IrError;
use crate::inst::{InstKind, Instruction, Ref, Word};
use crate::module::{Block, FunctionDefinition, Module};

pub struct Builder<'m> {
    module: &'m mut Module,
    function: Option<usize>,
    block: Option<usize>,
}

impl<'m> Builder<'m> {
    pub fn new(module: &'m mut Module) -> Self {
        Self {
            module,
            function: None,
            block: None,
        }
    }

    pub fn module(&mut self) -> &mut Module {
        self.module
    }

    /// Starts a new function definition and selects it. No block is selected.
    pub fn begin_function(&mut self, return_type: Ref, control: Word, function_type: Ref) -> Ref {
        let function = self.module.define(
            Some(return_type),
            InstKind::Function {
                control,
                function_type,
            },
        );
        let index = self
            .module
            .add_function_definition(FunctionDefinition::new(function));
        self.function = Some(index);
        self.block = None;
        function
    }

    /// Appends a parameter of type `ty` to the selected function.
    pub fn function_parameter(&mut self, ty: Ref) -> Result<Ref, IrError> {
        let index = self.function.ok_or(IrError::Detached("function"))?;
        let parameter = self.module.define(Some(ty), InstKind::FunctionParameter);
        self.module.functions[index].parameters.push(parameter);
        Ok(parameter)
    }

    /// Opens a new block in the selected function and selects it.
    pub fn begin_block(&mut self) -> Result<Ref, IrError> {
        let index = self.function.ok_or(IrError::Detached("function"))?;
        let label = self.module.define(None, InstKind::Label);
        let blocks = &mut self.module.functions[index].blocks;
        blocks.push(Block {
            label,
            body: Vec::new(),
        });
        self.block = Some(blocks.len() - 1);
        Ok(label)
    }

    fn push(&mut self, inst: Instruction) -> Result<Ref, IrError> {
        let function = self.function.ok_or(IrError::Detached("function"))?;
        let block = self.block.ok_or(IrError::Detached("block"))?;
        let handle = self.module.append(inst);
        self.module.functions[function].blocks[block].body.push(handle);
        Ok(handle)
    }

    fn push_result(&mut self, result_type: Ref, kind: InstKind) -> Result<Ref, IrError> {
        let id = self.module.alloc_id();
        self.push(Instruction::with_result(Some(result_type), id, kind))
    }

    pub fn load(&mut self, result_type: Ref, pointer: Ref) -> Result<Ref, IrError> {
        self.push_result(
            result_type,
            InstKind::Load {
                pointer,
                memory_access: Vec::new(),
            },
        )
    }

    pub fn store(&mut self, pointer: Ref, object: Ref) -> Result<Ref, IrError> {
        self.push(Instruction::new(InstKind::Store {
            pointer,
            object,
            memory_access: Vec::new(),
        }))
    }

    pub fn composite_extract(
        &mut self,
        result_type: Ref,
        composite: Ref,
        indices: &[u32],
    ) -> Result<Ref, IrError> {
        self.push_result(
            result_type,
            InstKind::CompositeExtract {
                composite,
                indices: indices.to_vec(),
            },
        )
    }

    pub fn i_add(&mut self, result_type: Ref, a: Ref, b: Ref) -> Result<Ref, IrError> {
        self.push_result(result_type, InstKind::IAdd(a, b))
    }

    pub fn i_mul(&mut self, result_type: Ref, a: Ref, b: Ref) -> Result<Ref, IrError> {
        self.push_result(result_type, InstKind::IMul(a, b))
    }

    pub fn access_chain(
        &mut self,
        result_type: Ref,
        base: Ref,
        indices: &[Ref],
    ) -> Result<Ref, IrError> {
        self.push_result(
            result_type,
            InstKind::AccessChain {
                base,
                indices: indices.to_vec(),
            },
        )
    }

    pub fn function_call(
        &mut self,
        result_type: Ref,
        function: Ref,
        arguments: &[Ref],
    ) -> Result<Ref, IrError> {
        self.push_result(
            result_type,
            InstKind::FunctionCall {
                function,
                arguments: arguments.to_vec(),
            },
        )
    }

    /// Terminates the selected block with `OpReturn` and deselects it.
    pub fn ret(&mut self) -> Result<(), IrError> {
        self.push(Instruction::new(InstKind::Return))?;
        self.block = None;
        Ok(())
    }

    /// Terminates the selected block with `OpReturnValue` and deselects it.
    pub fn ret_value(&mut self, value: Ref) -> Result<(), IrError> {
        self.push(Instruction::new(InstKind::ReturnValue(value)))?;
        self.block = None;
        Ok(())
    }
}
