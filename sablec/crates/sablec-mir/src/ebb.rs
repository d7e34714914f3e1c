//! Extended basic blocks.
//!
//! `FluidBlock` is the mutable builder state for a function body under
//! construction; `finalize` freezes it into an immutable `Ebb`.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use sablec_sem::{TypeId, TypeStore};
use sablec_util::{FxHashMap, IndexVec, Symbol};

use crate::error::LowerError;
use crate::instr::{BlockId, BlockInstr, BoolValue, CmpMode, FuncRef, InstrOp, Ret, SsaValue};

/// A single basic block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BasicBlock {
    pub body: Vec<BlockInstr>,
    /// Block parameter slots and their types.
    pub parameters: BTreeMap<SsaValue, TypeId>,
}

impl BasicBlock {
    pub fn is_terminated(&self) -> bool {
        self.body.last().map_or(false, |instr| instr.op.is_terminator())
    }
}

/// A finalised function body: blocks, typed parameters, a single return
/// type, the variable table, and the call-reference side table. Immutable.
#[derive(Clone, Debug, PartialEq)]
pub struct Ebb {
    pub parameters: Vec<TypeId>,
    pub return_value: TypeId,
    pub variables: IndexMap<Symbol, TypeId>,
    pub blocks: IndexVec<BlockId, BasicBlock>,
    pub funcs: IndexVec<FuncRef, Symbol>,
}

impl Ebb {
    /// The deterministic textual dump: blocks in numeric order, one
    /// indented instruction per line.
    pub fn display<'a>(&'a self, tcx: &'a TypeStore) -> EbbDisplay<'a> {
        EbbDisplay { ebb: self, tcx }
    }
}

/// Borrowed rendering of an [`Ebb`] against its type store.
pub struct EbbDisplay<'a> {
    ebb: &'a Ebb,
    tcx: &'a TypeStore,
}

impl fmt::Display for EbbDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, block) in self.ebb.blocks.iter_enumerated() {
            let params = block
                .parameters
                .iter()
                .map(|(value, ty)| format!("v{}: {}", value.0, self.tcx.reconstruct(*ty)))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "b{}<{}>:", id.0, params)?;

            for instr in &block.body {
                writeln!(f, "    {}", instr.render(self.tcx))?;
            }
        }
        Ok(())
    }
}

/// An ebb being formed: adds a block cursor, dense SSA allocation, and an
/// `SsaValue -> TypeId` side table used for typecheck assertions.
#[derive(Debug, Default)]
pub struct FluidBlock {
    pub parameters: Vec<TypeId>,
    pub returns: Option<TypeId>,
    pub variables: IndexMap<Symbol, TypeId>,
    pub blocks: IndexVec<BlockId, BasicBlock>,
    pub funcs: IndexVec<FuncRef, Symbol>,

    ssa_types: FxHashMap<SsaValue, TypeId>,
    cursor: Option<BlockId>,
    next_ssa: u32,
}

impl FluidBlock {
    pub fn new() -> Self {
        Self::default()
    }

    // Block management

    /// Create a new block without moving the cursor.
    pub fn create_block(&mut self) -> BlockId {
        self.blocks.push(BasicBlock::default())
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.cursor = Some(block);
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.cursor
    }

    /// The block under the cursor, creating and switching to one if none
    /// exists yet.
    pub fn ensure_block(&mut self) -> BlockId {
        match self.cursor {
            Some(block) => block,
            None => self.clean_block(),
        }
    }

    /// Create a fresh block and switch to it.
    pub fn clean_block(&mut self) -> BlockId {
        let block = self.create_block();
        self.switch_to_block(block);
        block
    }

    /// Whether the cursor block already ends in a terminator.
    pub fn is_terminated(&self) -> bool {
        match self.cursor {
            Some(block) => self.blocks[block].is_terminated(),
            None => false,
        }
    }

    /// Recorded type of an SSA slot.
    pub fn ssa_type(&self, value: SsaValue) -> Option<TypeId> {
        self.ssa_types.get(&value).copied()
    }

    // Emission

    fn alloc(&mut self) -> SsaValue {
        let value = SsaValue(self.next_ssa);
        self.next_ssa += 1;
        value
    }

    fn push(&mut self, instr: BlockInstr) {
        let block = self.ensure_block();
        self.blocks[block].body.push(instr);
    }

    /// Emit an SSA-defining instruction, recording the result type.
    fn emit(&mut self, op: InstrOp, ty: TypeId) -> SsaValue {
        let slot = self.alloc();
        self.ssa_types.insert(slot, ty);
        self.push(BlockInstr {
            op,
            ret: Some(Ret::Ssa(slot)),
        });
        slot
    }

    /// Emit a pure statement (no destination).
    fn emit_stmt(&mut self, op: InstrOp) {
        self.push(BlockInstr { op, ret: None });
    }

    /// Produce an integer constant.
    pub fn int_const(&mut self, value: i64, bits: u8, signed: bool, ty: TypeId) -> SsaValue {
        self.emit(
            InstrOp::IntConst {
                value,
                bits,
                signed,
            },
            ty,
        )
    }

    /// Produce a boolean constant.
    pub fn bool_const(&mut self, value: bool, ty: TypeId) -> SsaValue {
        self.emit(
            InstrOp::BoolConst {
                value: BoolValue::Literal(value),
            },
            ty,
        )
    }

    /// Seal an existing SSA slot as a boolean value.
    pub fn bool_const_ssa(&mut self, value: SsaValue, ty: TypeId) -> SsaValue {
        self.emit(
            InstrOp::BoolConst {
                value: BoolValue::Ssa(value),
            },
            ty,
        )
    }

    /// Produce an interned string constant.
    pub fn str_const(&mut self, value: Symbol, ty: TypeId) -> SsaValue {
        self.emit(InstrOp::StrConst { value }, ty)
    }

    /// Cast a boolean value to an integer of the given type.
    pub fn bint(&mut self, ty: TypeId, value: SsaValue) -> SsaValue {
        self.emit(InstrOp::BInt { ty, value }, ty)
    }

    pub fn iadd(&mut self, lhs: SsaValue, rhs: SsaValue, ty: TypeId) -> SsaValue {
        self.emit(InstrOp::IAdd { lhs, rhs }, ty)
    }

    pub fn isub(&mut self, lhs: SsaValue, rhs: SsaValue, ty: TypeId) -> SsaValue {
        self.emit(InstrOp::ISub { lhs, rhs }, ty)
    }

    /// Integer comparison; the result is a 0/1 integer of type `ty`.
    pub fn icmp(&mut self, mode: CmpMode, lhs: SsaValue, rhs: SsaValue, ty: TypeId) -> SsaValue {
        self.emit(InstrOp::IntCmp { mode, lhs, rhs }, ty)
    }

    /// Load a variable into a fresh SSA slot.
    pub fn use_var(&mut self, var: Symbol, ty: TypeId) -> SsaValue {
        self.emit(InstrOp::UseVar { var }, ty)
    }

    /// Store an SSA value into a named variable, binding its type.
    ///
    /// The value's recorded type must match the declared one.
    pub fn assign(
        &mut self,
        tcx: &TypeStore,
        var: Symbol,
        value: SsaValue,
        ty: TypeId,
    ) -> Result<(), LowerError> {
        self.typecheck(tcx, value, ty)?;
        self.variables.insert(var, ty);
        self.push(BlockInstr {
            op: InstrOp::Assign { value },
            ret: Some(Ret::Var(var)),
        });
        Ok(())
    }

    pub fn nop(&mut self) {
        self.emit_stmt(InstrOp::NoOp);
    }

    pub fn jump(&mut self, target: BlockId) {
        self.emit_stmt(InstrOp::Jump { target });
    }

    pub fn branch_icmp(&mut self, mode: CmpMode, lhs: SsaValue, rhs: SsaValue, target: BlockId) {
        self.emit_stmt(InstrOp::BranchIntCmp {
            mode,
            lhs,
            rhs,
            target,
        });
    }

    /// Return from the function; a value must typecheck against the
    /// declared return type.
    pub fn return_(&mut self, tcx: &TypeStore, value: Option<SsaValue>) -> Result<(), LowerError> {
        if let (Some(value), Some(returns)) = (value, self.returns) {
            self.typecheck(tcx, value, returns)?;
        }
        self.emit_stmt(InstrOp::Return { value });
        Ok(())
    }

    /// Register a callee, reusing an existing reference for the same name.
    pub fn declare_func(&mut self, name: Symbol) -> FuncRef {
        let existing = self
            .funcs
            .iter_enumerated()
            .find(|(_, existing)| **existing == name)
            .map(|(func_ref, _)| func_ref);
        match existing {
            Some(func_ref) => func_ref,
            None => self.funcs.push(name),
        }
    }

    /// Emit a direct call carrying ordered SSA argument operands.
    pub fn call(&mut self, func: FuncRef, args: Vec<SsaValue>, result_ty: TypeId) -> SsaValue {
        self.emit(InstrOp::Call { func, args }, result_ty)
    }

    fn typecheck(&self, tcx: &TypeStore, value: SsaValue, expected: TypeId) -> Result<(), LowerError> {
        let actual = self.ssa_types.get(&value).copied();
        let matches = actual.map_or(false, |actual| tcx.resolve(actual) == tcx.resolve(expected));

        if matches {
            Ok(())
        } else {
            Err(LowerError::TypeMismatch {
                value: value.0,
                actual: actual.map_or_else(|| "<unrecorded>".to_string(), |a| tcx.reconstruct(a)),
                expected: tcx.reconstruct(expected),
            })
        }
    }

    /// Freeze into an immutable [`Ebb`].
    ///
    /// Every block must end in a terminator and the return type must have
    /// been recorded.
    pub fn finalize(self) -> Result<Ebb, LowerError> {
        let return_value = self.returns.ok_or(LowerError::MissingReturnType)?;

        for (id, block) in self.blocks.iter_enumerated() {
            if !block.is_terminated() {
                return Err(LowerError::UnterminatedBlock { block: id.0 });
            }
        }

        Ok(Ebb {
            parameters: self.parameters,
            return_value,
            variables: self.variables,
            blocks: self.blocks,
            funcs: self.funcs,
        })
    }
}
