//! MIR instruction set.
//!
//! A closed opcode enumeration with data-carrying operands. SSA slots are
//! dense per function; variables live in their own name-addressed
//! namespace, distinct from SSA.

use std::fmt;

use sablec_sem::{TypeId, TypeStore};
use sablec_util::{define_idx, Symbol};

define_idx!(
    /// A static-single-assignment value slot, dense from 0 per function.
    SsaValue
);

define_idx!(
    /// A basic block id, dense from 0 per function.
    BlockId
);

define_idx!(
    /// A reference to a callee registered in the function's side table.
    FuncRef
);

/// Comparison modes shared by `IntCmp` and `BranchIntCmp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpMode {
    Eq,
    Neq,
    Gt,
}

impl fmt::Display for CmpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmpMode::Eq => write!(f, "eq"),
            CmpMode::Neq => write!(f, "neq"),
            CmpMode::Gt => write!(f, "gt"),
        }
    }
}

/// Operand of `BoolConst`: either a literal or an existing SSA slot being
/// sealed as boolean.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolValue {
    Literal(bool),
    Ssa(SsaValue),
}

/// The closed opcode set.
#[derive(Clone, Debug, PartialEq)]
pub enum InstrOp {
    /// Materialise an integer literal.
    IntConst { value: i64, bits: u8, signed: bool },
    /// Materialise (or seal) a boolean.
    BoolConst { value: BoolValue },
    /// Materialise an interned string.
    StrConst { value: Symbol },
    IAdd { lhs: SsaValue, rhs: SsaValue },
    ISub { lhs: SsaValue, rhs: SsaValue },
    /// Integer compare; the result is a 0/1 integer.
    IntCmp {
        mode: CmpMode,
        lhs: SsaValue,
        rhs: SsaValue,
    },
    /// Cast a boolean SSA value to an integer of the given type.
    BInt { ty: TypeId, value: SsaValue },
    /// Load a named variable into an SSA slot.
    UseVar { var: Symbol },
    /// Store an SSA value into a named variable (the instruction's ret).
    Assign { value: SsaValue },
    /// Unconditional branch; terminator.
    Jump { target: BlockId },
    /// Branch to `target` when the comparison holds; else fall through.
    BranchIntCmp {
        mode: CmpMode,
        lhs: SsaValue,
        rhs: SsaValue,
        target: BlockId,
    },
    /// Return from the function; terminator.
    Return { value: Option<SsaValue> },
    NoOp,
    /// Direct call with ordered SSA argument operands.
    Call { func: FuncRef, args: Vec<SsaValue> },
}

impl InstrOp {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstrOp::Jump { .. } | InstrOp::BranchIntCmp { .. } | InstrOp::Return { .. }
        )
    }
}

/// The destination slot of an instruction: an SSA definition, a variable
/// definition, or absent for pure statements.
#[derive(Clone, Debug, PartialEq)]
pub enum Ret {
    Ssa(SsaValue),
    Var(Symbol),
}

/// One instruction in a block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockInstr {
    pub op: InstrOp,
    pub ret: Option<Ret>,
}

impl BlockInstr {
    /// The stable textual form, e.g. `v3 = iconst.64 7` or `iadd v1 v2`.
    ///
    /// Needs the type store to render `bint`'s target type.
    pub fn render(&self, tcx: &TypeStore) -> String {
        let ret = match &self.ret {
            Some(Ret::Ssa(value)) => format!("v{} = ", value.0),
            Some(Ret::Var(name)) => format!("{} = ", name),
            None => String::new(),
        };

        let body = match &self.op {
            InstrOp::IntConst { value, bits, .. } => format!("iconst.{} {}", bits, value),
            InstrOp::BoolConst {
                value: BoolValue::Literal(literal),
            } => format!("bool_const {}", literal),
            InstrOp::BoolConst {
                value: BoolValue::Ssa(value),
            } => format!("bool_const v{}", value.0),
            InstrOp::StrConst { value } => format!("str_const {:?}", value.as_str()),
            InstrOp::IAdd { lhs, rhs } => format!("iadd v{} v{}", lhs.0, rhs.0),
            InstrOp::ISub { lhs, rhs } => format!("isub v{} v{}", lhs.0, rhs.0),
            InstrOp::IntCmp { mode, lhs, rhs } => {
                format!("intcmp {} v{} v{}", mode, lhs.0, rhs.0)
            }
            InstrOp::BInt { ty, value } => {
                format!("bint.{} v{}", tcx.reconstruct(*ty), value.0)
            }
            InstrOp::UseVar { var } => format!("usevar {}", var),
            InstrOp::Assign { value } => format!("v{}", value.0),
            InstrOp::Jump { target } => format!("jump b{}", target.0),
            InstrOp::BranchIntCmp {
                mode,
                lhs,
                rhs,
                target,
            } => format!("branchintcmp {} v{} v{} b{}", mode, lhs.0, rhs.0, target.0),
            InstrOp::Return { value: Some(value) } => format!("return v{}", value.0),
            InstrOp::Return { value: None } => "return".to_string(),
            InstrOp::NoOp => "nop".to_string(),
            InstrOp::Call { func, args } => {
                let args = args
                    .iter()
                    .map(|arg| format!(" v{}", arg.0))
                    .collect::<String>();
                format!("call fn{}{}", func.0, args)
            }
        };

        format!("{}{}", ret, body)
    }
}
