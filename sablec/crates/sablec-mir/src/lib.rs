//! sablec-mir - Mid-level Intermediate Representation
//!
//! The typed, block-structured MIR the front-end hands to a backend:
//! extended basic blocks of three-address SSA instructions (`instr`, `ebb`)
//! and the builder that lowers typed function bodies into them (`builder`).

pub mod builder;
pub mod ebb;
pub mod error;
pub mod instr;

#[cfg(test)]
mod tests;

pub use builder::{MirBuilder, ModuleBuilder};
pub use ebb::{BasicBlock, Ebb, FluidBlock};
pub use error::LowerError;
pub use instr::{BlockId, BlockInstr, BoolValue, CmpMode, FuncRef, InstrOp, Ret, SsaValue};
