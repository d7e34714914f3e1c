//! Lowering errors.

use sablec_sem::TypeCheckError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LowerError {
    /// An item was handed to the function lowerer without a function record.
    #[error("item is not a function")]
    NotAFunction,

    /// The function was lowered before its signature was computed.
    #[error("function `{name}` has no computed signature")]
    MissingSignature { name: String },

    /// SSA slot typecheck failure (variable assignment or return).
    #[error("v{value} has type {actual} but {expected} was expected")]
    TypeMismatch {
        value: u32,
        actual: String,
        expected: String,
    },

    /// A constant kind the MIR cannot materialise.
    #[error("unsupported constant: {dump}")]
    UnsupportedConstant { dump: String },

    /// A comparison operator with no MIR comparison mode.
    #[error("unsupported comparison operator in {dump}")]
    UnsupportedCmpOp { dump: String },

    /// A comparison over operands that are neither boolean nor integral.
    #[error("cannot compare operand of type {ty}")]
    BadCompareOperand { ty: String },

    /// A name reached outside a use position.
    #[error("name is not in a use position: {dump}")]
    NameOutsideUse { dump: String },

    /// A call whose target is not a plain name.
    #[error("call target is not a plain name: {dump}")]
    BadCallee { dump: String },

    /// A call to a function the enclosing scopes do not know.
    #[error("unknown function `{name}`")]
    UnknownCallee { name: String },

    /// A finalised block without a terminator.
    #[error("block b{block} does not end in a terminator")]
    UnterminatedBlock { block: u32 },

    /// Finalisation before the return type was recorded.
    #[error("function return type was never recorded")]
    MissingReturnType,

    #[error(transparent)]
    Type(#[from] TypeCheckError),
}
