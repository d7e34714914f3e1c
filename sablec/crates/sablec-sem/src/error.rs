//! Type checking errors.
//!
//! These fail the compilation as soon as they are detected; only structural
//! validation batches its findings (as diagnostics, not as these errors).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeCheckError {
    /// Structural unification failure; carries both operand descriptors.
    #[error("failed to unify ({left} U {right})")]
    UnificationFailed { left: String, right: String },

    /// An annotation named a builtin the type table does not map.
    #[error("unsupported builtin type `{name}`")]
    UnsupportedBuiltin { name: String },

    /// A string annotation that does not parse as a type expression.
    #[error("malformed annotation `{text}`")]
    MalformedAnnotation { text: String },

    /// Binary arithmetic over non-integer operands.
    #[error("binary operands must both be I64, got ({left}, {right})")]
    BadBinaryOperands { left: String, right: String },

    /// No rule reveals the type of this expression.
    #[error("cannot reveal the type of {dump}")]
    Unrevealable { dump: String },

    /// A second annotated binding of an already-bound name.
    #[error("name `{name}` is already bound in this scope")]
    ShadowedBinding { name: String },

    /// A function was referenced before its signature was computed.
    #[error("function `{name}` has no computed signature")]
    MissingSignature { name: String },
}
