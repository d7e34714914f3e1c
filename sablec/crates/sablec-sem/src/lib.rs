//! sablec-sem - Semantic Analysis
//!
//! The semantic model between surface syntax and MIR: items and scopes
//! (`item`, `scope`), the content-addressed type store with unification
//! (`types`, `infer`), and the type checker with annotation resolution and
//! expression type revelation (`check`).

pub mod check;
pub mod error;
pub mod infer;
pub mod item;
pub mod scope;
pub mod types;

pub use check::{resolve_annotation, reveal_type, TypeChecker};
pub use error::TypeCheckError;
pub use infer::TypeStore;
pub use item::{Function, Item, ItemId, NodeRef};
pub use scope::{Scope, ScopeId, ScopeTree};
pub use types::{Operation, Primitive, TypeId, TypeInfo};
