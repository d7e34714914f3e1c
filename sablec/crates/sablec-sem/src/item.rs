//! Items: semantically-significant nodes with kind tags and scope linkage.

use sablec_par::StmtId;
use sablec_util::{define_idx, Symbol};

use crate::scope::ScopeId;
use crate::types::{Primitive, TypeId};

define_idx!(
    /// Handle to an [`Item`] in the scope tree.
    ItemId
);

/// Back-pointer from an item or scope to the syntax it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRef {
    /// The module root.
    Module,
    Stmt(StmtId),
}

/// A syntactically-significant node, tagged with its kind.
///
/// The kind vocabulary is shared with the primitive type universe: module
/// roots are `Module`, annotated locals `LValue`, return sites `Return`.
/// Function definitions carry no kind of their own (`Unknown`); they own a
/// [`Function`] record and an inner scope instead.
#[derive(Debug)]
pub struct Item {
    pub kind: Primitive,
    pub node: NodeRef,
    pub scope: Option<ScopeId>,
    pub function: Option<Function>,
}

impl Item {
    pub fn new(kind: Primitive, node: NodeRef) -> Self {
        Self {
            kind,
            node,
            scope: None,
            function: None,
        }
    }
}

/// A function known to the semantic model.
///
/// `type_id` names a `Callable` in the type store once the checker has
/// computed the signature.
#[derive(Debug)]
pub struct Function {
    pub name: Symbol,
    pub node: StmtId,
    pub type_id: Option<TypeId>,
}
