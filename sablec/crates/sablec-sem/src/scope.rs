//! Scopes and the scope walker.
//!
//! Scopes and items live in a `ScopeTree` arena and reference each other by
//! handle; the parent/module back-edges therefore form a tree without
//! ownership cycles, and everything is destroyed atomically with the
//! compilation unit that owns the tree.

use sablec_par::{Ast, Module, Stmt, StmtId};
use sablec_util::{define_idx, FxHashMap, Handler, IndexVec, Symbol};

use crate::item::{Function, Item, ItemId, NodeRef};
use crate::types::{Primitive, TypeInfo};

define_idx!(
    /// Handle to a [`Scope`] in the scope tree.
    ScopeId
);

/// A semantic scope: the items directly inside a region of the program plus
/// the rib stack of lexical bindings.
#[derive(Debug)]
pub struct Scope {
    pub node: NodeRef,
    pub items: Vec<ItemId>,
    pub parent: Option<ScopeId>,
    pub module: Option<ItemId>,
    /// Lexical binding frames, innermost last.
    pub ribs: Vec<FxHashMap<Symbol, TypeInfo>>,
}

/// Arena of scopes and items for one compilation unit.
#[derive(Debug, Default)]
pub struct ScopeTree {
    pub scopes: IndexVec<ScopeId, Scope>,
    pub items: IndexVec<ItemId, Item>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id]
    }

    pub fn item_mut(&mut self, id: ItemId) -> &mut Item {
        &mut self.items[id]
    }

    /// Build the root module item and its scope from a parsed module,
    /// reporting structural rejections through `handler`.
    pub fn build_module(ast: &Ast, module: &Module, handler: &Handler) -> (Self, ItemId) {
        let mut tree = Self::new();

        let root_scope = tree.scopes.push(Scope {
            node: NodeRef::Module,
            items: Vec::new(),
            parent: None,
            module: None,
            ribs: Vec::new(),
        });

        let root_item = tree.items.push(Item {
            kind: Primitive::Module,
            node: NodeRef::Module,
            scope: Some(root_scope),
            function: None,
        });
        tree.scopes[root_scope].module = Some(root_item);

        let mut walker = ScopeWalker {
            ast,
            tree: &mut tree,
            handler,
        };
        walker.walk_into(root_scope, &module.body);

        (tree, root_item)
    }

    /// Function items directly inside the given item's scope, deduplicated
    /// by definition node.
    pub fn function_items(&self, item: ItemId) -> Vec<ItemId> {
        let Some(scope) = self.item(item).scope else {
            return Vec::new();
        };

        let mut seen = Vec::new();
        let mut out = Vec::new();
        for &sub in &self.scope(scope).items {
            if let Some(func) = &self.item(sub).function {
                if !seen.contains(&func.node) {
                    seen.push(func.node);
                    out.push(sub);
                }
            }
        }
        out
    }
}

/// Walks statements, emitting items into a scope and rejecting constructs
/// outside the supported subset.
struct ScopeWalker<'a> {
    ast: &'a Ast,
    tree: &'a mut ScopeTree,
    handler: &'a Handler,
}

impl<'a> ScopeWalker<'a> {
    fn walk_into(&mut self, scope: ScopeId, stmts: &[StmtId]) {
        for &stmt in stmts {
            self.visit_stmt(scope, stmt);
        }
    }

    fn visit_stmt(&mut self, scope: ScopeId, stmt_id: StmtId) {
        match self.ast.stmt(stmt_id) {
            Stmt::FunctionDef(func) => {
                let module = self.tree.scopes[scope].module;
                let inner = self.tree.scopes.push(Scope {
                    node: NodeRef::Stmt(stmt_id),
                    items: Vec::new(),
                    parent: Some(scope),
                    module,
                    ribs: Vec::new(),
                });

                let item = self.tree.items.push(Item {
                    kind: Primitive::Unknown,
                    node: NodeRef::Stmt(stmt_id),
                    scope: Some(inner),
                    function: Some(Function {
                        name: func.name,
                        node: stmt_id,
                        type_id: None,
                    }),
                });
                self.tree.scopes[scope].items.push(item);

                self.walk_into(inner, &func.body);
            }

            Stmt::AnnAssign { .. } => {
                self.add_item(scope, Primitive::LValue, stmt_id);
            }

            Stmt::Return { .. } => {
                self.add_item(scope, Primitive::Return, stmt_id);
            }

            Stmt::ClassDef { span, .. } => {
                self.handler.error("Classes are not supported", *span);
            }

            Stmt::Assign { span, .. } => {
                self.handler
                    .error("Regular assignment is not supported", *span);
            }

            Stmt::AugAssign { span, .. } => {
                self.handler.error("AugAssign is not supported", *span);
            }

            Stmt::If { body, orelse, .. } => {
                self.walk_into(scope, body);
                self.walk_into(scope, orelse);
            }

            Stmt::While { body, .. } => {
                self.walk_into(scope, body);
            }

            Stmt::Pass { .. } | Stmt::Expr { .. } => {}
        }
    }

    fn add_item(&mut self, scope: ScopeId, kind: Primitive, stmt_id: StmtId) {
        let item = self
            .tree
            .items
            .push(Item::new(kind, NodeRef::Stmt(stmt_id)));
        self.tree.scopes[scope].items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sablec_par::parse_source;

    fn build(source: &str) -> (Ast, ScopeTree, ItemId, Handler) {
        let handler = Handler::new();
        let (ast, module) = parse_source(source, &handler);
        assert!(!handler.has_errors(), "{:?}", handler.diagnostics());

        let (tree, root) = ScopeTree::build_module(&ast, &module, &handler);
        (ast, tree, root, handler)
    }

    #[test]
    fn test_module_root_back_pointers() {
        let (_, tree, root, handler) = build("def f() -> int:\n    return 1\n");
        assert!(!handler.has_errors());

        let root_scope = tree.item(root).scope.unwrap();
        assert_eq!(tree.scope(root_scope).module, Some(root));
        assert_eq!(tree.item(root).kind, Primitive::Module);

        let funcs = tree.function_items(root);
        assert_eq!(funcs.len(), 1);

        let inner = tree.item(funcs[0]).scope.unwrap();
        assert_eq!(tree.scope(inner).parent, Some(root_scope));
        assert_eq!(tree.scope(inner).module, Some(root));
    }

    #[test]
    fn test_function_scope_items() {
        let (_, tree, root, _) =
            build("def f(x: int) -> int:\n    y: int = x + 1\n    return y\n");

        let funcs = tree.function_items(root);
        let inner = tree.item(funcs[0]).scope.unwrap();
        let kinds: Vec<_> = tree
            .scope(inner)
            .items
            .iter()
            .map(|&i| tree.item(i).kind)
            .collect();
        assert_eq!(kinds, vec![Primitive::LValue, Primitive::Return]);
    }

    #[test]
    fn test_items_inside_if_belong_to_function_scope() {
        let (_, tree, root, _) =
            build("def f(b: bool) -> int:\n    if b: return 1\n    return 0\n");

        let funcs = tree.function_items(root);
        let inner = tree.item(funcs[0]).scope.unwrap();
        let returns = tree
            .scope(inner)
            .items
            .iter()
            .filter(|&&i| tree.item(i).kind == Primitive::Return)
            .count();
        assert_eq!(returns, 2);
    }

    #[test]
    fn test_class_is_rejected() {
        let handler = Handler::new();
        let (ast, module) = parse_source("class C:\n    pass\n", &handler);
        let _ = ScopeTree::build_module(&ast, &module, &handler);

        assert!(handler.has_errors());
        let messages: Vec<_> = handler
            .diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert!(messages.iter().any(|m| m.contains("Classes are not supported")));
    }

    #[test]
    fn test_bare_assign_is_rejected() {
        let handler = Handler::new();
        let (ast, module) = parse_source("x = 1\n", &handler);
        let _ = ScopeTree::build_module(&ast, &module, &handler);

        let messages: Vec<_> = handler
            .diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert!(messages
            .iter()
            .any(|m| m.contains("Regular assignment is not supported")));
    }

    #[test]
    fn test_aug_assign_is_rejected() {
        let handler = Handler::new();
        let (ast, module) = parse_source("def f(x: int) -> int:\n    x += 1\n    return x\n", &handler);
        let _ = ScopeTree::build_module(&ast, &module, &handler);

        let messages: Vec<_> = handler
            .diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert!(messages.iter().any(|m| m.contains("AugAssign is not supported")));
    }
}
