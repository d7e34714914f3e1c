//! Type checking: signature computation, rib population, annotation
//! resolution, and expression type revelation.

use sablec_par::{Ast, Constant, Expr, ExprContext, ExprId, Stmt, StmtId};
use sablec_util::{FxHashMap, Symbol};
use tracing::debug;

use crate::error::TypeCheckError;
use crate::infer::TypeStore;
use crate::item::{ItemId, NodeRef};
use crate::scope::{ScopeId, ScopeTree};
use crate::types::{Primitive, TypeId, TypeInfo};

/// Reserved extension point: annotations naming user-defined types from an
/// enclosing scope. Nothing resolves here yet.
fn check_parent_scope(_tree: &ScopeTree, _scope: Option<ScopeId>) -> Option<TypeId> {
    None
}

/// Resolve an annotation expression to a `TypeId`.
///
/// Quoted-string annotations are re-parsed as expressions first (lazy
/// annotations). Literal constants map through their host kind; bare names
/// go through the seeded builtin table; anything else falls through to
/// `Unknown`.
pub fn resolve_annotation(
    ast: &Ast,
    tree: &ScopeTree,
    tcx: &mut TypeStore,
    expr: ExprId,
    scope: Option<ScopeId>,
) -> Result<TypeId, TypeCheckError> {
    if let Some(found) = check_parent_scope(tree, scope) {
        return Ok(found);
    }

    match ast.expr(expr) {
        Expr::Constant {
            value: Constant::Str(text),
            ..
        } => match sablec_par::parse_type_expr(text) {
            Some((sub_ast, sub_expr)) => resolve_annotation(&sub_ast, tree, tcx, sub_expr, scope),
            None => Err(TypeCheckError::MalformedAnnotation { text: text.clone() }),
        },

        Expr::Constant { value, .. } => {
            let kind = match value {
                Constant::Int(_) => Primitive::I64,
                Constant::Float(_) => Primitive::Number,
                Constant::Bool(_) => Primitive::Bool,
                Constant::None => Primitive::NoneType,
                _ => Primitive::Unknown,
            };
            Ok(tcx.primitive(kind))
        }

        Expr::Name { id, .. } => match tcx.builtin(id.as_str()) {
            Some(ty) => Ok(ty),
            None => Err(TypeCheckError::UnsupportedBuiltin {
                name: id.as_str().to_string(),
            }),
        },

        _ => Ok(tcx.primitive(Primitive::Unknown)),
    }
}

/// Reveal the type of an expression in a scope.
///
/// A pure query over the store and the ribs, modulo `get_id_or_insert`
/// interning; the same `(expr, scope)` pair always reveals the same id.
pub fn reveal_type(
    ast: &Ast,
    tree: &ScopeTree,
    tcx: &mut TypeStore,
    expr: ExprId,
    scope: ScopeId,
) -> Result<TypeId, TypeCheckError> {
    match ast.expr(expr) {
        Expr::BinOp { left, right, .. } => {
            let lhs = reveal_type(ast, tree, tcx, *left, scope)?;
            let rhs = reveal_type(ast, tree, tcx, *right, scope)?;

            let lhs_is_i64 = tcx[tcx.resolve(lhs)] == TypeInfo::Primitive(Primitive::I64);
            let rhs_is_i64 = tcx[tcx.resolve(rhs)] == TypeInfo::Primitive(Primitive::I64);

            if lhs_is_i64 && rhs_is_i64 {
                Ok(tcx.primitive(Primitive::I64))
            } else {
                Err(TypeCheckError::BadBinaryOperands {
                    left: tcx.reconstruct(lhs),
                    right: tcx.reconstruct(rhs),
                })
            }
        }

        // All comparisons produce a boolean, whatever the operands are.
        Expr::Compare { .. } => Ok(tcx.primitive(Primitive::Bool)),

        Expr::Call { func, .. } => reveal_type(ast, tree, tcx, *func, scope),

        Expr::Constant { .. } => resolve_annotation(ast, tree, tcx, expr, None),

        Expr::Name { id, ctx, .. } => {
            if *ctx != ExprContext::Load {
                return Err(TypeCheckError::Unrevealable {
                    dump: ast.dump_expr(expr),
                });
            }
            reveal_name(ast, tree, tcx, expr, *id, scope)
        }
    }
}

fn reveal_name(
    ast: &Ast,
    tree: &ScopeTree,
    tcx: &mut TypeStore,
    expr: ExprId,
    name: Symbol,
    scope: ScopeId,
) -> Result<TypeId, TypeCheckError> {
    let scope_ref = tree.scope(scope);

    // Innermost rib wins.
    for rib in scope_ref.ribs.iter().rev() {
        if let Some(bound) = rib.get(&name) {
            return Ok(tcx.get_id_or_insert(bound.clone()));
        }
    }

    // A function named like the target among this scope's items.
    for &item_id in &scope_ref.items {
        if let Some(func) = &tree.item(item_id).function {
            if func.name == name {
                return func.type_id.ok_or_else(|| TypeCheckError::MissingSignature {
                    name: name.as_str().to_string(),
                });
            }
        }
    }

    // Not in the local scope; retry once at module level.
    let module_scope = scope_ref
        .module
        .and_then(|module| tree.item(module).scope)
        .filter(|&module_scope| module_scope != scope);

    match module_scope {
        Some(module_scope) => reveal_name(ast, tree, tcx, expr, name, module_scope),
        None => Err(TypeCheckError::Unrevealable {
            dump: ast.dump_expr(expr),
        }),
    }
}

/// Walks the items of a module scope, computing function signatures and
/// unifying inferred types against declared ones.
pub struct TypeChecker<'a> {
    ast: &'a Ast,
    tree: &'a mut ScopeTree,
    tcx: &'a mut TypeStore,
}

impl<'a> TypeChecker<'a> {
    pub fn new(ast: &'a Ast, tree: &'a mut ScopeTree, tcx: &'a mut TypeStore) -> Self {
        Self { ast, tree, tcx }
    }

    /// Typecheck every function item of the module. Signatures for the
    /// whole scope are computed before any body so calls may reference
    /// later definitions.
    pub fn check_module(&mut self, root: ItemId) -> Result<(), TypeCheckError> {
        let funcs = self.tree.function_items(root);

        for &func in &funcs {
            self.check_signature(func)?;
        }
        for &func in &funcs {
            self.check_body(func)?;
        }

        Ok(())
    }

    /// Compute `Callable(parameters, output)` for a function item and seed
    /// its scope's ribs with the parameter bindings.
    fn check_signature(&mut self, item_id: ItemId) -> Result<(), TypeCheckError> {
        let (func_node, func_scope) = {
            let item = self.tree.item(item_id);
            match (&item.function, item.scope) {
                (Some(func), Some(scope)) => (func.node, scope),
                _ => return Ok(()),
            }
        };

        let func_def = match self.ast.stmt(func_node) {
            Stmt::FunctionDef(def) => def,
            _ => return Ok(()),
        };

        debug!(name = %func_def.name, "computing function signature");

        // The parameter block is one fresh inference slot every declared
        // parameter type unifies into.
        let params_slot = self.tcx.fresh_unknown();
        let mut param_rib: FxHashMap<Symbol, TypeInfo> = FxHashMap::default();

        for param in &func_def.params {
            let declared = match param.annotation {
                Some(annotation) => {
                    let id =
                        resolve_annotation(self.ast, self.tree, self.tcx, annotation, Some(func_scope))?;
                    self.guard_shared_unknown(id)
                }
                None => self.tcx.fresh_unknown(),
            };

            self.tcx.unify(params_slot, declared)?;
            param_rib.insert(param.name, self.tcx[declared].clone());
        }

        let output = match func_def.returns {
            Some(annotation) => {
                let id =
                    resolve_annotation(self.ast, self.tree, self.tcx, annotation, Some(func_scope))?;
                self.guard_shared_unknown(id)
            }
            None => self.tcx.primitive(Primitive::Nothing),
        };

        let type_id = self.tcx.get_id_or_insert(TypeInfo::Callable {
            parameters: params_slot,
            output,
        });

        let scope = self.tree.scope_mut(func_scope);
        scope.ribs = vec![param_rib, FxHashMap::default()];

        if let Some(func) = self.tree.item_mut(item_id).function.as_mut() {
            func.type_id = Some(type_id);
        }

        Ok(())
    }

    /// Check the annotated locals and return sites of one function body.
    fn check_body(&mut self, item_id: ItemId) -> Result<(), TypeCheckError> {
        let (func_scope, type_id, name) = {
            let item = self.tree.item(item_id);
            match (&item.function, item.scope) {
                (Some(func), Some(scope)) => (scope, func.type_id, func.name),
                _ => return Ok(()),
            }
        };

        let type_id = type_id.ok_or_else(|| TypeCheckError::MissingSignature {
            name: name.as_str().to_string(),
        })?;
        let output = match &self.tcx[type_id] {
            TypeInfo::Callable { output, .. } => *output,
            _ => return Ok(()),
        };

        let items: Vec<(ItemId, Primitive, NodeRef, bool)> = self
            .tree
            .scope(func_scope)
            .items
            .iter()
            .map(|&sub| {
                let item = self.tree.item(sub);
                (sub, item.kind, item.node, item.function.is_some())
            })
            .collect();

        // Nested definitions get signatures before any body in this scope
        // is checked.
        for &(sub, _, _, is_func) in &items {
            if is_func {
                self.check_signature(sub)?;
            }
        }

        for &(sub, kind, node, is_func) in &items {
            match kind {
                Primitive::LValue => {
                    if let NodeRef::Stmt(stmt) = node {
                        self.check_ann_assign(stmt, func_scope)?;
                    }
                }
                Primitive::Return => {
                    if let NodeRef::Stmt(stmt) = node {
                        self.check_return(stmt, func_scope, output)?;
                    }
                }
                _ if is_func => self.check_body(sub)?,
                _ => {}
            }
        }

        Ok(())
    }

    fn check_ann_assign(&mut self, stmt: StmtId, scope: ScopeId) -> Result<(), TypeCheckError> {
        let Stmt::AnnAssign {
            target,
            annotation,
            value,
            ..
        } = self.ast.stmt(stmt)
        else {
            return Ok(());
        };

        let declared = resolve_annotation(self.ast, self.tree, self.tcx, *annotation, Some(scope))?;
        let declared = self.guard_shared_unknown(declared);

        // Shadowing is rejected rather than mangled: a rebind would make
        // later reveals of the same name ambiguous.
        let already_bound = self
            .tree
            .scope(scope)
            .ribs
            .iter()
            .any(|rib| rib.contains_key(target));
        if already_bound {
            return Err(TypeCheckError::ShadowedBinding {
                name: target.as_str().to_string(),
            });
        }

        debug!(name = %target, ty = %self.tcx.reconstruct(declared), "binding annotated local");

        // Reveal before binding so `x: int = x + 1` cannot see itself.
        let revealed = reveal_type(self.ast, self.tree, self.tcx, *value, scope)?;

        let bound = self.tcx[declared].clone();
        if let Some(rib) = self.tree.scope_mut(scope).ribs.last_mut() {
            rib.insert(*target, bound);
        }

        self.tcx.unify(declared, revealed)
    }

    fn check_return(
        &mut self,
        stmt: StmtId,
        scope: ScopeId,
        output: TypeId,
    ) -> Result<(), TypeCheckError> {
        let Stmt::Return { value, .. } = self.ast.stmt(stmt) else {
            return Ok(());
        };

        let revealed = match value {
            Some(value) => reveal_type(self.ast, self.tree, self.tcx, *value, scope)?,
            None => self.tcx.primitive(Primitive::Nothing),
        };

        self.tcx.unify(output, revealed)
    }

    /// The shared `Unknown` at id 0 must never itself be unified; hand out
    /// a fresh slot instead.
    fn guard_shared_unknown(&mut self, id: TypeId) -> TypeId {
        if id == TypeId::UNKNOWN {
            self.tcx.fresh_unknown()
        } else {
            id
        }
    }
}
