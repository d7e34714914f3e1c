//! AST to MIR lowering.
//!
//! `ModuleBuilder` walks the function items of a module; `MirBuilder`
//! lowers one typed function body into a `FluidBlock` and freezes it.
//!
//! Name expressions only lower to `usevar` in operand positions; the
//! `LoweringMode` threaded through the recursion makes that explicit
//! instead of relying on builder-global state.

use indexmap::IndexMap;
use sablec_par::{Ast, BinOpKind, CmpOpKind, Constant, Expr, ExprContext, ExprId, Stmt, StmtId};
use sablec_sem::{
    resolve_annotation, reveal_type, ItemId, Primitive, ScopeId, ScopeTree, TypeId, TypeInfo,
    TypeStore,
};
use sablec_util::Symbol;
use tracing::debug;

use crate::ebb::{Ebb, FluidBlock};
use crate::error::LowerError;
use crate::instr::{CmpMode, SsaValue};

/// How a `Name` expression lowers when reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoweringMode {
    /// Names are inert; reaching one is a lowering error.
    Inert,
    /// Names in load context become `usevar` instructions.
    NamesAsUses,
}

/// Lowers every function item of a module, producing its name -> Ebb table.
pub struct ModuleBuilder<'a> {
    ast: &'a Ast,
    tree: &'a ScopeTree,
    tcx: &'a mut TypeStore,
}

impl<'a> ModuleBuilder<'a> {
    pub fn new(ast: &'a Ast, tree: &'a ScopeTree, tcx: &'a mut TypeStore) -> Self {
        Self { ast, tree, tcx }
    }

    pub fn lower(&mut self, root: ItemId) -> Result<IndexMap<Symbol, Ebb>, LowerError> {
        let mut functions = IndexMap::new();

        for item in self.tree.function_items(root) {
            let (name, ebb) = MirBuilder::compile_function(self.ast, self.tree, self.tcx, item)?;
            functions.insert(name, ebb);
        }

        Ok(functions)
    }
}

/// Lowers one typed function body.
pub struct MirBuilder<'a> {
    ast: &'a Ast,
    tree: &'a ScopeTree,
    tcx: &'a mut TypeStore,
    /// The function's own scope (rib lookups during revelation).
    scope: ScopeId,
    ebb: FluidBlock,
}

impl<'a> MirBuilder<'a> {
    /// Lower the function behind `item` into a finalised [`Ebb`].
    pub fn compile_function(
        ast: &'a Ast,
        tree: &'a ScopeTree,
        tcx: &'a mut TypeStore,
        item: ItemId,
    ) -> Result<(Symbol, Ebb), LowerError> {
        let item_ref = tree.item(item);
        let func = item_ref.function.as_ref().ok_or(LowerError::NotAFunction)?;
        let scope = item_ref.scope.ok_or(LowerError::NotAFunction)?;

        let func_def = match ast.stmt(func.node) {
            Stmt::FunctionDef(def) => def,
            _ => return Err(LowerError::NotAFunction),
        };

        let missing = || LowerError::MissingSignature {
            name: func_def.name.as_str().to_string(),
        };
        let type_id = func.type_id.ok_or_else(missing)?;
        let output = match &tcx[type_id] {
            TypeInfo::Callable { output, .. } => *output,
            _ => return Err(missing()),
        };

        debug!(name = %func_def.name, "lowering function to MIR");

        let mut builder = Self {
            ast,
            tree,
            tcx,
            scope,
            ebb: FluidBlock::new(),
        };

        // Declared parameter type list and return type.
        for param in &func_def.params {
            let ty = match param.annotation {
                Some(annotation) => {
                    resolve_annotation(builder.ast, builder.tree, builder.tcx, annotation, Some(scope))?
                }
                None => TypeId::UNKNOWN,
            };
            builder.ebb.parameters.push(ty);
        }
        builder.ebb.returns = Some(builder.tcx.resolve(output));

        builder.ebb.clean_block();
        for &stmt in &func_def.body {
            builder.lower_stmt(stmt)?;
        }

        // A body that falls off the end returns implicitly, keeping every
        // finalised block terminator-ended.
        if !builder.ebb.is_terminated() {
            builder.ebb.return_(builder.tcx, None)?;
        }

        Ok((func_def.name, builder.ebb.finalize()?))
    }

    fn lower_stmt(&mut self, stmt: StmtId) -> Result<(), LowerError> {
        match self.ast.stmt(stmt) {
            Stmt::AnnAssign { target, value, .. } => {
                self.ebb.ensure_block();

                let ty = self.reveal(*value)?;
                let value_ssa = self.lower_expr(*value, LoweringMode::NamesAsUses)?;
                let ty = self.tcx.resolve(ty);

                self.ebb.assign(self.tcx, *target, value_ssa, ty)?;
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value_ssa = match value {
                    Some(value) => Some(self.lower_expr(*value, LoweringMode::NamesAsUses)?),
                    None => None,
                };
                self.ebb.return_(self.tcx, value_ssa)?;
                Ok(())
            }

            Stmt::Pass { .. } => {
                self.ebb.ensure_block();
                self.ebb.nop();
                Ok(())
            }

            Stmt::Expr { value, .. } => {
                // Calls and operators opt their own operands into uses; a
                // bare name in statement position stays inert.
                self.lower_expr(*value, LoweringMode::Inert)?;
                Ok(())
            }

            Stmt::If {
                test, body, orelse, ..
            } => self.lower_if(*test, body, orelse),

            Stmt::While { test, body, .. } => self.lower_while(*test, body),

            // Nested definitions are separate items, not part of this body.
            Stmt::FunctionDef(_) => Ok(()),

            // Validation rejected these before lowering began.
            Stmt::ClassDef { .. } | Stmt::Assign { .. } | Stmt::AugAssign { .. } => Ok(()),
        }
    }

    fn lower_expr(&mut self, expr: ExprId, mode: LoweringMode) -> Result<SsaValue, LowerError> {
        match self.ast.expr(expr) {
            Expr::Constant { value, .. } => self.lower_constant(expr, value.clone()),

            Expr::Name { id, ctx, .. } => {
                if mode != LoweringMode::NamesAsUses || *ctx != ExprContext::Load {
                    return Err(LowerError::NameOutsideUse {
                        dump: self.ast.dump_expr(expr),
                    });
                }

                let ty = self.reveal(expr)?;
                let ty = self.tcx.resolve(ty);
                Ok(self.ebb.use_var(*id, ty))
            }

            Expr::BinOp {
                left, op, right, ..
            } => {
                let op = *op;
                let lhs = self.lower_expr(*left, LoweringMode::NamesAsUses)?;
                let rhs = self.lower_expr(*right, LoweringMode::NamesAsUses)?;

                // Revelation asserts both operands are I64.
                let ty = self.reveal(expr)?;
                let ty = self.tcx.resolve(ty);

                Ok(match op {
                    BinOpKind::Add => self.ebb.iadd(lhs, rhs, ty),
                    BinOpKind::Sub => self.ebb.isub(lhs, rhs, ty),
                })
            }

            Expr::Compare {
                left,
                ops,
                comparators,
                ..
            } => self.lower_compare(expr, *left, ops.clone(), comparators.clone()),

            Expr::Call { func, args, .. } => self.lower_call(expr, *func, args.clone()),
        }
    }

    fn lower_constant(&mut self, expr: ExprId, value: Constant) -> Result<SsaValue, LowerError> {
        match value {
            Constant::Int(value) => {
                let ty = self.tcx.primitive(Primitive::I64);
                Ok(self.ebb.int_const(value, 64, true, ty))
            }
            Constant::Bool(value) => {
                let ty = self.tcx.primitive(Primitive::Bool);
                Ok(self.ebb.bool_const(value, ty))
            }
            Constant::Str(text) => {
                let ty = self.tcx.primitive(Primitive::Str);
                Ok(self.ebb.str_const(Symbol::intern(&text), ty))
            }
            Constant::Float(_) | Constant::None => Err(LowerError::UnsupportedConstant {
                dump: self.ast.dump_expr(expr),
            }),
        }
    }

    /// Lower a comparison chain.
    ///
    /// Boolean rvalues widen to integers with `bint`; each comparison
    /// result folds back to an integer so successive comparisons chain
    /// through integer operands; a final `bool_const` seals the carried
    /// result as boolean.
    fn lower_compare(
        &mut self,
        expr: ExprId,
        left: ExprId,
        ops: Vec<CmpOpKind>,
        comparators: Vec<ExprId>,
    ) -> Result<SsaValue, LowerError> {
        let mut result = self.lower_expr(left, LoweringMode::NamesAsUses)?;
        let mut result_ty = self.reveal(left)?;

        for (op, rvalue) in ops.into_iter().zip(comparators) {
            let rvalue_ty = self.reveal(rvalue)?;
            let mut rvalue_ssa = self.lower_expr(rvalue, LoweringMode::NamesAsUses)?;

            let mut rvalue_kind = self.primitive_of(rvalue_ty);
            if rvalue_kind == Some(Primitive::Bool) {
                let i64_ty = self.tcx.primitive(Primitive::I64);
                rvalue_ssa = self.ebb.bint(i64_ty, rvalue_ssa);
                rvalue_kind = Some(Primitive::I64);
            }

            match rvalue_kind {
                Some(kind) if kind.is_integral() => {
                    let mode = match op {
                        CmpOpKind::Eq => CmpMode::Eq,
                        CmpOpKind::NotEq => CmpMode::Neq,
                        CmpOpKind::Gt => CmpMode::Gt,
                        CmpOpKind::Lt => {
                            return Err(LowerError::UnsupportedCmpOp {
                                dump: self.ast.dump_expr(expr),
                            })
                        }
                    };

                    let i64_ty = self.tcx.primitive(Primitive::I64);
                    result = self.ebb.icmp(mode, result, rvalue_ssa, i64_ty);
                    result = self.ebb.bint(i64_ty, result);
                    result_ty = i64_ty;
                }
                _ => {
                    return Err(LowerError::BadCompareOperand {
                        ty: self.tcx.reconstruct(rvalue_ty),
                    })
                }
            }
        }

        match self.primitive_of(result_ty) {
            Some(kind) if kind != Primitive::Bool && kind.is_integral() => {
                let bool_ty = self.tcx.primitive(Primitive::Bool);
                result = self.ebb.bool_const_ssa(result, bool_ty);
            }
            _ => {}
        }

        Ok(result)
    }

    /// Lower a direct call: ordered argument operands, each unified against
    /// the callee's parameter block.
    fn lower_call(
        &mut self,
        expr: ExprId,
        func: ExprId,
        args: Vec<ExprId>,
    ) -> Result<SsaValue, LowerError> {
        let name = match self.ast.expr(func) {
            Expr::Name { id, .. } => *id,
            _ => {
                return Err(LowerError::BadCallee {
                    dump: self.ast.dump_expr(expr),
                })
            }
        };

        let callee = self
            .find_function(name)
            .ok_or_else(|| LowerError::UnknownCallee {
                name: name.as_str().to_string(),
            })?;
        let type_id = self
            .tree
            .item(callee)
            .function
            .as_ref()
            .and_then(|f| f.type_id)
            .ok_or_else(|| LowerError::MissingSignature {
                name: name.as_str().to_string(),
            })?;
        let (parameters, output) = match &self.tcx[type_id] {
            TypeInfo::Callable { parameters, output } => (*parameters, *output),
            _ => {
                return Err(LowerError::BadCallee {
                    dump: self.ast.dump_expr(expr),
                })
            }
        };

        let func_ref = self.ebb.declare_func(name);

        let mut arg_ssas = Vec::with_capacity(args.len());
        for arg in args {
            let arg_ty = self.reveal(arg)?;
            let arg_ssa = self.lower_expr(arg, LoweringMode::NamesAsUses)?;

            // The shared Unknown at id 0 must never itself be unified.
            let arg_ty = if arg_ty == TypeId::UNKNOWN {
                self.tcx.fresh_unknown()
            } else {
                arg_ty
            };
            self.tcx.unify(parameters, arg_ty)?;
            arg_ssas.push(arg_ssa);
        }

        let result_ty = self.tcx.resolve(output);
        Ok(self.ebb.call(func_ref, arg_ssas, result_ty))
    }

    /// Lower `if`/`elif`/`else` as a proper CFG: one block per arm plus a
    /// join block; `elif` chains arrive here as nested `If` in `orelse`.
    fn lower_if(
        &mut self,
        test: ExprId,
        body: &[StmtId],
        orelse: &[StmtId],
    ) -> Result<(), LowerError> {
        self.ebb.ensure_block();

        let cond = self.widened_test(test)?;
        let i64_ty = self.tcx.primitive(Primitive::I64);
        let one = self.ebb.int_const(1, 64, true, i64_ty);

        let then_block = self.ebb.create_block();
        let else_block = if orelse.is_empty() {
            None
        } else {
            Some(self.ebb.create_block())
        };
        let join_block = self.ebb.create_block();

        self.ebb.branch_icmp(CmpMode::Eq, cond, one, then_block);
        self.ebb.jump(else_block.unwrap_or(join_block));

        self.ebb.switch_to_block(then_block);
        for &stmt in body {
            self.lower_stmt(stmt)?;
        }
        if !self.ebb.is_terminated() {
            self.ebb.jump(join_block);
        }

        if let Some(else_block) = else_block {
            self.ebb.switch_to_block(else_block);
            for &stmt in orelse {
                self.lower_stmt(stmt)?;
            }
            if !self.ebb.is_terminated() {
                self.ebb.jump(join_block);
            }
        }

        self.ebb.switch_to_block(join_block);
        Ok(())
    }

    /// Lower `while`: a header block re-evaluates the test, branching into
    /// the body (which jumps back) or to the exit block.
    fn lower_while(&mut self, test: ExprId, body: &[StmtId]) -> Result<(), LowerError> {
        self.ebb.ensure_block();

        let header = self.ebb.create_block();
        self.ebb.jump(header);
        self.ebb.switch_to_block(header);

        let cond = self.widened_test(test)?;
        let i64_ty = self.tcx.primitive(Primitive::I64);
        let one = self.ebb.int_const(1, 64, true, i64_ty);

        let body_block = self.ebb.create_block();
        let exit_block = self.ebb.create_block();

        self.ebb.branch_icmp(CmpMode::Eq, cond, one, body_block);
        self.ebb.jump(exit_block);

        self.ebb.switch_to_block(body_block);
        for &stmt in body {
            self.lower_stmt(stmt)?;
        }
        if !self.ebb.is_terminated() {
            self.ebb.jump(header);
        }

        self.ebb.switch_to_block(exit_block);
        Ok(())
    }

    /// Lower a branch test, widening to I64 with `bint` when needed.
    fn widened_test(&mut self, test: ExprId) -> Result<SsaValue, LowerError> {
        let cond = self.lower_expr(test, LoweringMode::NamesAsUses)?;

        let is_i64 = self
            .ebb
            .ssa_type(cond)
            .map_or(false, |ty| self.primitive_of(ty) == Some(Primitive::I64));

        if is_i64 {
            Ok(cond)
        } else {
            let i64_ty = self.tcx.primitive(Primitive::I64);
            Ok(self.ebb.bint(i64_ty, cond))
        }
    }

    /// Find a function by name among this scope's items, then the module's.
    fn find_function(&self, name: Symbol) -> Option<ItemId> {
        let scope = self.tree.scope(self.scope);

        let matches = |item_id: &ItemId| {
            self.tree
                .item(*item_id)
                .function
                .as_ref()
                .map_or(false, |func| func.name == name)
        };

        if let Some(&found) = scope.items.iter().find(|id| matches(id)) {
            return Some(found);
        }

        let module_scope = scope.module.and_then(|module| self.tree.item(module).scope)?;
        self.tree
            .scope(module_scope)
            .items
            .iter()
            .find(|id| matches(id))
            .copied()
    }

    fn reveal(&mut self, expr: ExprId) -> Result<TypeId, LowerError> {
        Ok(reveal_type(self.ast, self.tree, self.tcx, expr, self.scope)?)
    }

    /// The primitive kind behind a (possibly ref-chained) type id.
    fn primitive_of(&self, ty: TypeId) -> Option<Primitive> {
        match self.tcx[self.tcx.resolve(ty)] {
            TypeInfo::Primitive(kind) => Some(kind),
            _ => None,
        }
    }
}


