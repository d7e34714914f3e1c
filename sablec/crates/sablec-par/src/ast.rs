//! sablec-par - AST Node Definitions
//!
//! Nodes are stored in a per-module arena (`Ast`) and referenced by typed
//! `ExprId`/`StmtId` handles, so later stages (items, scopes, MIR lowering)
//! can hold back-pointers into the tree without borrowing it.

use sablec_util::{define_idx, IndexVec, Span, Symbol};

define_idx!(
    /// Handle to an expression in an [`Ast`] arena.
    ExprId
);

define_idx!(
    /// Handle to a statement in an [`Ast`] arena.
    StmtId
);

/// Arena storage for the nodes of one parse.
#[derive(Debug, Default)]
pub struct Ast {
    pub exprs: IndexVec<ExprId, Expr>,
    pub stmts: IndexVec<StmtId, Stmt>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expr(&mut self, expr: Expr) -> ExprId {
        self.exprs.push(expr)
    }

    pub fn add_stmt(&mut self, stmt: Stmt) -> StmtId {
        self.stmts.push(stmt)
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }

    /// Compact textual rendering of an expression, for error messages.
    pub fn dump_expr(&self, id: ExprId) -> String {
        match self.expr(id) {
            Expr::Name { id, ctx, .. } => format!("Name({}, {:?})", id, ctx),
            Expr::Constant { value, .. } => format!("Constant({:?})", value),
            Expr::BinOp {
                left, op, right, ..
            } => format!(
                "BinOp({}, {:?}, {})",
                self.dump_expr(*left),
                op,
                self.dump_expr(*right)
            ),
            Expr::Compare {
                left,
                ops,
                comparators,
                ..
            } => {
                let rest = comparators
                    .iter()
                    .map(|c| self.dump_expr(*c))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Compare({}, {:?}, [{}])", self.dump_expr(*left), ops, rest)
            }
            Expr::Call { func, args, .. } => {
                let rest = args
                    .iter()
                    .map(|a| self.dump_expr(*a))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Call({}, [{}])", self.dump_expr(*func), rest)
            }
        }
    }
}

/// A parsed source module.
#[derive(Debug)]
pub struct Module {
    pub body: Vec<StmtId>,
    pub span: Span,
}

/// A statement node.
#[derive(Debug)]
pub enum Stmt {
    FunctionDef(FunctionDef),
    /// Parsed so validation can reject it with a proper diagnostic.
    ClassDef {
        name: Symbol,
        span: Span,
    },
    /// `target: annotation = value`
    AnnAssign {
        target: Symbol,
        annotation: ExprId,
        value: ExprId,
        span: Span,
    },
    /// Bare `target = value`; rejected during validation.
    Assign {
        target: ExprId,
        value: ExprId,
        span: Span,
    },
    /// `target += value` / `target -= value`; rejected during validation.
    AugAssign {
        target: ExprId,
        op: BinOpKind,
        value: ExprId,
        span: Span,
    },
    Return {
        value: Option<ExprId>,
        span: Span,
    },
    If {
        test: ExprId,
        body: Vec<StmtId>,
        orelse: Vec<StmtId>,
        span: Span,
    },
    While {
        test: ExprId,
        body: Vec<StmtId>,
        span: Span,
    },
    Pass {
        span: Span,
    },
    /// An expression evaluated for effect (e.g. a bare call).
    Expr {
        value: ExprId,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::FunctionDef(func) => func.span,
            Stmt::ClassDef { span, .. }
            | Stmt::AnnAssign { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::AugAssign { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Pass { span }
            | Stmt::Expr { span, .. } => *span,
        }
    }
}

/// A function definition.
#[derive(Debug)]
pub struct FunctionDef {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub returns: Option<ExprId>,
    pub body: Vec<StmtId>,
    pub span: Span,
}

/// A function parameter with its optional annotation.
#[derive(Debug)]
pub struct Param {
    pub name: Symbol,
    pub annotation: Option<ExprId>,
    pub span: Span,
}

/// An expression node.
#[derive(Debug)]
pub enum Expr {
    Name {
        id: Symbol,
        ctx: ExprContext,
        span: Span,
    },
    Constant {
        value: Constant,
        span: Span,
    },
    BinOp {
        left: ExprId,
        op: BinOpKind,
        right: ExprId,
        span: Span,
    },
    /// Chained comparison: `left ops[0] comparators[0] ops[1] ...`
    Compare {
        left: ExprId,
        ops: Vec<CmpOpKind>,
        comparators: Vec<ExprId>,
        span: Span,
    },
    Call {
        func: ExprId,
        args: Vec<ExprId>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Name { span, .. }
            | Expr::Constant { span, .. }
            | Expr::BinOp { span, .. }
            | Expr::Compare { span, .. }
            | Expr::Call { span, .. } => *span,
        }
    }
}

/// Whether a name is being read or written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExprContext {
    Load,
    Store,
}

/// Binary arithmetic operators of the supported subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
}

/// Comparison operators.
///
/// `Lt` parses but has no MIR comparison mode; lowering rejects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOpKind {
    Eq,
    NotEq,
    Gt,
    Lt,
}

/// A literal constant.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    None,
}
