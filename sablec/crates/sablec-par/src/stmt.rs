//! Statement parsing.

use sablec_lex::Token;

use crate::ast::{FunctionDef, Param, Stmt, StmtId};
use crate::{Expr, ExprContext, Parser};

impl<'a> Parser<'a> {
    pub(crate) fn parse_stmt(&mut self) -> Option<StmtId> {
        match self.peek() {
            Token::Def => self.parse_function(),
            Token::Class => self.parse_class(),
            Token::If | Token::Elif => self.parse_if(),
            Token::While => self.parse_while(),
            _ => self.parse_simple_stmt(),
        }
    }

    /// `def name(params) -> returns: suite`
    fn parse_function(&mut self) -> Option<StmtId> {
        let start = self.bump().1;
        let (name, _) = self.expect_ident()?;

        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        while !self.check(&Token::RParen) {
            let (param_name, param_span) = self.expect_ident()?;
            let annotation = if self.eat(&Token::Colon) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            params.push(Param {
                name: param_name,
                annotation,
                span: param_span,
            });

            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;

        let returns = if self.eat(&Token::Arrow) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect(&Token::Colon)?;
        let body = self.parse_suite()?;
        let span = start.to(self.peek_span());

        Some(self.ast.add_stmt(Stmt::FunctionDef(FunctionDef {
            name,
            params,
            returns,
            body,
            span,
        })))
    }

    /// Classes parse (header plus discarded suite) so validation can reject
    /// them with a diagnostic instead of a syntax error.
    fn parse_class(&mut self) -> Option<StmtId> {
        let start = self.bump().1;
        let (name, _) = self.expect_ident()?;

        if self.eat(&Token::LParen) {
            while !self.check(&Token::RParen) && !self.check(&Token::Eof) {
                self.bump();
            }
            self.expect(&Token::RParen)?;
        }

        self.expect(&Token::Colon)?;
        let _body = self.parse_suite()?;
        let span = start.to(self.peek_span());

        Some(self.ast.add_stmt(Stmt::ClassDef { name, span }))
    }

    /// `if`/`elif` test `:` suite, with `elif` chains nesting into `orelse`.
    fn parse_if(&mut self) -> Option<StmtId> {
        let start = self.bump().1;
        let test = self.parse_expr()?;
        self.expect(&Token::Colon)?;
        let body = self.parse_suite()?;

        let orelse = if self.check(&Token::Elif) {
            vec![self.parse_if()?]
        } else if self.eat(&Token::Else) {
            self.expect(&Token::Colon)?;
            self.parse_suite()?
        } else {
            Vec::new()
        };

        let span = start.to(self.peek_span());
        Some(self.ast.add_stmt(Stmt::If {
            test,
            body,
            orelse,
            span,
        }))
    }

    fn parse_while(&mut self) -> Option<StmtId> {
        let start = self.bump().1;
        let test = self.parse_expr()?;
        self.expect(&Token::Colon)?;
        let body = self.parse_suite()?;
        let span = start.to(self.peek_span());

        Some(self.ast.add_stmt(Stmt::While { test, body, span }))
    }

    /// A suite is either an indented block or simple statements on the same
    /// line (`if b: return 1`).
    fn parse_suite(&mut self) -> Option<Vec<StmtId>> {
        if self.eat(&Token::Newline) {
            self.expect(&Token::Indent)?;

            let mut body = Vec::new();
            loop {
                while self.eat(&Token::Newline) {}
                if self.check(&Token::Dedent) || self.check(&Token::Eof) {
                    break;
                }
                match self.parse_stmt() {
                    Some(stmt) => body.push(stmt),
                    None => self.synchronize(),
                }
            }

            self.expect(&Token::Dedent)?;
            if body.is_empty() {
                self.error_here("expected an indented block");
                return None;
            }
            Some(body)
        } else {
            Some(vec![self.parse_simple_stmt()?])
        }
    }

    /// Return, pass, and the assignment/expression statement forms.
    fn parse_simple_stmt(&mut self) -> Option<StmtId> {
        match self.peek() {
            Token::Return => {
                let start = self.bump().1;
                let value = if self.check(&Token::Newline) || self.check(&Token::Eof) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let span = start.to(self.peek_span());
                self.expect(&Token::Newline)?;
                Some(self.ast.add_stmt(Stmt::Return { value, span }))
            }
            Token::Pass => {
                let span = self.bump().1;
                self.expect(&Token::Newline)?;
                Some(self.ast.add_stmt(Stmt::Pass { span }))
            }
            _ => self.parse_assign_or_expr(),
        }
    }

    fn parse_assign_or_expr(&mut self) -> Option<StmtId> {
        let start = self.peek_span();
        let first = self.parse_expr()?;

        let stmt = match self.peek().clone() {
            Token::Colon => {
                self.bump();

                let target = match self.ast.expr(first) {
                    Expr::Name { id, .. } => *id,
                    _ => {
                        self.error_here("only a plain name can be annotated");
                        return None;
                    }
                };

                let annotation = self.parse_expr()?;
                self.expect(&Token::Eq)?;
                let value = self.parse_expr()?;
                let span = start.to(self.peek_span());

                Stmt::AnnAssign {
                    target,
                    annotation,
                    value,
                    span,
                }
            }
            Token::Eq => {
                self.bump();
                self.mark_store(first);
                let value = self.parse_expr()?;
                let span = start.to(self.peek_span());

                Stmt::Assign {
                    target: first,
                    value,
                    span,
                }
            }
            Token::PlusEq | Token::MinusEq => {
                let op = if matches!(self.peek(), Token::PlusEq) {
                    crate::BinOpKind::Add
                } else {
                    crate::BinOpKind::Sub
                };
                self.bump();
                self.mark_store(first);
                let value = self.parse_expr()?;
                let span = start.to(self.peek_span());

                Stmt::AugAssign {
                    target: first,
                    op,
                    value,
                    span,
                }
            }
            _ => {
                let span = start.to(self.peek_span());
                Stmt::Expr { value: first, span }
            }
        };

        self.expect(&Token::Newline)?;
        Some(self.ast.add_stmt(stmt))
    }

    /// Flip a name expression to store context when it is an assignment
    /// target.
    fn mark_store(&mut self, expr: crate::ExprId) {
        if let Expr::Name { ctx, .. } = &mut self.ast.exprs[expr] {
            *ctx = ExprContext::Store;
        }
    }
}
